//! HTTP integration for [`AppError`]
//!
//! Converts application errors into the `{ok, error: {kind, ...}}` response
//! envelope with the appropriate status code.

use super::types::AppError;
use crate::response::ApiResponse;
use axum::Json;
use axum::response::{IntoResponse, Response};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(code = %self.code, error = %self.message, "Request failed");
        }
        let body: ApiResponse<()> = ApiResponse::error(self);
        (status, Json(body)).into_response()
    }
}
