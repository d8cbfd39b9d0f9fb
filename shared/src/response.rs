//! API response envelope
//!
//! Every public operation returns `{ok, data?, error?}`. The error body
//! carries the taxonomy `kind` (validation, not_found, insufficient_stock,
//! invariant_violation, external_service, conflict, internal), the numeric
//! code, and optional structured details.

use crate::error::{AppError, ErrorCategory, ErrorCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Error body of a failed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Taxonomy kind for caller-side handling
    pub kind: String,
    /// Numeric error code
    pub code: ErrorCode,
    /// Error category derived from the code range
    pub category: ErrorCategory,
    /// Human-readable message
    pub message: String,
    /// Optional structured details (e.g. `available` for stock errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

/// Unified API response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response from an [`AppError`]
    pub fn error(err: AppError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ApiErrorBody {
                kind: err.code.kind().to_string(),
                category: ErrorCategory::from_code(err.code),
                code: err.code,
                message: err.message,
                details: err.details,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_omits_error() {
        let resp = ApiResponse::ok(42);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["data"], 42);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_envelope_carries_kind() {
        let resp: ApiResponse<()> = ApiResponse::error(AppError::insufficient_stock("l1", 2));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["kind"], "insufficient_stock");
        assert_eq!(json["error"]["details"]["available"], 2);
    }
}
