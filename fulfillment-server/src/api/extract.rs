//! Request extractors
//!
//! `ActorContext` extracts via its `FromRequestParts` impl in `shared`;
//! this module adds the server-local extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shared::AppError;

/// Optional client idempotency key (`x-command-id` header)
///
/// When present, replays of the same command return the duplicate response
/// instead of re-applying effects.
pub struct CommandId(pub Option<String>);

impl<S> FromRequestParts<S> for CommandId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-command-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(CommandId(id))
    }
}
