//! Error types and API response structures

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type for the Hermit engine, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging and user messaging
///   (e.g. `available` on insufficient-stock errors)
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self.code.kind() {
            "validation" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "insufficient_stock" | "conflict" => StatusCode::CONFLICT,
            "external_service" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    ///
    /// Also used when an entity exists but is not owned by the caller, so
    /// that existence is never leaked through authorization failures.
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an insufficient stock error carrying the available quantity
    pub fn insufficient_stock(listing_id: impl Into<String>, available: i64) -> Self {
        Self::with_message(
            ErrorCode::InsufficientStock,
            format!("only {} available", available),
        )
        .with_detail("listing_id", listing_id.into())
        .with_detail("available", available)
    }

    /// Create an invariant violation error (fatal, alerts, never auto-fixed)
    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        let e = Self::with_message(ErrorCode::InvariantViolation, msg);
        tracing::error!(target: "invariant", error = %e.message, "Invariant violation detected");
        e
    }

    /// Create an external service error with the provider's message
    pub fn external_service(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ExternalService, msg)
            .with_detail("provider", provider.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::Internal, msg)
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::Storage, msg)
    }

    /// Create an invalid transition error
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidTransition, msg)
    }
}

/// Application-level Result type
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_carries_available() {
        let err = AppError::insufficient_stock("listing-1", 3);
        let details = err.details.as_ref().unwrap();
        assert_eq!(details.get("available").unwrap(), &Value::from(3));
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::not_found("Cart cart-1");
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invariant_violation_maps_to_500() {
        let err = AppError::invariant_violation("reserved exceeds available");
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
