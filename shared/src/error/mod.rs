//! Unified error handling
//!
//! # Structure
//!
//! - [`ErrorCode`] - numeric error codes grouped by category
//! - [`ErrorCategory`] - category derived from the code range
//! - [`AppError`] - the application error type (code + message + details)
//! - `http` - axum `IntoResponse` integration

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{AppError, AppResult};
