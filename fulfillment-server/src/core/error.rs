//! Server-level error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Storage initialization failed: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<shared::AppError> for ServerError {
    fn from(err: shared::AppError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

/// Result alias for server startup and lifecycle code
pub type Result<T> = std::result::Result<T, ServerError>;
