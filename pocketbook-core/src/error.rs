//! Core error types for `Pocketbook`.

use thiserror::Error;

/// Core error type for `Pocketbook` domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid data from an API payload.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unknown transaction kind.
    #[error("Unknown transaction kind: {0}")]
    UnknownKind(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
