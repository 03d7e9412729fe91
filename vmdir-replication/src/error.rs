//! Error types for UTD vector operations.

use thiserror::Error;

/// Result type for UTD vector operations.
pub type UtdResult<T> = Result<T, UtdVectorError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UtdVectorError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The wire string could not be parsed.
    #[error("invalid UTD vector format: {0}")]
    InvalidFormat(String),

    /// No USN is recorded for the invocation id.
    #[error("invocation id not found: {0}")]
    NotFound(String),
}
