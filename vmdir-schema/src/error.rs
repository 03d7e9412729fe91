//! Error types for the schema engine.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur in schema operations.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required argument was missing or empty.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A definition failed to parse or failed verification.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A new definition may not legally replace the running one.
    #[error("schema not compatible: {entity}: {reason}")]
    NotCompatible { entity: String, reason: String },

    /// A named schema element does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error (schema files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote directory failed to answer a schema search.
    #[error("remote directory error: {0}")]
    Remote(String),
}

impl SchemaError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    pub(crate) fn incompatible(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotCompatible {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}
