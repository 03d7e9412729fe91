//! Error types for the server core.

use thiserror::Error;
use vmdir_replication::UtdVectorError;
use vmdir_schema::SchemaError;
use vmdir_watch::WatchError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    UtdVector(#[from] UtdVectorError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
