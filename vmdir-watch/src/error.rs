//! Error types for watch sessions.

use thiserror::Error;
use vmdir_types::SessionId;

/// Result type for watch operations.
pub type WatchResult<T> = Result<T, WatchError>;

/// Event repository outcomes other than an event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// No ready event at or after the requested revision. Expected, not a
    /// failure.
    #[error("end of event list")]
    EndOfList,

    #[error("event repository failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The client connection refused or failed an event.
    #[error("delivery to session {session} failed: {reason}")]
    Delivery { session: SessionId, reason: String },
}
