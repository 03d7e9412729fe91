//! Core type definitions for the directory server.
//!
//! This crate defines the small, shared vocabulary used by the schema engine,
//! the replication bookkeeping and the watch subsystem:
//! - Replica invocation identifiers and update sequence numbers
//! - Watch session identifiers
//! - Change events published to watch sessions

mod event;
mod ids;

pub use event::{ChangeEvent, ChangeKind};
pub use ids::{InvocationId, Revision, SessionId, Usn};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}
