//! Replication bookkeeping for the directory server.
//!
//! Each replica remembers, per partner invocation id, the highest update
//! sequence number (USN) it has applied from that partner. This is the
//! up-to-date (UTD) vector. Partners exchange it as a compact string to work
//! out what each side is missing:
//!
//! ```text
//! 1f0c...-inv-a:1042,7be2...-inv-b:977,
//! ```
//!
//! - [`UtdVector`]: the vector as a plain value (parse, format, merge)
//! - [`UtdVectorCache`]: the process-wide, thread-safe cache replication
//!   appliers update and status readers consult

mod cache;
mod error;
mod utd_vector;

pub use cache::UtdVectorCache;
pub use error::{UtdResult, UtdVectorError};
pub use utd_vector::UtdVector;
