//! Directory server core.
//!
//! Ties the schema engine, the UTD vector cache and the watch session
//! manager into one explicitly constructed [`DirectoryServerState`], shared
//! by `Arc` with every worker:
//! - schema upgrades go through [`DirectoryServerState::upgrade_schema`],
//!   which publishes a new immutable snapshot only if the upgrade is
//!   compatible and the merged schema verifies
//! - replication appliers record progress in the UTD vector cache
//! - a [`WatchDispatcher`] thread feeds change events to watch sessions

mod config;
mod context;
mod dispatcher;
mod error;
mod state;

pub use config::ServerConfig;
pub use context::RequestContext;
pub use dispatcher::{DispatchOutcome, WatchDispatcher, dispatch_session};
pub use error::{ServerError, ServerResult};
pub use state::{DirectoryServerState, SchemaHandle, ServerStatus};
