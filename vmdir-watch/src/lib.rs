//! Watch sessions for directory change notification.
//!
//! A client that asks to be told about changes gets a [`WatchSession`]: a
//! cursor into the change-event repository plus the connection the events
//! go back over. The [`WatchSessionManager`] holds sessions in two FIFO
//! queues. Sessions with events waiting sit in the active queue, where a
//! dispatcher thread picks them up with
//! [`get_next_session`](WatchSessionManager::get_next_session); caught-up
//! sessions park in the inactive queue until new events arrive.
//!
//! Deletion is lazy. [`delete_session`](WatchSessionManager::delete_session)
//! only records the id, and the session is dropped the next time the
//! dispatcher dequeues it.

mod error;
mod manager;
mod queue;
mod repository;
mod session;

pub use error::{RepositoryError, WatchError, WatchResult};
pub use manager::{DEFAULT_POLL_TIMEOUT, WatchSessionManager};
pub use queue::BlockingQueue;
pub use repository::{EventRepository, MemoryEventRepository};
pub use session::{WatchClient, WatchRequest, WatchSession};
