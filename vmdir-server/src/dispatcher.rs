//! The watch dispatcher: a dedicated thread that feeds change events to
//! watch sessions.

use crate::state::DirectoryServerState;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use vmdir_watch::{RepositoryError, WatchSession, WatchSessionManager};

/// What happened to a session after one dispatch turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The batch filled up; the session went back to the active queue.
    Requeued { delivered: usize },
    /// No more events; the session parked in the inactive queue.
    CaughtUp { delivered: usize },
    /// The client failed to take an event; the session was dropped.
    Closed { delivered: usize },
}

/// Delivers up to `batch_size` events to `session` and puts it back where
/// it belongs. Events outside the watched subtree advance the cursor
/// without counting against the batch. A batch size of zero is treated
/// as one.
pub fn dispatch_session(
    manager: &WatchSessionManager,
    mut session: WatchSession,
    batch_size: usize,
) -> DispatchOutcome {
    let batch_size = batch_size.max(1);
    let repository = Arc::clone(manager.repository());
    let mut delivered = 0;

    loop {
        if delivered >= batch_size {
            manager.add_active_session(session);
            return DispatchOutcome::Requeued { delivered };
        }

        let from = session.next_revision();
        match repository.next_ready_event(from) {
            Ok(event) => {
                if session.wants(&event) {
                    if let Err(e) = session.deliver(&event) {
                        warn!(session = %session.id(), error = %e, "watch delivery failed, closing session");
                        manager.forget(session.id());
                        return DispatchOutcome::Closed { delivered };
                    }
                    delivered += 1;
                }
                session.advance_past(event.revision);
            }
            Err(e) => {
                if !matches!(e, RepositoryError::EndOfList) {
                    error!(session = %session.id(), error = %e, "reading change events failed");
                }
                manager.add_inactive_session(session);
                // An event published between the read above and the park
                // would otherwise wait for the next publish.
                if repository.next_ready_event(from).is_ok() {
                    manager.activate_sessions();
                }
                return DispatchOutcome::CaughtUp { delivered };
            }
        }
    }
}

/// Runs [`dispatch_session`] on a background thread until stopped.
pub struct WatchDispatcher {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WatchDispatcher {
    pub fn spawn(state: Arc<DirectoryServerState>, batch_size: usize) -> std::io::Result<Self> {
        let batch_size = batch_size.max(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("vmdir-watch-dispatch".into())
            .spawn(move || run(&state, batch_size, &flag))?;
        info!(batch_size, "watch dispatcher started");
        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Signals the thread and waits for it. The thread notices within one
    /// poll timeout.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("watch dispatcher thread panicked");
            } else {
                info!("watch dispatcher stopped");
            }
        }
    }
}

impl Drop for WatchDispatcher {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn run(state: &DirectoryServerState, batch_size: usize, shutdown: &AtomicBool) {
    let manager = state.watch_sessions();
    while !shutdown.load(Ordering::Acquire) {
        let Some(session) = manager.get_next_session() else {
            continue;
        };
        let id = session.id();
        let outcome = dispatch_session(manager, session, batch_size);
        debug!(session = %id, ?outcome, "watch session dispatched");
    }
}
