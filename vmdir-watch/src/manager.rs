//! The watch session manager.

use crate::error::{RepositoryError, WatchError, WatchResult};
use crate::queue::BlockingQueue;
use crate::repository::EventRepository;
use crate::session::{WatchClient, WatchRequest, WatchSession};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vmdir_types::SessionId;

/// How long [`WatchSessionManager::get_next_session`] waits for an active
/// session by default.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct ManagerState {
    next_id: SessionId,
    deleted: HashSet<SessionId>,
}

/// Owns every live watch session.
///
/// Sessions move between the active and inactive queues; ids marked deleted
/// are reaped when their session next leaves the active queue.
pub struct WatchSessionManager {
    repository: Arc<dyn EventRepository>,
    active: BlockingQueue<WatchSession>,
    inactive: BlockingQueue<WatchSession>,
    state: Mutex<ManagerState>,
    poll_timeout: Duration,
}

impl WatchSessionManager {
    /// Creates a manager reading events from `repository`. The manager
    /// shares the repository; it does not own it.
    #[must_use]
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self {
            repository,
            active: BlockingQueue::new(),
            inactive: BlockingQueue::new(),
            state: Mutex::new(ManagerState::default()),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    pub fn repository(&self) -> &Arc<dyn EventRepository> {
        &self.repository
    }

    /// Creates a session for `request`, enqueues it active and returns its
    /// id. Ids start at 0 and increase by one per session.
    ///
    /// The cursor is seeded from the first ready event at or after the start
    /// revision; an empty repository leaves it unset.
    pub fn add_new_session(
        &self,
        request: WatchRequest,
        client: Arc<dyn WatchClient>,
    ) -> WatchResult<SessionId> {
        let cursor = match self.repository.next_ready_event(request.start_revision) {
            Ok(event) => Some(event.revision),
            Err(RepositoryError::EndOfList) => None,
            Err(e) => {
                error!(error = %e, start_revision = request.start_revision, "add_new_session failed");
                return Err(e.into());
            }
        };

        // The id is assigned and the session enqueued under one lock, so no
        // consumer can see a session before its id is final.
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id = id.next();
        self.active.push(WatchSession::new(id, request, cursor, client));
        drop(state);

        info!(session = %id, ?cursor, "watch session created");
        Ok(id)
    }

    /// Waits up to the poll timeout for an active session. Sessions whose id
    /// was deleted are dropped and skipped. `None` means the active queue
    /// stayed empty.
    pub fn get_next_session(&self) -> Option<WatchSession> {
        loop {
            let session = self.active.pop_timeout(self.poll_timeout)?;
            if self.state.lock().deleted.remove(&session.id()) {
                debug!(session = %session.id(), "reaping deleted watch session");
                continue;
            }
            return Some(session);
        }
    }

    pub fn add_active_session(&self, session: WatchSession) {
        self.active.push(session);
    }

    pub fn add_inactive_session(&self, session: WatchSession) {
        self.inactive.push(session);
    }

    /// Moves every inactive session to the active queue, oldest first.
    /// Returns how many moved.
    pub fn activate_sessions(&self) -> usize {
        let mut moved = 0;
        while let Some(session) = self.inactive.try_pop() {
            self.active.push(session);
            moved += 1;
        }
        if moved > 0 {
            debug!(sessions = moved, "watch sessions activated");
        }
        moved
    }

    /// Marks `id` deleted. The session itself is dropped the next time it
    /// is dequeued. Ids this manager never handed out are rejected.
    pub fn delete_session(&self, id: SessionId) -> WatchResult<()> {
        let mut state = self.state.lock();
        if id >= state.next_id {
            warn!(session = %id, "delete_session for an unassigned id");
            return Err(WatchError::InvalidParameter(format!(
                "session {id} was never created"
            )));
        }
        state.deleted.insert(id);
        drop(state);
        debug!(session = %id, "watch session marked deleted");
        Ok(())
    }

    /// Drops any pending deletion for `id`. Called when a session is
    /// discarded outside the queues, so its id does not linger.
    pub fn forget(&self, id: SessionId) {
        if self.state.lock().deleted.remove(&id) {
            debug!(session = %id, "pending deletion forgotten");
        }
    }

    /// Drops every queued session and forgets all deletions.
    pub fn clear(&self) {
        let active = self.active.drain().len();
        let inactive = self.inactive.drain().len();
        self.state.lock().deleted.clear();
        if active + inactive > 0 {
            info!(active, inactive, "watch sessions cleared");
        }
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn inactive_len(&self) -> usize {
        self.inactive.len()
    }

    pub fn deleted_len(&self) -> usize {
        self.state.lock().deleted.len()
    }
}

impl Drop for WatchSessionManager {
    fn drop(&mut self) {
        self.clear();
    }
}
