//! Shared watch fixtures.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use vmdir_types::{ChangeEvent, ChangeKind, SessionId};
use vmdir_watch::{
    EventRepository, MemoryEventRepository, RepositoryError, WatchClient, WatchError,
    WatchResult, WatchSessionManager,
};

/// Records every delivered event.
#[derive(Default)]
pub struct RecordingClient {
    pub delivered: Mutex<Vec<(SessionId, ChangeEvent)>>,
    pub fail: bool,
}

impl RecordingClient {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn revisions(&self) -> Vec<u64> {
        self.delivered.lock().iter().map(|(_, e)| e.revision).collect()
    }
}

impl WatchClient for RecordingClient {
    fn deliver(&self, session: SessionId, event: &ChangeEvent) -> WatchResult<()> {
        if self.fail {
            return Err(WatchError::Delivery {
                session,
                reason: "connection closed".into(),
            });
        }
        self.delivered.lock().push((session, event.clone()));
        Ok(())
    }
}

/// A repository that always fails.
pub struct BrokenRepository;

impl EventRepository for BrokenRepository {
    fn next_ready_event(&self, _from: u64) -> Result<ChangeEvent, RepositoryError> {
        Err(RepositoryError::Backend("disk unavailable".into()))
    }
}

pub fn event(revision: u64, dn: &str) -> ChangeEvent {
    ChangeEvent::new(revision, dn, ChangeKind::Modify)
}

pub fn repository_with(revisions: &[u64]) -> Arc<MemoryEventRepository> {
    let repo = Arc::new(MemoryEventRepository::new());
    for &rev in revisions {
        repo.publish(event(rev, &format!("cn=user{rev},cn=users,dc=example,dc=com")));
    }
    repo
}

pub fn manager(repo: Arc<MemoryEventRepository>) -> WatchSessionManager {
    WatchSessionManager::new(repo).with_poll_timeout(Duration::from_millis(20))
}
