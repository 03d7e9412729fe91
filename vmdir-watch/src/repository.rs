//! Where watch sessions read change events from.

use crate::error::RepositoryError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;
use vmdir_types::{ChangeEvent, Revision};

/// A store of committed change events, ordered by revision.
pub trait EventRepository: Send + Sync {
    /// The first ready event whose revision is at or after `from`.
    fn next_ready_event(&self, from: Revision) -> Result<ChangeEvent, RepositoryError>;
}

/// An in-memory event repository.
#[derive(Debug, Default)]
pub struct MemoryEventRepository {
    events: RwLock<BTreeMap<Revision, ChangeEvent>>,
}

impl MemoryEventRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `event`, replacing any event at the same revision.
    pub fn publish(&self, event: ChangeEvent) {
        debug!(revision = event.revision, dn = %event.dn, "change event published");
        self.events.write().insert(event.revision, event);
    }

    /// The highest stored revision.
    pub fn latest_revision(&self) -> Option<Revision> {
        self.events.read().keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventRepository for MemoryEventRepository {
    fn next_ready_event(&self, from: Revision) -> Result<ChangeEvent, RepositoryError> {
        self.events
            .read()
            .range(from..)
            .next()
            .map(|(_, event)| event.clone())
            .ok_or(RepositoryError::EndOfList)
    }
}
