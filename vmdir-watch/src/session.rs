//! A single watch subscription.

use crate::error::WatchResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use vmdir_types::{ChangeEvent, Revision, SessionId};

/// The connection a session's events are delivered over.
pub trait WatchClient: Send + Sync {
    /// Sends one event to the client.
    fn deliver(&self, session: SessionId, event: &ChangeEvent) -> WatchResult<()>;
}

/// What a client asked to watch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchRequest {
    /// First revision the client wants to see.
    pub start_revision: Revision,
    /// LDAP filter text, passed through to the client's search machinery.
    pub filter: String,
    /// Only changes at or beneath this DN are delivered. Empty means all.
    pub subtree_dn: String,
    /// Include the entry's previous value with each event.
    pub prev_value: bool,
}

impl WatchRequest {
    #[must_use]
    pub fn new(start_revision: Revision) -> Self {
        Self {
            start_revision,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_subtree(mut self, dn: impl Into<String>) -> Self {
        self.subtree_dn = dn.into();
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use]
    pub fn with_prev_value(mut self) -> Self {
        self.prev_value = true;
        self
    }
}

pub struct WatchSession {
    id: SessionId,
    request: WatchRequest,
    /// Revision to read from next; `None` until the repository had an
    /// event at or after the start revision.
    cursor: Option<Revision>,
    client: Arc<dyn WatchClient>,
}

impl WatchSession {
    #[must_use]
    pub fn new(
        id: SessionId,
        request: WatchRequest,
        cursor: Option<Revision>,
        client: Arc<dyn WatchClient>,
    ) -> Self {
        Self {
            id,
            request,
            cursor,
            client,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn request(&self) -> &WatchRequest {
        &self.request
    }

    #[must_use]
    pub fn cursor(&self) -> Option<Revision> {
        self.cursor
    }

    /// Where the next repository read starts.
    #[must_use]
    pub fn next_revision(&self) -> Revision {
        self.cursor.unwrap_or(self.request.start_revision)
    }

    /// Moves the cursor past `revision`.
    pub fn advance_past(&mut self, revision: Revision) {
        self.cursor = Some(revision.saturating_add(1));
    }

    /// True when `event` falls inside the watched subtree.
    #[must_use]
    pub fn wants(&self, event: &ChangeEvent) -> bool {
        event.is_within(&self.request.subtree_dn)
    }

    /// Delivers `event`, stripping the previous value unless it was asked
    /// for.
    pub fn deliver(&self, event: &ChangeEvent) -> WatchResult<()> {
        if self.request.prev_value || event.prev_entry.is_none() {
            return self.client.deliver(self.id, event);
        }
        let trimmed = ChangeEvent {
            prev_entry: None,
            ..event.clone()
        };
        self.client.deliver(self.id, &trimmed)
    }
}

impl fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSession")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
