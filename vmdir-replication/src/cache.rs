//! Process-wide UTD vector cache.
//!
//! The cache holds the map and its serialized form behind one read/write
//! lock. [`replace`](UtdVectorCache::replace) takes the write lock; every
//! other operation takes the read lock. [`add`](UtdVectorCache::add) runs on
//! the replication hot path, so it only takes the read lock: the map itself
//! is concurrent and the string is regenerated under its own mutex after
//! each insert, which keeps the two consistent once concurrent adds settle.

use crate::error::{UtdResult, UtdVectorError};
use crate::utd_vector::UtdVector;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use tracing::{debug, warn};
use vmdir_types::{InvocationId, Usn};

#[derive(Debug, Default)]
struct CacheState {
    entries: DashMap<InvocationId, Usn>,
    serialized: Mutex<String>,
}

impl CacheState {
    fn snapshot(&self) -> UtdVector {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}

/// Thread-safe cache of this replica's up-to-date vector.
#[derive(Debug, Default)]
pub struct UtdVectorCache {
    state: RwLock<CacheState>,
}

impl UtdVectorCache {
    /// Creates an empty cache. Its serialized form is `""`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole vector with the parsed content of `vector`.
    ///
    /// The cached string becomes `vector` verbatim. On a parse error the
    /// cache is left untouched.
    pub fn replace(&self, vector: &str) -> UtdResult<()> {
        let parsed = UtdVector::parse(vector)
            .inspect_err(|e| warn!(error = %e, "UTD vector replace rejected"))?;

        let state = self.state.write();
        state.entries.clear();
        for (id, usn) in parsed.iter() {
            state.entries.insert(id.clone(), usn);
        }
        *state.serialized.lock() = vector.to_string();

        debug!(entries = parsed.len(), "UTD vector replaced");
        Ok(())
    }

    /// The cached wire string.
    #[must_use]
    pub fn serialized(&self) -> String {
        self.state.read().serialized.lock().clone()
    }

    /// Returns the USN recorded for `invocation_id`.
    pub fn lookup(&self, invocation_id: &str) -> UtdResult<Usn> {
        let state = self.state.read();
        state
            .entries
            .get(invocation_id)
            .map(|usn| *usn)
            .ok_or_else(|| UtdVectorError::NotFound(invocation_id.to_string()))
    }

    /// Records `usn` for `invocation_id`, overwriting any previous value,
    /// and regenerates the wire string.
    pub fn add(&self, invocation_id: &str, usn: Usn) -> UtdResult<()> {
        let id = InvocationId::parse(invocation_id).map_err(|e| {
            warn!(invocation_id, error = %e, "UTD vector add rejected");
            UtdVectorError::InvalidParameter(e.to_string())
        })?;

        let state = self.state.read();
        state.entries.insert(id, usn);

        let mut serialized = state.serialized.lock();
        *serialized = state.snapshot().to_string();

        debug!(invocation_id, usn, "UTD vector entry updated");
        Ok(())
    }

    /// The current vector as a value.
    #[must_use]
    pub fn snapshot(&self) -> UtdVector {
        self.state.read().snapshot()
    }

    /// Empties the cache.
    pub fn clear(&self) {
        let state = self.state.write();
        state.entries.clear();
        state.serialized.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

impl fmt::Display for UtdVectorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized())
    }
}
