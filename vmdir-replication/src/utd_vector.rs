//! Up-to-date vector as a value.
//!
//! The wire form is a sequence of `invocationId:usn,` segments. Parsing
//! tolerates a missing final comma and empty segments; formatting always
//! emits one segment per entry, ordered by invocation id.

use crate::error::{UtdResult, UtdVectorError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use vmdir_types::{InvocationId, Usn};

/// Highest applied USN per partner invocation id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UtdVector {
    entries: BTreeMap<InvocationId, Usn>,
}

impl UtdVector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the wire form.
    pub fn parse(s: &str) -> UtdResult<Self> {
        let mut vector = Self::new();
        for segment in s.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (id, usn) = segment.rsplit_once(':').ok_or_else(|| {
                UtdVectorError::InvalidFormat(format!("segment without ':': {segment}"))
            })?;
            let id = InvocationId::parse(id)
                .map_err(|e| UtdVectorError::InvalidFormat(format!("{segment}: {e}")))?;
            let usn = usn.trim().parse::<Usn>().map_err(|e| {
                UtdVectorError::InvalidFormat(format!("{segment}: bad USN: {e}"))
            })?;
            vector.entries.insert(id, usn);
        }
        Ok(vector)
    }

    /// Returns the USN recorded for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Usn> {
        self.entries.get(id).copied()
    }

    /// Inserts or overwrites the USN for `id`.
    pub fn insert(&mut self, id: InvocationId, usn: Usn) {
        self.entries.insert(id, usn);
    }

    /// Raises the USN for `id` to `usn`. Lower values are ignored.
    pub fn update(&mut self, id: InvocationId, usn: Usn) {
        let entry = self.entries.entry(id).or_insert(usn);
        if usn > *entry {
            *entry = usn;
        }
    }

    /// Merges `other` into this vector, keeping the higher USN per id.
    pub fn merge(&mut self, other: &Self) {
        for (id, &usn) in &other.entries {
            self.update(id.clone(), usn);
        }
    }

    /// The first USN from `id` this replica has not yet applied. A partner
    /// never heard from is replicated from the beginning.
    #[must_use]
    pub fn usn_needed_from(&self, id: &str) -> Usn {
        self.get(id).map_or(0, |usn| usn.saturating_add(1))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InvocationId, Usn)> {
        self.entries.iter().map(|(id, usn)| (id, *usn))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for UtdVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, usn) in &self.entries {
            write!(f, "{id}:{usn},")?;
        }
        Ok(())
    }
}

impl FromStr for UtdVector {
    type Err = UtdVectorError;

    fn from_str(s: &str) -> UtdResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UtdVector {
    type Error = UtdVectorError;

    fn try_from(value: String) -> UtdResult<Self> {
        Self::parse(&value)
    }
}

impl From<UtdVector> for String {
    fn from(vector: UtdVector) -> Self {
        vector.to_string()
    }
}

impl FromIterator<(InvocationId, Usn)> for UtdVector {
    fn from_iter<I: IntoIterator<Item = (InvocationId, Usn)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
