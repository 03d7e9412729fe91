//! Change events handed to watch sessions.
//!
//! An event records one committed write against the directory tree. Events
//! are immutable once published; watch sessions only hold a cursor into the
//! repository that stores them.

use crate::Revision;
use serde::{Deserialize, Serialize};

/// The kind of write an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
    ModifyDn,
}

/// A committed change against one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Position of this event in the change stream.
    pub revision: Revision,
    /// DN of the changed entry.
    pub dn: String,
    pub kind: ChangeKind,
    /// LDIF-ish rendering of the entry after the change, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Rendering of the entry before the change, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_entry: Option<String>,
}

impl ChangeEvent {
    /// Creates an event without entry payloads.
    pub fn new(revision: Revision, dn: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            revision,
            dn: dn.into(),
            kind,
            entry: None,
            prev_entry: None,
        }
    }

    /// Attaches the post-change entry payload.
    #[must_use]
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    /// Attaches the pre-change entry payload.
    #[must_use]
    pub fn with_prev_entry(mut self, prev: impl Into<String>) -> Self {
        self.prev_entry = Some(prev.into());
        self
    }

    /// Returns true when `dn` equals `base` or lies beneath it.
    ///
    /// DN comparison is case-insensitive and ignores whitespace around RDN
    /// separators. An empty base matches every entry.
    #[must_use]
    pub fn is_within(&self, base: &str) -> bool {
        let base = normalize_dn(base);
        if base.is_empty() {
            return true;
        }
        let dn = normalize_dn(&self.dn);
        dn == base || dn.ends_with(&format!(",{base}"))
    }
}

fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|rdn| rdn.trim().to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}
