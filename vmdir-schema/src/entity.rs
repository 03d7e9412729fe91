//! The behavior shared by all five schema element kinds.

use crate::error::SchemaResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five kinds of LDAP schema element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    AttributeType,
    ObjectClass,
    ContentRule,
    StructureRule,
    NameForm,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AttributeType => "attribute type",
            Self::ObjectClass => "object class",
            Self::ContentRule => "content rule",
            Self::StructureRule => "structure rule",
            Self::NameForm => "name form",
        })
    }
}

/// A schema element with a textual form (`Display` renders, `parse` reads).
///
/// Rendering then parsing must reproduce every field the text form carries;
/// the store's deep copy depends on it.
pub trait SchemaEntity: Clone + PartialEq + fmt::Display + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Parses a single definition, accepting an optional LDIF tag prefix.
    fn parse(text: &str) -> SchemaResult<Self>;

    /// The primary name; the store key.
    fn name(&self) -> &str;

    fn oid(&self) -> &str;

    fn aliases(&self) -> &[String];

    fn desc(&self) -> Option<&str>;

    /// Returns a copy whose primary name is `alias`, the old name demoted.
    fn renamed(&self, alias: &str) -> Self;

    /// One entity per declared name, each promoting that name to primary.
    fn expand_aliases(&self) -> Vec<Self> {
        let mut out = Vec::with_capacity(self.aliases().len() + 1);
        out.push(self.clone());
        out.extend(self.aliases().iter().map(|alias| self.renamed(alias)));
        out
    }
}

pub(crate) fn promote_alias(name: &mut String, aliases: &mut Vec<String>, alias: &str) {
    if name.eq_ignore_ascii_case(alias) {
        return;
    }
    if let Some(pos) = aliases.iter().position(|a| a.eq_ignore_ascii_case(alias)) {
        let promoted = aliases.remove(pos);
        let previous = std::mem::replace(name, promoted);
        aliases.insert(0, previous);
    }
}

/// Implements the accessor half of [`SchemaEntity`] for structs that carry
/// the common `oid`, `name`, `aliases` and `desc` fields.
macro_rules! common_accessors {
    () => {
        fn name(&self) -> &str {
            &self.name
        }

        fn oid(&self) -> &str {
            &self.oid
        }

        fn aliases(&self) -> &[String] {
            &self.aliases
        }

        fn desc(&self) -> Option<&str> {
            self.desc.as_deref()
        }

        fn renamed(&self, alias: &str) -> Self {
            let mut copy = self.clone();
            $crate::entity::promote_alias(&mut copy.name, &mut copy.aliases, alias);
            copy
        }
    };
}

pub(crate) use common_accessors;
