//! Attribute type definitions (RFC 4512 §4.1.2).

use crate::entity::{EntityKind, SchemaEntity, common_accessors};
use crate::error::{SchemaError, SchemaResult};
use crate::parse::{self, Arity, Description, Extension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Search-flag bit marking an attribute as indexed.
pub const SEARCH_FLAG_INDEXED: u32 = 0x1;

pub(crate) const TAGS: &[&str] = &["attributetypes:", "attributetype:"];

/// The `USAGE` of an attribute type, numbered as the directory stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeUsage {
    #[default]
    UserApplications = 0,
    DirectoryOperation = 1,
    DistributedOperation = 2,
    DsaOperation = 3,
}

impl AttributeUsage {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::UserApplications => "userApplications",
            Self::DirectoryOperation => "directoryOperation",
            Self::DistributedOperation => "distributedOperation",
            Self::DsaOperation => "dSAOperation",
        }
    }

    /// Decodes the low three bits of a `vmwAttributeUsage` value.
    ///
    /// The stored form is `(1 << usage) >> 1`, so the usage is the number
    /// of shifts needed to clear the bits.
    pub fn from_stored_bits(value: u32) -> Self {
        let mut bits = value & 0x7;
        let mut usage = 0;
        while bits != 0 {
            bits >>= 1;
            usage += 1;
        }
        match usage {
            1 => Self::DirectoryOperation,
            2 => Self::DistributedOperation,
            3 => Self::DsaOperation,
            _ => Self::UserApplications,
        }
    }

    pub fn stored_bits(self) -> u32 {
        (1u32 << self as u32) >> 1
    }
}

impl FromStr for AttributeUsage {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        [
            Self::UserApplications,
            Self::DirectoryOperation,
            Self::DistributedOperation,
            Self::DsaOperation,
        ]
        .into_iter()
        .find(|u| u.keyword().eq_ignore_ascii_case(s))
        .ok_or_else(|| SchemaError::invalid(format!("unknown attribute usage: {s}")))
    }
}

/// An attribute type definition.
///
/// `search_flags` and `unique_scopes` are directory metadata with no place in
/// the RFC text form; they survive re-parsing only through explicit copies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeType {
    pub oid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_oid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_len: Option<u32>,
    #[serde(default)]
    pub single_value: bool,
    #[serde(default)]
    pub collective: bool,
    #[serde(default)]
    pub no_user_modification: bool,
    #[serde(default)]
    pub usage: AttributeUsage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
    #[serde(default)]
    pub search_flags: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_scopes: Vec<String>,
}

impl AttributeType {
    #[must_use]
    pub fn new(oid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_syntax(mut self, syntax_oid: impl Into<String>) -> Self {
        self.syntax_oid = Some(syntax_oid.into());
        self
    }

    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    #[must_use]
    pub fn with_sup(mut self, sup: impl Into<String>) -> Self {
        self.sup = Some(sup.into());
        self
    }

    #[must_use]
    pub fn single_valued(mut self) -> Self {
        self.single_value = true;
        self
    }

    #[must_use]
    pub fn with_search_flags(mut self, flags: u32) -> Self {
        self.search_flags = flags;
        self
    }

    pub fn is_indexed(&self) -> bool {
        self.search_flags & SEARCH_FLAG_INDEXED != 0
    }

    /// The `vmwAttributeUsage` value stored in the directory.
    pub fn stored_usage(&self) -> u32 {
        self.usage.stored_bits() | if self.no_user_modification { 0x8 } else { 0 }
    }
}

fn arity(keyword: &str) -> Option<Arity> {
    match keyword {
        "NAME" | "DESC" | "SUP" | "EQUALITY" | "ORDERING" | "SUBSTR" | "SYNTAX" | "USAGE" => {
            Some(Arity::Value)
        }
        "OBSOLETE" | "SINGLE-VALUE" | "COLLECTIVE" | "NO-USER-MODIFICATION" => Some(Arity::Flag),
        _ => None,
    }
}

impl SchemaEntity for AttributeType {
    const KIND: EntityKind = EntityKind::AttributeType;

    fn parse(text: &str) -> SchemaResult<Self> {
        let d = Description::parse(text, TAGS, arity)?;
        let (name, aliases) = d.names();
        let (syntax_oid, syntax_len) = match d.first("SYNTAX") {
            Some(s) => {
                let (oid, len) = parse::split_noidlen(&s)?;
                (Some(oid), len)
            }
            None => (None, None),
        };
        let usage = d
            .first("USAGE")
            .map(|u| u.parse::<AttributeUsage>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            oid: d.id.clone(),
            name,
            aliases,
            desc: d.first("DESC"),
            obsolete: d.flag("OBSOLETE"),
            sup: d.first("SUP"),
            equality: d.first("EQUALITY"),
            ordering: d.first("ORDERING"),
            substr: d.first("SUBSTR"),
            syntax_oid,
            syntax_len,
            single_value: d.flag("SINGLE-VALUE"),
            collective: d.flag("COLLECTIVE"),
            no_user_modification: d.flag("NO-USER-MODIFICATION"),
            usage,
            extensions: d.extensions(),
            search_flags: 0,
            unique_scopes: Vec::new(),
        })
    }

    common_accessors!();
}

impl FromStr for AttributeType {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        <Self as SchemaEntity>::parse(s)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        parse::write_names(f, &self.name, &self.aliases)?;
        parse::write_qdstring(f, "DESC", self.desc.as_deref())?;
        parse::write_flag(f, "OBSOLETE", self.obsolete)?;
        parse::write_oid(f, "SUP", self.sup.as_deref())?;
        parse::write_oid(f, "EQUALITY", self.equality.as_deref())?;
        parse::write_oid(f, "ORDERING", self.ordering.as_deref())?;
        parse::write_oid(f, "SUBSTR", self.substr.as_deref())?;
        if let Some(syntax) = &self.syntax_oid {
            match self.syntax_len {
                Some(len) => write!(f, " SYNTAX {syntax}{{{len}}}")?,
                None => write!(f, " SYNTAX {syntax}")?,
            }
        }
        parse::write_flag(f, "SINGLE-VALUE", self.single_value)?;
        parse::write_flag(f, "COLLECTIVE", self.collective)?;
        parse::write_flag(f, "NO-USER-MODIFICATION", self.no_user_modification)?;
        if self.usage != AttributeUsage::UserApplications {
            write!(f, " USAGE {}", self.usage.keyword())?;
        }
        parse::write_extensions(f, &self.extensions)?;
        f.write_str(" )")
    }
}
