//! DIT content rules (RFC 4512 §4.1.6).

use crate::entity::{EntityKind, SchemaEntity, common_accessors};
use crate::error::{SchemaError, SchemaResult};
use crate::parse::{self, Arity, Description, Extension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) const TAGS: &[&str] = &["ditcontentrules:", "ditcontentrule:"];

/// A content rule. Its OID and name are those of the structural class it
/// extends.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentRule {
    pub oid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aux: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub may: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl ContentRule {
    #[must_use]
    pub fn new(oid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_aux<I, S>(mut self, aux: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aux = aux.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_must<I, S>(mut self, must: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.must = must.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_may<I, S>(mut self, may: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.may = may.into_iter().map(Into::into).collect();
        self
    }

    /// True when the rule carries no lists at all.
    pub fn is_blank(&self) -> bool {
        self.aux.is_empty() && self.must.is_empty() && self.may.is_empty() && self.not.is_empty()
    }
}

fn arity(keyword: &str) -> Option<Arity> {
    match keyword {
        "NAME" | "DESC" | "AUX" | "MUST" | "MAY" | "NOT" => Some(Arity::Value),
        "OBSOLETE" => Some(Arity::Flag),
        _ => None,
    }
}

impl SchemaEntity for ContentRule {
    const KIND: EntityKind = EntityKind::ContentRule;

    fn parse(text: &str) -> SchemaResult<Self> {
        let d = Description::parse(text, TAGS, arity)?;
        let (name, aliases) = d.names();
        Ok(Self {
            oid: d.id.clone(),
            name,
            aliases,
            desc: d.first("DESC"),
            obsolete: d.flag("OBSOLETE"),
            aux: d.values("AUX"),
            must: d.values("MUST"),
            may: d.values("MAY"),
            not: d.values("NOT"),
            extensions: d.extensions(),
        })
    }

    common_accessors!();
}

impl FromStr for ContentRule {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        <Self as SchemaEntity>::parse(s)
    }
}

impl fmt::Display for ContentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        parse::write_names(f, &self.name, &self.aliases)?;
        parse::write_qdstring(f, "DESC", self.desc.as_deref())?;
        parse::write_flag(f, "OBSOLETE", self.obsolete)?;
        parse::write_oids(f, "AUX", &self.aux)?;
        parse::write_oids(f, "MUST", &self.must)?;
        parse::write_oids(f, "MAY", &self.may)?;
        parse::write_oids(f, "NOT", &self.not)?;
        parse::write_extensions(f, &self.extensions)?;
        f.write_str(" )")
    }
}
