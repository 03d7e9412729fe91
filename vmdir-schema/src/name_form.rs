//! Name forms (RFC 4512 §4.1.7.2).

use crate::entity::{EntityKind, SchemaEntity, common_accessors};
use crate::error::{SchemaError, SchemaResult};
use crate::parse::{self, Arity, Description, Extension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) const TAGS: &[&str] = &["nameforms:", "nameform:"];

/// A name form: which attributes may appear in the RDN of a structural class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameForm {
    pub oid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub obsolete: bool,
    pub oc: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub may: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl NameForm {
    #[must_use]
    pub fn new(oid: impl Into<String>, name: impl Into<String>, oc: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            name: name.into(),
            oc: oc.into(),
            ..Default::default()
        }
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
}

fn arity(keyword: &str) -> Option<Arity> {
    match keyword {
        "NAME" | "DESC" | "OC" | "MUST" | "MAY" => Some(Arity::Value),
        "OBSOLETE" => Some(Arity::Flag),
        _ => None,
    }
}

impl SchemaEntity for NameForm {
    const KIND: EntityKind = EntityKind::NameForm;

    fn parse(text: &str) -> SchemaResult<Self> {
        let d = Description::parse(text, TAGS, arity)?;
        let (name, aliases) = d.names();
        let oc = d
            .first("OC")
            .ok_or_else(|| SchemaError::invalid(format!("name form {} has no OC", d.id)))?;
        let must = d.values("MUST");
        if must.is_empty() {
            return Err(SchemaError::invalid(format!("name form {} has no MUST", d.id)));
        }

        Ok(Self {
            oid: d.id.clone(),
            name,
            aliases,
            desc: d.first("DESC"),
            obsolete: d.flag("OBSOLETE"),
            oc,
            must,
            may: d.values("MAY"),
            extensions: d.extensions(),
        })
    }

    common_accessors!();
}

impl FromStr for NameForm {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        <Self as SchemaEntity>::parse(s)
    }
}

impl fmt::Display for NameForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        parse::write_names(f, &self.name, &self.aliases)?;
        parse::write_qdstring(f, "DESC", self.desc.as_deref())?;
        parse::write_flag(f, "OBSOLETE", self.obsolete)?;
        write!(f, " OC {}", self.oc)?;
        parse::write_oids(f, "MUST", &self.must)?;
        parse::write_oids(f, "MAY", &self.may)?;
        parse::write_extensions(f, &self.extensions)?;
        f.write_str(" )")
    }
}
