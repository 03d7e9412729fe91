//! DIT structure rules (RFC 4512 §4.1.7.1).

use crate::entity::{EntityKind, SchemaEntity, common_accessors};
use crate::error::{SchemaError, SchemaResult};
use crate::parse::{self, Arity, Description, Extension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) const TAGS: &[&str] = &["ditstructurerules:", "ditstructurerule:"];

/// A structure rule. The identifier is an integer rule id rather than an
/// OID; it is kept in `oid` as its decimal text so every kind shares one key
/// shape. A rule without a `NAME` is stored under its rule id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructureRule {
    pub oid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub obsolete: bool,
    pub form: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sup: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl StructureRule {
    #[must_use]
    pub fn new(rule_id: u32, name: impl Into<String>, form: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            oid: rule_id.to_string(),
            name: if name.is_empty() { rule_id.to_string() } else { name },
            form: form.into(),
            ..Default::default()
        }
    }

    pub fn rule_id(&self) -> SchemaResult<u32> {
        parse_rule_id(&self.oid)
    }
}

fn parse_rule_id(value: &str) -> SchemaResult<u32> {
    value
        .parse::<u32>()
        .map_err(|_| SchemaError::invalid(format!("structure rule id must be an integer: {value}")))
}

fn arity(keyword: &str) -> Option<Arity> {
    match keyword {
        "NAME" | "DESC" | "FORM" | "SUP" => Some(Arity::Value),
        "OBSOLETE" => Some(Arity::Flag),
        _ => None,
    }
}

impl SchemaEntity for StructureRule {
    const KIND: EntityKind = EntityKind::StructureRule;

    fn parse(text: &str) -> SchemaResult<Self> {
        let d = Description::parse(text, TAGS, arity)?;
        parse_rule_id(&d.id)?;
        let sup = d.values("SUP");
        for id in &sup {
            parse_rule_id(id)?;
        }
        let form = d.first("FORM").ok_or_else(|| {
            SchemaError::invalid(format!("structure rule {} has no FORM", d.id))
        })?;
        let (name, aliases) = d.names();

        Ok(Self {
            oid: d.id.clone(),
            name: if name.is_empty() { d.id.clone() } else { name },
            aliases,
            desc: d.first("DESC"),
            obsolete: d.flag("OBSOLETE"),
            form,
            sup,
            extensions: d.extensions(),
        })
    }

    common_accessors!();
}

impl FromStr for StructureRule {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        <Self as SchemaEntity>::parse(s)
    }
}

impl fmt::Display for StructureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        if self.name != self.oid {
            parse::write_names(f, &self.name, &self.aliases)?;
        }
        parse::write_qdstring(f, "DESC", self.desc.as_deref())?;
        parse::write_flag(f, "OBSOLETE", self.obsolete)?;
        write!(f, " FORM {}", self.form)?;
        match self.sup.as_slice() {
            [] => {}
            [one] => write!(f, " SUP {one}")?,
            many => write!(f, " SUP ( {} )", many.join(" "))?,
        }
        parse::write_extensions(f, &self.extensions)?;
        f.write_str(" )")
    }
}
