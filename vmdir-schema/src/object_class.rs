//! Object class definitions (RFC 4512 §4.1.1).

use crate::entity::{EntityKind, SchemaEntity, common_accessors};
use crate::error::{SchemaError, SchemaResult};
use crate::parse::{self, Arity, Description, Extension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) const TAGS: &[&str] = &["objectclasses:", "objectclass:"];

/// Name of the root class every hierarchy ends at.
pub const TOP_CLASS: &str = "top";

/// Object class kind, numbered like the directory's `objectClassCategory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClassKind {
    #[default]
    Structural = 1,
    Abstract = 2,
    Auxiliary = 3,
}

impl ObjectClassKind {
    /// Maps an `objectClassCategory` value; anything unknown is structural.
    pub fn from_category(category: i64) -> Self {
        match category {
            2 => Self::Abstract,
            3 => Self::Auxiliary,
            _ => Self::Structural,
        }
    }

    pub fn category(self) -> u32 {
        self as u32
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Structural => "STRUCTURAL",
            Self::Abstract => "ABSTRACT",
            Self::Auxiliary => "AUXILIARY",
        }
    }
}

/// An object class definition with a single superclass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectClass {
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
    #[serde(default)]
    pub kind: ObjectClassKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub may: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl ObjectClass {
    #[must_use]
    pub fn new(oid: impl Into<String>, name: impl Into<String>, kind: ObjectClassKind) -> Self {
        Self {
            oid: oid.into(),
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_sup(mut self, sup: impl Into<String>) -> Self {
        self.sup = Some(sup.into());
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

    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn is_top(&self) -> bool {
        self.name.eq_ignore_ascii_case(TOP_CLASS)
    }
}

fn arity(keyword: &str) -> Option<Arity> {
    match keyword {
        "NAME" | "DESC" | "SUP" | "MUST" | "MAY" => Some(Arity::Value),
        "OBSOLETE" | "STRUCTURAL" | "ABSTRACT" | "AUXILIARY" => Some(Arity::Flag),
        _ => None,
    }
}

impl SchemaEntity for ObjectClass {
    const KIND: EntityKind = EntityKind::ObjectClass;

    fn parse(text: &str) -> SchemaResult<Self> {
        let d = Description::parse(text, TAGS, arity)?;
        let (name, aliases) = d.names();

        let kinds: Vec<ObjectClassKind> = [
            ObjectClassKind::Structural,
            ObjectClassKind::Abstract,
            ObjectClassKind::Auxiliary,
        ]
        .into_iter()
        .filter(|k| d.flag(k.keyword()))
        .collect();
        let kind = match kinds.as_slice() {
            [] => ObjectClassKind::Structural,
            [one] => *one,
            _ => {
                return Err(SchemaError::invalid(format!(
                    "object class {name} declares more than one kind"
                )));
            }
        };

        let sups = d.values("SUP");
        if sups.len() > 1 {
            tracing::warn!(class = %name, sups = ?sups, "multiple superclasses, keeping the first");
        }

        Ok(Self {
            oid: d.id.clone(),
            name,
            aliases,
            desc: d.first("DESC"),
            obsolete: d.flag("OBSOLETE"),
            sup: sups.into_iter().next(),
            kind,
            must: d.values("MUST"),
            may: d.values("MAY"),
            extensions: d.extensions(),
        })
    }

    common_accessors!();
}

impl FromStr for ObjectClass {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        <Self as SchemaEntity>::parse(s)
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        parse::write_names(f, &self.name, &self.aliases)?;
        parse::write_qdstring(f, "DESC", self.desc.as_deref())?;
        parse::write_flag(f, "OBSOLETE", self.obsolete)?;
        parse::write_oid(f, "SUP", self.sup.as_deref())?;
        write!(f, " {}", self.kind.keyword())?;
        parse::write_oids(f, "MUST", &self.must)?;
        parse::write_oids(f, "MAY", &self.may)?;
        parse::write_extensions(f, &self.extensions)?;
        f.write_str(" )")
    }
}
