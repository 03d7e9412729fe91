//! Index declarations: `( NAME 'attr' [GLOBALLY-UNIQUE] )`.

use crate::error::{SchemaError, SchemaResult};
use crate::parse;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) const TAGS: &[&str] = &["attributeindices:", "attributeindex:"];

/// A request to index an attribute, optionally enforcing global uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub attribute: String,
    #[serde(default)]
    pub globally_unique: bool,
}

impl IndexDefinition {
    #[must_use]
    pub fn new(attribute: impl Into<String>, globally_unique: bool) -> Self {
        Self {
            attribute: attribute.into(),
            globally_unique,
        }
    }

    /// Parses an index declaration. Only the exact four or five token shapes
    /// are accepted; there is no OID and no other keyword.
    pub fn parse(text: &str) -> SchemaResult<Self> {
        let body = parse::strip_tag(text, TAGS);
        let tokens: Vec<&str> = body.split_whitespace().collect();

        let (attribute, globally_unique) = match tokens.as_slice() {
            ["(", name_kw, attr, ")"] if name_kw.eq_ignore_ascii_case("NAME") => (*attr, false),
            ["(", name_kw, attr, unique, ")"]
                if name_kw.eq_ignore_ascii_case("NAME")
                    && unique.eq_ignore_ascii_case("GLOBALLY-UNIQUE") =>
            {
                (*attr, true)
            }
            _ => {
                return Err(SchemaError::invalid(format!("malformed index definition: {body}")));
            }
        };

        let attribute = attribute
            .strip_prefix('\'')
            .and_then(|a| a.strip_suffix('\''))
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                SchemaError::invalid(format!("index attribute must be a quoted name: {body}"))
            })?;
        Ok(Self::new(attribute, globally_unique))
    }
}

impl FromStr for IndexDefinition {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( NAME '{}'", self.attribute)?;
        if self.globally_unique {
            f.write_str(" GLOBALLY-UNIQUE")?;
        }
        f.write_str(" )")
    }
}
