//! Schema files: LDIF-style `tag: value` lines with folded continuations.
//!
//! ```text
//! # comment
//! attributetypes: ( 2.5.4.3 NAME 'cn'
//!   SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )
//! objectclasses: ( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST cn )
//! attributeindices: ( NAME 'cn' )
//! ```
//!
//! Lines with other tags (`dn:`, `objectclass:` ...) are skipped.

use crate::error::SchemaResult;
use crate::load::SchemaDefinitions;
use std::path::Path;
use tracing::{debug, info};

impl SchemaDefinitions {
    /// Parses schema file content. Definitions are kept as text; they are
    /// parsed when loaded into a store.
    pub fn parse(content: &str) -> Self {
        let mut defs = Self::default();
        for record in unfold(content) {
            let Some((tag, value)) = record.split_once(':') else {
                debug!(line = %record, "skipping untagged schema line");
                continue;
            };
            let value = value.trim().to_string();
            match tag.trim().to_ascii_lowercase().as_str() {
                "attributetypes" => defs.attribute_types.push(value),
                "objectclasses" => defs.object_classes.push(value),
                "ditcontentrules" => defs.content_rules.push(value),
                "ditstructurerules" => defs.structure_rules.push(value),
                "nameforms" => defs.name_forms.push(value),
                "attributeindices" => defs.indices.push(value),
                other => debug!(tag = other, "skipping schema file line"),
            }
        }
        defs
    }
}

/// Joins continuation lines (leading space) onto their record and drops
/// comments and blank lines.
fn unfold(content: &str) -> Vec<String> {
    let mut records: Vec<String> = Vec::new();
    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some(last) = records.last_mut() {
                last.push(' ');
                last.push_str(rest.trim_start());
                continue;
            }
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        records.push(trimmed.to_string());
    }
    records
}

/// Reads and parses a schema file.
pub fn read_schema_file(path: impl AsRef<Path>) -> SchemaResult<SchemaDefinitions> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let defs = SchemaDefinitions::parse(&content);
    info!(path = %path.display(), definitions = defs.len(), "schema file read");
    Ok(defs)
}
