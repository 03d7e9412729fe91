//! LDAP schema engine for the directory server.
//!
//! Holds the five kinds of schema element and the operations a running
//! server needs to evolve its schema safely:
//! - [`LdapSchema`]: the name-keyed store, with shallow and deep copies
//! - [`merge`]: builds the content of an upgraded schema from old + new
//! - [`compat`]: decides whether a new definition may replace a running one
//! - [`verify`]: checks cross-references and class hierarchy rules
//! - loading from definition strings, schema files and a partner directory
//! - [`SchemaDiff`]: the LDAP operations that move one schema to another
//!
//! # Upgrade flow
//!
//! A published schema is immutable. An upgrade parses the incoming
//! definitions, checks them against the running schema, merges the two into
//! a fresh candidate and verifies it. Only a candidate that passed every
//! step replaces the running schema.
//!
//! ```
//! use vmdir_schema::{LdapSchema, SchemaDefinitions, compat, merge};
//!
//! let defs = SchemaDefinitions {
//!     attribute_types: vec![
//!         "( 2.5.4.0 NAME 'objectClass' SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 )".into(),
//!         "( 2.5.4.3 NAME 'cn' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )".into(),
//!     ],
//!     object_classes: vec![
//!         "( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )".into(),
//!         "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST cn )".into(),
//!     ],
//!     ..Default::default()
//! };
//! let mut running = LdapSchema::new();
//! running.load_definitions(&defs).unwrap();
//!
//! let incoming = LdapSchema::parse_definitions(&defs, &running).unwrap();
//! compat::check_schema_upgrade(&running, &incoming).unwrap();
//! let upgraded = merge::merge_schema(&running, &incoming).unwrap();
//! assert_eq!(upgraded, running);
//! ```

mod attribute_type;
pub mod compat;
mod content_rule;
mod diff;
mod entity;
mod error;
mod file;
mod index;
mod load;
pub mod merge;
mod name_form;
mod names;
mod object_class;
mod parse;
mod remote;
mod store;
mod structure_rule;
pub mod verify;

pub use attribute_type::{AttributeType, AttributeUsage, SEARCH_FLAG_INDEXED};
pub use content_rule::ContentRule;
pub use diff::{
    LdapMod, ModOp, SchemaDiff, SchemaObjectDiff, attribute_type_diff, content_rule_diff,
    object_class_diff,
};
pub use entity::{EntityKind, SchemaEntity};
pub use error::{SchemaError, SchemaResult};
pub use file::read_schema_file;
pub use index::IndexDefinition;
pub use load::SchemaDefinitions;
pub use name_form::NameForm;
pub use object_class::{ObjectClass, ObjectClassKind, TOP_CLASS};
pub use parse::Extension;
pub use remote::{
    ATTRIBUTE_SCHEMA_FILTER, CLASS_SCHEMA_FILTER, SCHEMA_NAMING_CONTEXT_DN, SchemaDirectory,
    SchemaEntry,
};
pub use store::{EntityMap, LdapSchema, Stored};
pub use structure_rule::StructureRule;
