//! Reading a partner directory's schema from its schema naming context.
//!
//! Each attribute type is an `attributeSchema` entry and each object class a
//! `classSchema` entry under `cn=schemacontext`. A class entry may also carry
//! the class's content rule.

use crate::attribute_type::{AttributeType, AttributeUsage};
use crate::content_rule::ContentRule;
use crate::error::{SchemaError, SchemaResult};
use crate::names;
use crate::object_class::{ObjectClass, ObjectClassKind, TOP_CLASS};
use crate::store::LdapSchema;
use crate::verify;
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const SCHEMA_NAMING_CONTEXT_DN: &str = "cn=schemacontext";
pub const ATTRIBUTE_SCHEMA_FILTER: &str = "(objectClass=attributeSchema)";
pub const CLASS_SCHEMA_FILTER: &str = "(objectClass=classSchema)";

/// Directory attribute names used by schema entries.
pub(crate) mod attr {
    pub const CN: &str = "cn";
    pub const OBJECT_CLASS: &str = "objectClass";
    pub const DESCRIPTION: &str = "description";
    pub const IS_SINGLE_VALUED: &str = "isSingleValued";
    pub const ATTRIBUTE_USAGE: &str = "vmwAttributeUsage";
    pub const ATTRIBUTE_SYNTAX: &str = "attributeSyntax";
    pub const ATTRIBUTE_ID: &str = "attributeID";
    pub const OM_SYNTAX: &str = "oMSyntax";
    pub const SEARCH_FLAGS: &str = "searchFlags";
    pub const UNIQUENESS_SCOPE: &str = "vmwAttrUniquenessScope";
    pub const SUBCLASS_OF: &str = "subClassOf";
    pub const GOVERNS_ID: &str = "governsID";
    pub const OBJECT_CLASS_CATEGORY: &str = "objectClassCategory";
    pub const SYSTEM_MUST_CONTAIN: &str = "systemMustContain";
    pub const SYSTEM_MAY_CONTAIN: &str = "systemMayContain";
    pub const MUST_CONTAIN: &str = "mustContain";
    pub const MAY_CONTAIN: &str = "mayContain";
    pub const AUXILIARY_CLASS: &str = "auxiliaryClass";
    pub const SYSTEM_AUXILIARY_CLASS: &str = "systemAuxiliaryClass";
}

/// One directory entry, attribute names folded to lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaEntry {
    pub dn: String,
    attrs: HashMap<String, Vec<String>>,
}

impl SchemaEntry {
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn from_attrs(dn: impl Into<String>, attrs: HashMap<String, Vec<String>>) -> Self {
        let mut entry = Self::new(dn);
        for (name, values) in attrs {
            entry.attrs.entry(names::key(&name)).or_default().extend(values);
        }
        entry
    }

    #[must_use]
    pub fn with_attr<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs
            .entry(names::key(name))
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.attrs
            .get(&names::key(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        !self.values(name).is_empty()
    }

    fn first_owned(&self, name: &str) -> Option<String> {
        self.first(name).map(str::to_string)
    }

    fn number(&self, name: &str) -> SchemaResult<Option<i64>> {
        self.first(name)
            .map(|v| {
                v.trim().parse::<i64>().map_err(|_| {
                    SchemaError::invalid(format!("{}: {name} is not a number: {v}", self.dn))
                })
            })
            .transpose()
    }

    fn required(&self, name: &str) -> SchemaResult<String> {
        self.first_owned(name)
            .ok_or_else(|| SchemaError::invalid(format!("{}: missing {name}", self.dn)))
    }
}

/// A directory that can answer subtree searches.
pub trait SchemaDirectory {
    fn search_subtree(&mut self, base: &str, filter: &str) -> SchemaResult<Vec<SchemaEntry>>;
}

impl AttributeType {
    /// Builds an attribute type from an `attributeSchema` entry.
    pub fn from_entry(entry: &SchemaEntry) -> SchemaResult<Self> {
        let mut at = AttributeType::new(
            entry.first_owned(attr::ATTRIBUTE_ID).unwrap_or_default(),
            entry.required(attr::CN)?,
        );

        at.single_value = entry
            .first(attr::IS_SINGLE_VALUED)
            .is_some_and(|v| v.eq_ignore_ascii_case("TRUE"));
        if let Some(usage) = entry.number(attr::ATTRIBUTE_USAGE)? {
            let usage = u32::try_from(usage).map_err(|_| {
                SchemaError::invalid(format!("{}: negative vmwAttributeUsage", entry.dn))
            })?;
            at.no_user_modification = usage & 0x8 != 0;
            at.usage = AttributeUsage::from_stored_bits(usage);
        }
        at.syntax_oid = entry.first_owned(attr::ATTRIBUTE_SYNTAX);
        at.desc = entry.first_owned(attr::DESCRIPTION);
        if let Some(flags) = entry.number(attr::SEARCH_FLAGS)? {
            at.search_flags = u32::try_from(flags).map_err(|_| {
                SchemaError::invalid(format!("{}: searchFlags out of range", entry.dn))
            })?;
        }
        at.unique_scopes = entry.values(attr::UNIQUENESS_SCOPE).to_vec();

        Ok(at)
    }
}

impl ObjectClass {
    /// Builds an object class from a `classSchema` entry.
    pub fn from_entry(entry: &SchemaEntry) -> SchemaResult<Self> {
        let kind = entry
            .number(attr::OBJECT_CLASS_CATEGORY)?
            .map_or(ObjectClassKind::Structural, ObjectClassKind::from_category);
        let mut oc = ObjectClass::new(
            entry.first_owned(attr::GOVERNS_ID).unwrap_or_default(),
            entry.required(attr::CN)?,
            kind,
        );
        oc.sup = entry.first_owned(attr::SUBCLASS_OF);
        if oc.sup.is_none() && !oc.is_top() {
            oc.sup = Some(TOP_CLASS.to_string());
        }
        oc.desc = entry.first_owned(attr::DESCRIPTION);
        oc.must = entry.values(attr::SYSTEM_MUST_CONTAIN).to_vec();
        oc.may = entry.values(attr::SYSTEM_MAY_CONTAIN).to_vec();
        Ok(oc)
    }
}

impl ContentRule {
    /// Builds the content rule a `classSchema` entry carries, if any.
    pub fn from_entry(entry: &SchemaEntry) -> SchemaResult<Option<Self>> {
        let aux = names::union(
            entry.values(attr::AUXILIARY_CLASS),
            entry.values(attr::SYSTEM_AUXILIARY_CLASS),
        );
        let must = entry.values(attr::MUST_CONTAIN).to_vec();
        let may = entry.values(attr::MAY_CONTAIN).to_vec();
        if aux.is_empty() && must.is_empty() && may.is_empty() {
            return Ok(None);
        }

        let mut cr = ContentRule::new(
            entry.first_owned(attr::GOVERNS_ID).unwrap_or_default(),
            entry.required(attr::CN)?,
        );
        cr.aux = aux;
        cr.must = must;
        cr.may = may;
        Ok(Some(cr))
    }
}

impl LdapSchema {
    /// Adds every attribute type, object class and content rule published
    /// by `directory`, then resolves and verifies the result.
    pub fn load_remote_schema(&mut self, directory: &mut dyn SchemaDirectory) -> SchemaResult<()> {
        let attributes = directory
            .search_subtree(SCHEMA_NAMING_CONTEXT_DN, ATTRIBUTE_SCHEMA_FILTER)
            .inspect_err(|e| warn!(error = %e, "attribute schema search failed"))?;
        for entry in &attributes {
            self.add_attribute_type(AttributeType::from_entry(entry)?)?;
        }

        let classes = directory
            .search_subtree(SCHEMA_NAMING_CONTEXT_DN, CLASS_SCHEMA_FILTER)
            .inspect_err(|e| warn!(error = %e, "class schema search failed"))?;
        let mut rules = 0usize;
        for entry in &classes {
            self.add_object_class(ObjectClass::from_entry(entry)?)?;
            if let Some(cr) = ContentRule::from_entry(entry)? {
                debug!(class = %cr.name, "content rule found on class entry");
                self.add_content_rule(cr)?;
                rules += 1;
            }
        }

        verify::resolve_and_verify_all(self)?;
        info!(
            attribute_types = attributes.len(),
            object_classes = classes.len(),
            content_rules = rules,
            "remote schema loaded"
        );
        Ok(())
    }
}

#[cfg(feature = "ldap")]
impl SchemaDirectory for ldap3::LdapConn {
    fn search_subtree(&mut self, base: &str, filter: &str) -> SchemaResult<Vec<SchemaEntry>> {
        let (entries, _res) = self
            .search(base, ldap3::Scope::Subtree, filter, vec!["*"])
            .and_then(|r| r.success())
            .map_err(|e| SchemaError::Remote(e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|e| {
                let e = ldap3::SearchEntry::construct(e);
                SchemaEntry::from_attrs(e.dn, e.attrs)
            })
            .collect())
    }
}
