//! Differences between two schemas, expressed as LDAP add/modify operations
//! against the schema naming context.
//!
//! The operations are what a replica must apply to its `cn=schemacontext`
//! subtree to move from the old schema to the new one. Content rules live on
//! their class entry, so a rule's changes are folded into its class's diff.

use crate::attribute_type::AttributeType;
use crate::content_rule::ContentRule;
use crate::error::{SchemaError, SchemaResult};
use crate::names;
use crate::object_class::ObjectClass;
use crate::remote::{SCHEMA_NAMING_CONTEXT_DN, attr};
use crate::store::LdapSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const OC_ATTRIBUTE_SCHEMA: &str = "attributeSchema";
const OC_CLASS_SCHEMA: &str = "classSchema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModOp {
    Add,
    Replace,
}

/// One attribute modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapMod {
    pub op: ModOp,
    pub attribute: String,
    pub values: Vec<String>,
}

/// All modifications for one schema entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObjectDiff {
    pub cn: String,
    pub dn: String,
    pub mods: Vec<LdapMod>,
}

impl SchemaObjectDiff {
    #[must_use]
    pub fn new(cn: impl Into<String>) -> Self {
        let cn = cn.into();
        Self {
            dn: format!("cn={cn},{SCHEMA_NAMING_CONTEXT_DN}"),
            cn,
            mods: Vec::new(),
        }
    }

    /// Adds values under `attribute`. Mods are keyed by attribute: values
    /// for an existing key are appended, and mixing operations on one
    /// attribute is an error.
    pub fn add_mod<I, S>(&mut self, op: ModOp, attribute: &str, values: I) -> SchemaResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into);
        match self
            .mods
            .iter_mut()
            .find(|m| m.attribute.eq_ignore_ascii_case(attribute))
        {
            Some(existing) if existing.op != op => Err(SchemaError::invalid(format!(
                "{}: conflicting operations on {attribute}",
                self.cn
            ))),
            Some(existing) => {
                existing.values.extend(values);
                Ok(())
            }
            None => {
                self.mods.push(LdapMod {
                    op,
                    attribute: attribute.to_string(),
                    values: values.collect(),
                });
                Ok(())
            }
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&LdapMod> {
        self.mods
            .iter()
            .find(|m| m.attribute.eq_ignore_ascii_case(attribute))
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}

/// Entries to add and modify, attribute types before classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub attr_to_add: Vec<SchemaObjectDiff>,
    pub attr_to_modify: Vec<SchemaObjectDiff>,
    /// Ordered so superclasses and auxiliary classes precede their users.
    pub class_to_add: Vec<SchemaObjectDiff>,
    pub class_to_modify: Vec<SchemaObjectDiff>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.attr_to_add.len()
            + self.attr_to_modify.len()
            + self.class_to_add.len()
            + self.class_to_modify.len()
    }
}

fn description_mods(
    diff: &mut SchemaObjectDiff,
    old: Option<&str>,
    new: Option<&str>,
) -> SchemaResult<()> {
    match (old, new) {
        (None, Some(desc)) => diff.add_mod(ModOp::Add, attr::DESCRIPTION, [desc]),
        (Some(prev), Some(desc)) if prev != desc => {
            diff.add_mod(ModOp::Replace, attr::DESCRIPTION, [desc])
        }
        _ => Ok(()),
    }
}

fn bool_value(b: bool) -> &'static str {
    if b { "TRUE" } else { "FALSE" }
}

/// The diff turning `old` into `new`, or `None` when nothing changes.
pub fn attribute_type_diff(
    old: Option<&AttributeType>,
    new: &AttributeType,
) -> SchemaResult<Option<SchemaObjectDiff>> {
    let mut diff = SchemaObjectDiff::new(&new.name);
    let usage = new.stored_usage().to_string();
    let search_flags = new.search_flags.to_string();

    match old {
        None => {
            diff.add_mod(ModOp::Add, attr::IS_SINGLE_VALUED, [bool_value(new.single_value)])?;
            diff.add_mod(ModOp::Add, attr::OBJECT_CLASS, [OC_ATTRIBUTE_SCHEMA])?;
            diff.add_mod(ModOp::Add, attr::CN, [new.name.as_str()])?;
            if let Some(syntax) = &new.syntax_oid {
                diff.add_mod(ModOp::Add, attr::ATTRIBUTE_SYNTAX, [syntax.as_str()])?;
            }
            diff.add_mod(ModOp::Add, attr::ATTRIBUTE_USAGE, [usage])?;
            diff.add_mod(ModOp::Add, attr::ATTRIBUTE_ID, [new.oid.as_str()])?;
            diff.add_mod(ModOp::Add, attr::OM_SYNTAX, ["1"])?;
            if let Some(desc) = &new.desc {
                diff.add_mod(ModOp::Add, attr::DESCRIPTION, [desc.as_str()])?;
            }
            if new.search_flags != 0 {
                diff.add_mod(ModOp::Add, attr::SEARCH_FLAGS, [search_flags])?;
            }
            if !new.unique_scopes.is_empty() {
                diff.add_mod(ModOp::Add, attr::UNIQUENESS_SCOPE, new.unique_scopes.iter().cloned())?;
            }
        }
        Some(old) => {
            if new.single_value != old.single_value {
                diff.add_mod(
                    ModOp::Replace,
                    attr::IS_SINGLE_VALUED,
                    [bool_value(new.single_value)],
                )?;
            }
            if new.no_user_modification != old.no_user_modification || new.usage != old.usage {
                diff.add_mod(ModOp::Replace, attr::ATTRIBUTE_USAGE, [usage])?;
            }
            if new.search_flags != old.search_flags {
                diff.add_mod(ModOp::Replace, attr::SEARCH_FLAGS, [search_flags])?;
            }
            let scopes = names::difference(&new.unique_scopes, &old.unique_scopes);
            if !scopes.is_empty() {
                diff.add_mod(ModOp::Add, attr::UNIQUENESS_SCOPE, scopes)?;
            }
            description_mods(&mut diff, old.desc.as_deref(), new.desc.as_deref())?;
        }
    }

    Ok((!diff.is_empty()).then_some(diff))
}

pub fn object_class_diff(
    old: Option<&ObjectClass>,
    new: &ObjectClass,
) -> SchemaResult<Option<SchemaObjectDiff>> {
    let mut diff = SchemaObjectDiff::new(&new.name);

    match old {
        None => {
            diff.add_mod(ModOp::Add, attr::OBJECT_CLASS, [OC_CLASS_SCHEMA])?;
            diff.add_mod(ModOp::Add, attr::CN, [new.name.as_str()])?;
            diff.add_mod(
                ModOp::Add,
                attr::OBJECT_CLASS_CATEGORY,
                [new.kind.category().to_string()],
            )?;
            diff.add_mod(ModOp::Add, attr::GOVERNS_ID, [new.oid.as_str()])?;
            if let Some(sup) = &new.sup {
                diff.add_mod(ModOp::Add, attr::SUBCLASS_OF, [sup.as_str()])?;
            }
            if !new.must.is_empty() {
                diff.add_mod(ModOp::Add, attr::SYSTEM_MUST_CONTAIN, new.must.iter().cloned())?;
            }
            if !new.may.is_empty() {
                diff.add_mod(ModOp::Add, attr::SYSTEM_MAY_CONTAIN, new.may.iter().cloned())?;
            }
            if let Some(desc) = &new.desc {
                diff.add_mod(ModOp::Add, attr::DESCRIPTION, [desc.as_str()])?;
            }
        }
        Some(old) => {
            let may = names::difference(&new.may, &old.may);
            if !may.is_empty() {
                diff.add_mod(ModOp::Add, attr::SYSTEM_MAY_CONTAIN, may)?;
            }
            description_mods(&mut diff, old.desc.as_deref(), new.desc.as_deref())?;
        }
    }

    Ok((!diff.is_empty()).then_some(diff))
}

/// Appends the content rule's changes to its class's diff.
pub fn content_rule_diff(
    old: Option<&ContentRule>,
    new: &ContentRule,
    diff: &mut SchemaObjectDiff,
) -> SchemaResult<()> {
    match old {
        None => {
            if !new.must.is_empty() {
                diff.add_mod(ModOp::Add, attr::MUST_CONTAIN, new.must.iter().cloned())?;
            }
            if !new.may.is_empty() {
                diff.add_mod(ModOp::Add, attr::MAY_CONTAIN, new.may.iter().cloned())?;
            }
            if !new.aux.is_empty() {
                diff.add_mod(ModOp::Add, attr::AUXILIARY_CLASS, new.aux.iter().cloned())?;
            }
        }
        Some(old) => {
            let may = names::difference(&new.may, &old.may);
            if !may.is_empty() {
                diff.add_mod(ModOp::Add, attr::MAY_CONTAIN, may)?;
            }
            let aux = names::difference(&new.aux, &old.aux);
            if !aux.is_empty() {
                diff.add_mod(ModOp::Add, attr::AUXILIARY_CLASS, aux)?;
            }
        }
    }
    Ok(())
}

fn lookup<'a, T>(map: Option<&'a Arc<T>>) -> Option<&'a T> {
    map.map(Arc::as_ref)
}

impl LdapSchema {
    /// Computes the operations that turn `self` into `new`.
    ///
    /// Only additions are expressed: entities present in `self` but absent
    /// from `new` produce nothing.
    pub fn diff(&self, new: &LdapSchema) -> SchemaResult<SchemaDiff> {
        let mut out = SchemaDiff::default();

        for at in new.sorted::<AttributeType>() {
            let old = lookup(self.attribute_type(&at.name));
            if let Some(d) = attribute_type_diff(old, at)? {
                if old.is_some() {
                    out.attr_to_modify.push(d);
                } else {
                    out.attr_to_add.push(d);
                }
            }
        }

        // Class diffs keyed by lowercase cn; the flag records whether the
        // class already exists in `self`.
        let mut classes: BTreeMap<String, (bool, SchemaObjectDiff)> = BTreeMap::new();
        for oc in new.sorted::<ObjectClass>() {
            let old = lookup(self.object_class(&oc.name));
            if let Some(d) = object_class_diff(old, oc)? {
                classes.insert(names::key(&oc.name), (old.is_some(), d));
            }
        }

        for cr in new.sorted::<ContentRule>() {
            let old = lookup(self.content_rule(&cr.name));
            let key = names::key(&cr.name);
            match classes.get_mut(&key) {
                Some((_, d)) => content_rule_diff(old, cr, d)?,
                None => {
                    let mut d = SchemaObjectDiff::new(&cr.name);
                    content_rule_diff(old, cr, &mut d)?;
                    if !d.is_empty() {
                        let exists = self.object_class(&cr.name).is_some();
                        classes.insert(key, (exists, d));
                    }
                }
            }
        }

        let mut to_add = Vec::new();
        for (exists, d) in classes.into_values() {
            if exists {
                out.class_to_modify.push(d);
            } else {
                to_add.push(d);
            }
        }
        out.class_to_add = sort_by_hierarchy(new, to_add);

        Ok(out)
    }
}

/// Orders class additions so each class follows its superclass and the
/// auxiliary classes of its content rule, when those are also being added.
fn sort_by_hierarchy(schema: &LdapSchema, to_add: Vec<SchemaObjectDiff>) -> Vec<SchemaObjectDiff> {
    let order: Vec<String> = to_add.iter().map(|d| names::key(&d.cn)).collect();
    let mut pending: HashMap<String, SchemaObjectDiff> = to_add
        .into_iter()
        .map(|d| (names::key(&d.cn), d))
        .collect();
    let mut sorted = Vec::with_capacity(order.len());

    for key in &order {
        place(schema, &mut pending, &mut sorted, key);
    }
    sorted
}

fn place(
    schema: &LdapSchema,
    pending: &mut HashMap<String, SchemaObjectDiff>,
    sorted: &mut Vec<SchemaObjectDiff>,
    key: &str,
) {
    // Removing first also breaks any cycle.
    let Some(diff) = pending.remove(key) else {
        return;
    };

    if let Some(cr) = schema.content_rule(&diff.cn) {
        for aux in &cr.aux {
            place(schema, pending, sorted, &names::key(aux));
        }
    }
    if let Some(sup) = schema.object_class(&diff.cn).and_then(|oc| oc.sup.as_deref()) {
        place(schema, pending, sorted, &names::key(sup));
    }

    sorted.push(diff);
}
