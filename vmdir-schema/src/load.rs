//! Loading textual definitions into a store.

use crate::attribute_type::AttributeType;
use crate::content_rule::ContentRule;
use crate::entity::SchemaEntity;
use crate::error::SchemaResult;
use crate::index::IndexDefinition;
use crate::merge;
use crate::name_form::NameForm;
use crate::object_class::{ObjectClass, TOP_CLASS};
use crate::store::LdapSchema;
use crate::structure_rule::StructureRule;
use crate::verify;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Raw definition strings grouped by kind, as read from a schema file or
/// submitted by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDefinitions {
    pub attribute_types: Vec<String>,
    pub object_classes: Vec<String>,
    pub content_rules: Vec<String>,
    pub structure_rules: Vec<String>,
    pub name_forms: Vec<String>,
    pub indices: Vec<String>,
}

impl SchemaDefinitions {
    pub fn is_empty(&self) -> bool {
        self.attribute_types.is_empty()
            && self.object_classes.is_empty()
            && self.content_rules.is_empty()
            && self.structure_rules.is_empty()
            && self.name_forms.is_empty()
            && self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attribute_types.len()
            + self.object_classes.len()
            + self.content_rules.len()
            + self.structure_rules.len()
            + self.name_forms.len()
            + self.indices.len()
    }
}

/// Parses attribute types from text. When `base` is non-empty, a type that
/// names a superior but no syntax takes the superior's syntax from `base`.
fn parse_attribute_types<S: AsRef<str>>(
    texts: &[S],
    base: &LdapSchema,
) -> SchemaResult<Vec<AttributeType>> {
    let mut out = Vec::with_capacity(texts.len());
    for text in texts {
        let mut at = <AttributeType as SchemaEntity>::parse(text.as_ref())?;
        if !base.is_empty() && at.syntax_oid.is_none() {
            if let Some(parent) = at.sup.as_deref().and_then(|sup| base.attribute_type(sup)) {
                at.syntax_oid.clone_from(&parent.syntax_oid);
            }
        }
        out.extend(at.expand_aliases());
    }
    Ok(out)
}

fn parse_object_classes<S: AsRef<str>>(texts: &[S]) -> SchemaResult<Vec<ObjectClass>> {
    let mut out = Vec::with_capacity(texts.len());
    for text in texts {
        let mut oc = <ObjectClass as SchemaEntity>::parse(text.as_ref())?;
        if oc.sup.is_none() && !oc.is_top() {
            oc.sup = Some(TOP_CLASS.to_string());
        }
        out.extend(oc.expand_aliases());
    }
    Ok(out)
}

fn parse_all<T: SchemaEntity, S: AsRef<str>>(texts: &[S]) -> SchemaResult<Vec<T>> {
    let mut out = Vec::with_capacity(texts.len());
    for text in texts {
        out.extend(T::parse(text.as_ref())?.expand_aliases());
    }
    Ok(out)
}

impl LdapSchema {
    /// Loads definition strings, merging each with any same-named entity
    /// already in the store, then resolves, verifies and drops no-op index
    /// declarations.
    ///
    /// On error the store may hold a partial load and must be discarded.
    pub fn load_str_lists<S: AsRef<str>>(
        &mut self,
        attribute_types: &[S],
        object_classes: &[S],
        content_rules: &[S],
        indices: &[S],
    ) -> SchemaResult<()> {
        self.load_lists(attribute_types, object_classes, content_rules, &[], &[], indices)
    }

    /// [`load_str_lists`](Self::load_str_lists) for every kind, including
    /// structure rules and name forms.
    pub fn load_definitions(&mut self, defs: &SchemaDefinitions) -> SchemaResult<()> {
        self.load_lists(
            &defs.attribute_types,
            &defs.object_classes,
            &defs.content_rules,
            &defs.structure_rules,
            &defs.name_forms,
            &defs.indices,
        )
    }

    fn load_lists<S: AsRef<str>>(
        &mut self,
        attribute_types: &[S],
        object_classes: &[S],
        content_rules: &[S],
        structure_rules: &[S],
        name_forms: &[S],
        indices: &[S],
    ) -> SchemaResult<()> {
        for at in parse_attribute_types(attribute_types, self)? {
            let merged = merge::merge_attribute_type(
                self.attribute_type(&at.name).map(Arc::as_ref),
                Some(&at),
            )?;
            self.add_attribute_type(merged)?;
        }

        for oc in parse_object_classes(object_classes)? {
            let merged = merge::merge_object_class(
                self.object_class(&oc.name).map(Arc::as_ref),
                Some(&oc),
            )?;
            self.add_object_class(merged)?;
        }

        for cr in parse_all::<ContentRule, _>(content_rules)? {
            let merged = merge::merge_content_rule(
                self.content_rule(&cr.name).map(Arc::as_ref),
                Some(&cr),
            )?;
            self.add_content_rule(merged)?;
        }

        for sr in parse_all::<StructureRule, _>(structure_rules)? {
            self.add_structure_rule(sr)?;
        }
        for nf in parse_all::<NameForm, _>(name_forms)? {
            self.add_name_form(nf)?;
        }

        for text in indices {
            self.add_index(IndexDefinition::parse(text.as_ref())?)?;
        }

        verify::resolve_and_verify_all(self)?;
        self.remove_noop_data();

        info!(
            attribute_types = attribute_types.len(),
            object_classes = object_classes.len(),
            content_rules = content_rules.len(),
            indices = indices.len(),
            total = self.len(),
            "schema definitions loaded"
        );
        Ok(())
    }

    /// Parses definitions into a standalone store without merging or
    /// verifying, so each can be checked against a running schema.
    /// Attribute types that only name a superior take its syntax from
    /// `running`.
    pub fn parse_definitions(
        defs: &SchemaDefinitions,
        running: &LdapSchema,
    ) -> SchemaResult<LdapSchema> {
        let mut schema = LdapSchema::new();
        for at in parse_attribute_types(&defs.attribute_types, running)? {
            schema.add_attribute_type(at)?;
        }
        for oc in parse_object_classes(&defs.object_classes)? {
            schema.add_object_class(oc)?;
        }
        for cr in parse_all::<ContentRule, _>(&defs.content_rules)? {
            schema.add_content_rule(cr)?;
        }
        for sr in parse_all::<StructureRule, _>(&defs.structure_rules)? {
            schema.add_structure_rule(sr)?;
        }
        for nf in parse_all::<NameForm, _>(&defs.name_forms)? {
            schema.add_name_form(nf)?;
        }
        for text in &defs.indices {
            schema.add_index(IndexDefinition::parse(text)?)?;
        }
        Ok(schema)
    }

    /// Drops index declarations that would change nothing: the attribute
    /// is already indexed and no uniqueness is requested.
    pub fn remove_noop_data(&mut self) {
        let indexed: Vec<String> = self
            .indices()
            .filter(|idx| !idx.globally_unique)
            .filter(|idx| self.attribute_type(&idx.attribute).is_some_and(|at| at.is_indexed()))
            .map(|idx| idx.attribute.clone())
            .collect();

        if indexed.is_empty() {
            return;
        }
        debug!(?indexed, "dropping no-op index declarations");
        self.retain_indices(|idx| {
            !indexed.iter().any(|name| name.eq_ignore_ascii_case(&idx.attribute))
        });
    }
}
