//! The schema store: five name-keyed maps plus index declarations.
//!
//! A store that has been published to readers is never mutated. Changes are
//! made on a candidate built with [`LdapSchema::copy`] or
//! [`LdapSchema::deep_copy`] and the candidate replaces the published store
//! as a whole.

use crate::attribute_type::AttributeType;
use crate::content_rule::ContentRule;
use crate::entity::SchemaEntity;
use crate::error::{SchemaError, SchemaResult};
use crate::index::IndexDefinition;
use crate::name_form::NameForm;
use crate::names;
use crate::object_class::ObjectClass;
use crate::structure_rule::StructureRule;
use std::collections::HashMap;
use std::sync::Arc;

/// Map of lowercase name → shared entity.
pub type EntityMap<T> = HashMap<String, Arc<T>>;

/// An entity kind that has a home in [`LdapSchema`].
pub trait Stored: SchemaEntity {
    fn map(schema: &LdapSchema) -> &EntityMap<Self>;
    fn map_mut(schema: &mut LdapSchema) -> &mut EntityMap<Self>;
}

macro_rules! stored {
    ($ty:ty, $field:ident) => {
        impl Stored for $ty {
            fn map(schema: &LdapSchema) -> &EntityMap<Self> {
                &schema.$field
            }

            fn map_mut(schema: &mut LdapSchema) -> &mut EntityMap<Self> {
                &mut schema.$field
            }
        }
    };
}

/// An LDAP schema.
///
/// `Clone` is shallow: entities are shared by `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LdapSchema {
    attribute_types: EntityMap<AttributeType>,
    object_classes: EntityMap<ObjectClass>,
    content_rules: EntityMap<ContentRule>,
    structure_rules: EntityMap<StructureRule>,
    name_forms: EntityMap<NameForm>,
    indices: HashMap<String, IndexDefinition>,
}

stored!(AttributeType, attribute_types);
stored!(ObjectClass, object_classes);
stored!(ContentRule, content_rules);
stored!(StructureRule, structure_rules);
stored!(NameForm, name_forms);

impl LdapSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff all five entity maps are empty. Index declarations alone do
    /// not make a schema.
    pub fn is_empty(&self) -> bool {
        self.attribute_types.is_empty()
            && self.object_classes.is_empty()
            && self.content_rules.is_empty()
            && self.structure_rules.is_empty()
            && self.name_forms.is_empty()
    }

    /// Total number of entities across all kinds.
    pub fn len(&self) -> usize {
        self.attribute_types.len()
            + self.object_classes.len()
            + self.content_rules.len()
            + self.structure_rules.len()
            + self.name_forms.len()
    }

    // ── Generic access ───────────────────────────────────────────

    /// Inserts or replaces an entity under its primary name.
    pub fn insert<T: Stored>(&mut self, entity: impl Into<Arc<T>>) -> SchemaResult<()> {
        let entity = entity.into();
        if entity.name().trim().is_empty() {
            return Err(SchemaError::InvalidParameter(format!(
                "{} {} has no name",
                T::KIND,
                entity.oid()
            )));
        }
        T::map_mut(self).insert(names::key(entity.name()), entity);
        Ok(())
    }

    pub fn get<T: Stored>(&self, name: &str) -> Option<&Arc<T>> {
        T::map(self).get(&names::key(name))
    }

    /// Like [`get`](Self::get), but absence is an error.
    pub fn require<T: Stored>(&self, name: &str) -> SchemaResult<&Arc<T>> {
        self.get(name)
            .ok_or_else(|| SchemaError::NotFound(format!("{} {name}", T::KIND)))
    }

    pub fn remove<T: Stored>(&mut self, name: &str) -> Option<Arc<T>> {
        T::map_mut(self).remove(&names::key(name))
    }

    pub fn entities<T: Stored>(&self) -> impl Iterator<Item = &Arc<T>> {
        T::map(self).values()
    }

    /// Entities of one kind ordered by name, for deterministic output.
    pub fn sorted<T: Stored>(&self) -> Vec<&Arc<T>> {
        let mut all: Vec<_> = T::map(self).iter().collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all.into_iter().map(|(_, v)| v).collect()
    }

    // ── Per-kind operations ──────────────────────────────────────

    pub fn add_attribute_type(&mut self, at: impl Into<Arc<AttributeType>>) -> SchemaResult<()> {
        self.insert::<AttributeType>(at)
    }

    pub fn add_object_class(&mut self, oc: impl Into<Arc<ObjectClass>>) -> SchemaResult<()> {
        self.insert::<ObjectClass>(oc)
    }

    pub fn add_content_rule(&mut self, cr: impl Into<Arc<ContentRule>>) -> SchemaResult<()> {
        self.insert::<ContentRule>(cr)
    }

    pub fn add_structure_rule(&mut self, sr: impl Into<Arc<StructureRule>>) -> SchemaResult<()> {
        self.insert::<StructureRule>(sr)
    }

    pub fn add_name_form(&mut self, nf: impl Into<Arc<NameForm>>) -> SchemaResult<()> {
        self.insert::<NameForm>(nf)
    }

    pub fn attribute_type(&self, name: &str) -> Option<&Arc<AttributeType>> {
        self.get(name)
    }

    pub fn object_class(&self, name: &str) -> Option<&Arc<ObjectClass>> {
        self.get(name)
    }

    pub fn content_rule(&self, name: &str) -> Option<&Arc<ContentRule>> {
        self.get(name)
    }

    pub fn structure_rule(&self, name: &str) -> Option<&Arc<StructureRule>> {
        self.get(name)
    }

    pub fn name_form(&self, name: &str) -> Option<&Arc<NameForm>> {
        self.get(name)
    }

    /// Finds a structure rule by its integer rule id.
    pub fn structure_rule_by_id(&self, rule_id: &str) -> Option<&Arc<StructureRule>> {
        self.structure_rules.values().find(|sr| sr.oid == rule_id)
    }

    // ── Index declarations ───────────────────────────────────────

    pub fn add_index(&mut self, index: IndexDefinition) -> SchemaResult<()> {
        if index.attribute.trim().is_empty() {
            return Err(SchemaError::InvalidParameter(
                "index definition has no attribute".into(),
            ));
        }
        self.indices.insert(names::key(&index.attribute), index);
        Ok(())
    }

    pub fn index(&self, attribute: &str) -> Option<&IndexDefinition> {
        self.indices.get(&names::key(attribute))
    }

    pub fn indices(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.indices.values()
    }

    pub(crate) fn retain_indices(&mut self, mut keep: impl FnMut(&IndexDefinition) -> bool) {
        self.indices.retain(|_, idx| keep(idx));
    }

    // ── Copies ───────────────────────────────────────────────────

    /// Shallow copy: both stores share every entity.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Fully independent copy built by rendering and re-parsing every
    /// entity. Attribute-type metadata the text form omits is carried over
    /// explicitly.
    pub fn deep_copy(&self) -> SchemaResult<Self> {
        let mut copy = Self::new();

        for at in self.attribute_types.values() {
            let mut fresh = <AttributeType as SchemaEntity>::parse(&at.to_string())?;
            fresh.search_flags = at.search_flags;
            fresh.unique_scopes = at.unique_scopes.clone();
            copy.add_attribute_type(fresh)?;
        }
        reparse_into::<ObjectClass>(self, &mut copy)?;
        reparse_into::<ContentRule>(self, &mut copy)?;
        reparse_into::<StructureRule>(self, &mut copy)?;
        reparse_into::<NameForm>(self, &mut copy)?;
        copy.indices = self.indices.clone();

        Ok(copy)
    }
}

fn reparse_into<T: Stored>(from: &LdapSchema, to: &mut LdapSchema) -> SchemaResult<()> {
    for entity in T::map(from).values() {
        let fresh = T::parse(&entity.to_string())?;
        to.insert::<T>(fresh)?;
    }
    Ok(())
}
