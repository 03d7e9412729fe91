//! Merging old and new definitions into the content of an upgraded schema.
//!
//! Merging decides *what* the upgraded schema contains. Whether the upgrade
//! is allowed at all is decided separately by [`crate::compat`].

use crate::attribute_type::AttributeType;
use crate::content_rule::ContentRule;
use crate::error::{SchemaError, SchemaResult};
use crate::name_form::NameForm;
use crate::names;
use crate::object_class::ObjectClass;
use crate::store::{LdapSchema, Stored};
use crate::structure_rule::StructureRule;
use crate::verify;
use std::sync::Arc;
use tracing::debug;

fn start<T: Clone>(old: Option<&T>, new: Option<&T>, kind: &str) -> SchemaResult<T> {
    new.or(old)
        .cloned()
        .ok_or_else(|| SchemaError::InvalidParameter(format!("nothing to merge for {kind}")))
}

fn keep_old<T: Clone>(field: &mut Option<T>, old: &Option<T>) {
    if old.is_some() {
        field.clone_from(old);
    }
}

/// Merges two attribute type definitions; at least one must be present.
///
/// The new definition is the base. The old description survives when the
/// new one has none, search flags are OR-ed, uniqueness scopes are unioned,
/// and SUP, the matching rules and the syntax length stay as first declared.
pub fn merge_attribute_type(
    old: Option<&AttributeType>,
    new: Option<&AttributeType>,
) -> SchemaResult<AttributeType> {
    let mut merged = start(old, new, "attribute type")?;
    let (Some(old), Some(_)) = (old, new) else {
        return Ok(merged);
    };

    if merged.desc.is_none() {
        merged.desc.clone_from(&old.desc);
    }
    merged.search_flags |= old.search_flags;
    merged.unique_scopes = names::union(&old.unique_scopes, &merged.unique_scopes);

    keep_old(&mut merged.sup, &old.sup);
    keep_old(&mut merged.equality, &old.equality);
    keep_old(&mut merged.ordering, &old.ordering);
    keep_old(&mut merged.substr, &old.substr);
    keep_old(&mut merged.syntax_len, &old.syntax_len);

    Ok(merged)
}

/// Merges two object class definitions. `may` never shrinks on merge.
pub fn merge_object_class(
    old: Option<&ObjectClass>,
    new: Option<&ObjectClass>,
) -> SchemaResult<ObjectClass> {
    let mut merged = start(old, new, "object class")?;
    let (Some(old), Some(_)) = (old, new) else {
        return Ok(merged);
    };

    if merged.desc.is_none() {
        merged.desc.clone_from(&old.desc);
    }
    merged.may = names::union(&old.may, &merged.may);

    Ok(merged)
}

/// Merges two content rules, unioning `may` and `aux`.
pub fn merge_content_rule(
    old: Option<&ContentRule>,
    new: Option<&ContentRule>,
) -> SchemaResult<ContentRule> {
    let mut merged = start(old, new, "content rule")?;
    let (Some(old), Some(_)) = (old, new) else {
        return Ok(merged);
    };

    merged.may = names::union(&old.may, &merged.may);
    merged.aux = names::union(&old.aux, &merged.aux);

    Ok(merged)
}

fn merge_kind<T: Stored>(
    old_schema: &LdapSchema,
    new_schema: &LdapSchema,
    merged: &mut LdapSchema,
    merge: impl Fn(Option<&T>, Option<&T>) -> SchemaResult<T>,
) -> SchemaResult<()> {
    for new in new_schema.entities::<T>() {
        let old = old_schema.get::<T>(new.name());
        let result = merge(old.map(Arc::as_ref), Some(new.as_ref()))?;
        merged.insert::<T>(result)?;
    }
    Ok(())
}

/// Builds the union of `old` and `new`, then resolves and verifies it.
///
/// Nothing is shared mutably with either input: the result is a fresh store
/// the caller may publish once this returns `Ok`.
pub fn merge_schema(old: &LdapSchema, new: &LdapSchema) -> SchemaResult<LdapSchema> {
    let mut merged = old.copy();

    merge_kind::<AttributeType>(old, new, &mut merged, merge_attribute_type)?;
    merge_kind::<ObjectClass>(old, new, &mut merged, merge_object_class)?;
    merge_kind::<ContentRule>(old, new, &mut merged, merge_content_rule)?;
    // Structure rules and name forms have no merge rules: the new one wins.
    merge_kind::<StructureRule>(old, new, &mut merged, |_, n| start(None, n, "structure rule"))?;
    merge_kind::<NameForm>(old, new, &mut merged, |_, n| start(None, n, "name form"))?;

    for index in new.indices() {
        merged.add_index(index.clone())?;
    }

    verify::resolve_and_verify_all(&mut merged)?;
    debug!(
        old = old.len(),
        new = new.len(),
        merged = merged.len(),
        "schema merged"
    );
    Ok(merged)
}
