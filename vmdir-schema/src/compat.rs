//! Compatibility gate for replacing a running definition with a new one.
//!
//! A new definition is compatible when entries valid under the old one stay
//! valid under the new one.

use crate::attribute_type::{AttributeType, AttributeUsage};
use crate::content_rule::ContentRule;
use crate::entity::SchemaEntity;
use crate::error::{SchemaError, SchemaResult};
use crate::name_form::NameForm;
use crate::names;
use crate::object_class::ObjectClass;
use crate::store::{LdapSchema, Stored};
use crate::structure_rule::StructureRule;
use tracing::error;

/// Both absent, or both present and equal.
pub fn strings_compatible(prev: Option<&str>, new: Option<&str>) -> bool {
    match (prev, new) {
        (None, None) => true,
        (Some(p), Some(n)) => p == n,
        _ => false,
    }
}

/// Unchanged, or `true` → `false`. Used for `SINGLE-VALUE`.
pub fn bools_compatible_t2f(prev: bool, new: bool) -> bool {
    prev == new || (prev && !new)
}

/// Unchanged, or `false` → `true`. Used for `OBSOLETE`.
pub fn bools_compatible_f2t(prev: bool, new: bool) -> bool {
    prev == new || (!prev && new)
}

fn reject(entity: &str, reason: impl Into<String>) -> SchemaError {
    let reason = reason.into();
    error!(entity, %reason, "schema not compatible");
    SchemaError::incompatible(entity, reason)
}

pub fn attribute_types_compatible(prev: &AttributeType, new: &AttributeType) -> SchemaResult<()> {
    let entity = prev.name.as_str();

    if !prev.name.eq_ignore_ascii_case(&new.name) {
        return Err(reject(entity, format!("name changed to {}", new.name)));
    }
    if !strings_compatible(prev.syntax_oid.as_deref(), new.syntax_oid.as_deref()) {
        return Err(reject(entity, "syntax changed"));
    }
    if !bools_compatible_t2f(prev.single_value, new.single_value) {
        return Err(reject(entity, "multi-valued attribute may not become single-valued"));
    }
    if !bools_compatible_f2t(prev.obsolete, new.obsolete) {
        return Err(reject(entity, "obsolete attribute may not be revived"));
    }
    if prev.no_user_modification != new.no_user_modification {
        return Err(reject(entity, "NO-USER-MODIFICATION changed"));
    }
    if prev.usage != AttributeUsage::UserApplications && prev.usage != new.usage {
        return Err(reject(entity, "usage changed"));
    }
    Ok(())
}

/// The shared must/may rule for classes and content rules.
///
/// With unchanged `must`, `may` may only grow. With `must` shrunk, every
/// demoted attribute must land in `may`. Any other change to `must` is
/// rejected.
fn must_may_compatible(
    entity: &str,
    prev_must: &[String],
    prev_may: &[String],
    new_must: &[String],
    new_may: &[String],
) -> SchemaResult<()> {
    if names::same_set(prev_must, new_must) {
        if !names::is_superset(new_may, prev_may) {
            let lost = names::difference(prev_may, new_may);
            return Err(reject(entity, format!("MAY attributes removed: {}", lost.join(", "))));
        }
        return Ok(());
    }

    if names::is_superset(prev_must, new_must) {
        let demoted = names::difference(prev_must, new_must);
        let required = names::union(prev_may, &demoted);
        if !names::is_superset(new_may, &required) {
            let lost = names::difference(&required, new_may);
            return Err(reject(entity, format!("attributes removed: {}", lost.join(", "))));
        }
        return Ok(());
    }

    let added = names::difference(new_must, prev_must);
    Err(reject(entity, format!("MUST attributes added: {}", added.join(", "))))
}

pub fn object_classes_compatible(prev: &ObjectClass, new: &ObjectClass) -> SchemaResult<()> {
    let entity = prev.name.as_str();

    if !prev.name.eq_ignore_ascii_case(&new.name) {
        return Err(reject(entity, format!("name changed to {}", new.name)));
    }
    if !names::eq_opt(prev.sup.as_deref(), new.sup.as_deref()) {
        return Err(reject(entity, "superclass changed"));
    }
    if prev.kind != new.kind {
        return Err(reject(entity, format!("kind changed from {:?} to {:?}", prev.kind, new.kind)));
    }
    must_may_compatible(entity, &prev.must, &prev.may, &new.must, &new.may)
}

pub fn content_rules_compatible(prev: &ContentRule, new: &ContentRule) -> SchemaResult<()> {
    let entity = prev.name.as_str();

    if !prev.name.eq_ignore_ascii_case(&new.name) {
        return Err(reject(entity, format!("name changed to {}", new.name)));
    }
    must_may_compatible(entity, &prev.must, &prev.may, &new.must, &new.may)?;
    if !names::is_superset(&new.aux, &prev.aux) {
        let lost = names::difference(&prev.aux, &new.aux);
        return Err(reject(entity, format!("AUX classes removed: {}", lost.join(", "))));
    }
    Ok(())
}

/// Structure rule upgrades are not supported; only a re-declaration with the
/// same canonical text passes.
pub fn structure_rules_compatible(prev: &StructureRule, new: &StructureRule) -> SchemaResult<()> {
    unchanged_or_unsupported(prev, new)
}

/// Name form upgrades are not supported; only a re-declaration with the same
/// canonical text passes.
pub fn name_forms_compatible(prev: &NameForm, new: &NameForm) -> SchemaResult<()> {
    unchanged_or_unsupported(prev, new)
}

fn unchanged_or_unsupported<T: SchemaEntity>(prev: &T, new: &T) -> SchemaResult<()> {
    if prev.to_string() == new.to_string() {
        Ok(())
    } else {
        Err(reject(prev.name(), format!("{} upgrade not supported", T::KIND)))
    }
}

fn check_kind<T: Stored>(
    running: &LdapSchema,
    incoming: &LdapSchema,
    check: impl Fn(&T, &T) -> SchemaResult<()>,
) -> SchemaResult<()> {
    for new in incoming.sorted::<T>() {
        if let Some(prev) = running.get::<T>(new.name()) {
            check(prev.as_ref(), new.as_ref())?;
        }
    }
    Ok(())
}

/// Checks every incoming definition that replaces a running one.
/// Definitions new to the running schema are not gated here.
pub fn check_schema_upgrade(running: &LdapSchema, incoming: &LdapSchema) -> SchemaResult<()> {
    check_kind::<AttributeType>(running, incoming, attribute_types_compatible)?;
    check_kind::<ObjectClass>(running, incoming, object_classes_compatible)?;
    check_kind::<ContentRule>(running, incoming, content_rules_compatible)?;
    check_kind::<StructureRule>(running, incoming, structure_rules_compatible)?;
    check_kind::<NameForm>(running, incoming, name_forms_compatible)?;
    Ok(())
}
