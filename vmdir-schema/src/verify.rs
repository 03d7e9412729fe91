//! Structural verification of schema entities against a store.
//!
//! Verification does not stop at the first problem. Every violation is
//! logged and the last one is returned, so one run surfaces everything an
//! operator needs to fix.

use crate::attribute_type::AttributeType;
use crate::content_rule::ContentRule;
use crate::entity::EntityKind;
use crate::error::{SchemaError, SchemaResult};
use crate::index::IndexDefinition;
use crate::name_form::NameForm;
use crate::names;
use crate::object_class::{ObjectClass, ObjectClassKind};
use crate::store::LdapSchema;
use crate::structure_rule::StructureRule;
use std::collections::HashSet;
use tracing::{debug, error};

/// Collects violations, remembering only the most recent.
#[derive(Debug, Default)]
struct Violations {
    last: Option<SchemaError>,
}

impl Violations {
    fn report(&mut self, kind: EntityKind, entity: &str, problem: impl Into<String>) {
        let problem = problem.into();
        error!(%kind, entity, %problem, "schema verification failed");
        self.last = Some(SchemaError::invalid(format!("{kind} {entity}: {problem}")));
    }

    fn absorb(&mut self, result: SchemaResult<()>) {
        if let Err(e) = result {
            self.last = Some(e);
        }
    }

    fn finish(self) -> SchemaResult<()> {
        self.last.map_or(Ok(()), Err)
    }
}

fn check_attributes(
    schema: &LdapSchema,
    v: &mut Violations,
    kind: EntityKind,
    entity: &str,
    list: &str,
    attrs: &[String],
) {
    for attr in attrs {
        if schema.attribute_type(attr).is_none() {
            v.report(kind, entity, format!("{list} attribute {attr} is not defined"));
        }
    }
}

pub fn verify_attribute_type(schema: &LdapSchema, at: &AttributeType) -> SchemaResult<()> {
    let kind = EntityKind::AttributeType;
    let mut v = Violations::default();

    if at.name.is_empty() {
        v.report(kind, &at.oid, "missing NAME");
    }
    if at.oid.is_empty() {
        v.report(kind, &at.name, "missing OID");
    }
    if at.syntax_oid.as_deref().is_none_or(str::is_empty) {
        v.report(kind, &at.name, "missing SYNTAX");
    }
    if let Some(sup) = &at.sup {
        if schema.attribute_type(sup).is_none() {
            v.report(kind, &at.name, format!("superior {sup} is not defined"));
        }
    }

    v.finish()
}

pub fn verify_object_class(schema: &LdapSchema, oc: &ObjectClass) -> SchemaResult<()> {
    let kind = EntityKind::ObjectClass;
    let mut v = Violations::default();
    let name = oc.name.as_str();

    if name.is_empty() {
        v.report(kind, &oc.oid, "missing NAME");
    }
    if oc.oid.is_empty() {
        v.report(kind, name, "missing OID");
    }

    match &oc.sup {
        None if !oc.is_top() => v.report(kind, name, "missing SUP"),
        None => {}
        Some(sup) => match schema.object_class(sup) {
            None => v.report(kind, name, format!("superclass {sup} is not defined")),
            Some(parent) => {
                let allowed = match oc.kind {
                    ObjectClassKind::Structural => parent.kind != ObjectClassKind::Auxiliary,
                    ObjectClassKind::Auxiliary => parent.kind != ObjectClassKind::Structural,
                    ObjectClassKind::Abstract => parent.kind == ObjectClassKind::Abstract,
                };
                if !allowed {
                    v.report(
                        kind,
                        name,
                        format!(
                            "{:?} class may not inherit from {:?} class {sup}",
                            oc.kind, parent.kind
                        ),
                    );
                }
            }
        },
    }

    check_attributes(schema, &mut v, kind, name, "MUST", &oc.must);
    check_attributes(schema, &mut v, kind, name, "MAY", &oc.may);

    v.finish()
}

pub fn verify_content_rule(schema: &LdapSchema, cr: &ContentRule) -> SchemaResult<()> {
    let kind = EntityKind::ContentRule;
    let mut v = Violations::default();
    let name = cr.name.as_str();

    match schema.object_class(name) {
        Some(oc) if oc.kind == ObjectClassKind::Structural => {}
        Some(_) => v.report(kind, name, "does not name a structural class"),
        None => v.report(kind, name, "names no defined class"),
    }

    for aux in &cr.aux {
        match schema.object_class(aux) {
            Some(oc) if oc.kind == ObjectClassKind::Auxiliary => {}
            Some(_) => v.report(kind, name, format!("AUX class {aux} is not auxiliary")),
            None => v.report(kind, name, format!("AUX class {aux} is not defined")),
        }
    }

    check_attributes(schema, &mut v, kind, name, "MUST", &cr.must);
    check_attributes(schema, &mut v, kind, name, "MAY", &cr.may);
    check_attributes(schema, &mut v, kind, name, "NOT", &cr.not);

    v.finish()
}

pub fn verify_structure_rule(schema: &LdapSchema, sr: &StructureRule) -> SchemaResult<()> {
    let kind = EntityKind::StructureRule;
    let mut v = Violations::default();
    let name = sr.name.as_str();

    if schema.name_form(&sr.form).is_none() {
        v.report(kind, name, format!("name form {} is not defined", sr.form));
    }
    for sup in &sr.sup {
        if schema.structure_rule_by_id(sup).is_none() {
            v.report(kind, name, format!("superior rule {sup} is not defined"));
        }
    }

    v.finish()
}

pub fn verify_name_form(schema: &LdapSchema, nf: &NameForm) -> SchemaResult<()> {
    let kind = EntityKind::NameForm;
    let mut v = Violations::default();
    let name = nf.name.as_str();

    match schema.object_class(&nf.oc) {
        Some(oc) if oc.kind == ObjectClassKind::Structural => {}
        Some(_) => v.report(kind, name, format!("class {} is not structural", nf.oc)),
        None => v.report(kind, name, format!("class {} is not defined", nf.oc)),
    }
    check_attributes(schema, &mut v, kind, name, "MUST", &nf.must);
    check_attributes(schema, &mut v, kind, name, "MAY", &nf.may);

    v.finish()
}

pub fn verify_index(schema: &LdapSchema, index: &IndexDefinition) -> SchemaResult<()> {
    if schema.attribute_type(&index.attribute).is_none() {
        let mut v = Violations::default();
        v.report(
            EntityKind::AttributeType,
            &index.attribute,
            "index declared on an undefined attribute",
        );
        return v.finish();
    }
    Ok(())
}

/// Fills in `SYNTAX` for attribute types that only name a superior,
/// following the `SUP` chain.
pub fn resolve_attribute_types(schema: &mut LdapSchema) -> SchemaResult<()> {
    let mut resolved: Vec<AttributeType> = Vec::new();

    for at in schema.entities::<AttributeType>() {
        if at.syntax_oid.is_some() || at.sup.is_none() {
            continue;
        }
        if let Some(syntax) = inherited_syntax(schema, at)? {
            let mut fixed = AttributeType::clone(at);
            fixed.syntax_oid = Some(syntax);
            resolved.push(fixed);
        }
    }

    for at in resolved {
        debug!(attribute = %at.name, syntax = ?at.syntax_oid, "inherited syntax");
        schema.add_attribute_type(at)?;
    }
    Ok(())
}

fn inherited_syntax(schema: &LdapSchema, at: &AttributeType) -> SchemaResult<Option<String>> {
    let mut seen: HashSet<String> = HashSet::from([names::key(&at.name)]);
    let mut current = at.sup.clone();

    while let Some(sup) = current {
        if !seen.insert(names::key(&sup)) {
            return Err(SchemaError::invalid(format!(
                "attribute type {} has a cyclic SUP chain through {sup}",
                at.name
            )));
        }
        let Some(parent) = schema.attribute_type(&sup) else {
            return Ok(None);
        };
        if parent.syntax_oid.is_some() {
            return Ok(parent.syntax_oid.clone());
        }
        current = parent.sup.clone();
    }
    Ok(None)
}

/// Resolves inherited syntax, then verifies every entity and index
/// declaration. Fails if any single check failed.
pub fn resolve_and_verify_all(schema: &mut LdapSchema) -> SchemaResult<()> {
    resolve_attribute_types(schema)?;

    let mut v = Violations::default();
    let schema: &LdapSchema = schema;

    for at in schema.entities::<AttributeType>() {
        v.absorb(verify_attribute_type(schema, at));
    }
    for oc in schema.entities::<ObjectClass>() {
        v.absorb(verify_object_class(schema, oc));
    }
    for cr in schema.entities::<ContentRule>() {
        v.absorb(verify_content_rule(schema, cr));
    }
    for sr in schema.entities::<StructureRule>() {
        v.absorb(verify_structure_rule(schema, sr));
    }
    for nf in schema.entities::<NameForm>() {
        v.absorb(verify_name_form(schema, nf));
    }
    for index in schema.indices() {
        v.absorb(verify_index(schema, index));
    }

    v.finish()
}
