mod common;

use common::{DIRECTORY_STRING, base_schema, strings};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use vmdir_schema::merge::{
    merge_attribute_type, merge_content_rule, merge_object_class, merge_schema,
};
use vmdir_schema::{
    AttributeType, ContentRule, LdapSchema, ObjectClass, ObjectClassKind, SchemaDefinitions,
    SchemaError,
};

// ── Attribute types ──────────────────────────────────────────────

#[test]
fn attribute_merge_ors_flags_and_keeps_description() {
    let old = AttributeType::new("2.5.4.3", "cn")
        .with_syntax(DIRECTORY_STRING)
        .with_desc("common name")
        .with_search_flags(0x1);
    let new = AttributeType::new("2.5.4.3", "cn")
        .with_syntax(DIRECTORY_STRING)
        .with_search_flags(0x2);

    let merged = merge_attribute_type(Some(&old), Some(&new)).unwrap();
    assert_eq!(merged.search_flags, 0x3);
    assert_eq!(merged.desc.as_deref(), Some("common name"));
}

#[test]
fn attribute_merge_prefers_new_description() {
    let old = AttributeType::new("1", "x").with_desc("old");
    let new = AttributeType::new("1", "x").with_desc("new");
    let merged = merge_attribute_type(Some(&old), Some(&new)).unwrap();
    assert_eq!(merged.desc.as_deref(), Some("new"));
}

#[test]
fn attribute_merge_unions_scopes_and_keeps_matching_rules() {
    let mut old = AttributeType::new("1", "uid").with_syntax(DIRECTORY_STRING);
    old.unique_scopes = strings(&["cn=users"]);
    old.equality = Some("caseIgnoreMatch".into());
    let mut new = AttributeType::new("1", "uid").with_syntax(DIRECTORY_STRING);
    new.unique_scopes = strings(&["CN=USERS", "cn=groups"]);
    new.equality = Some("caseExactMatch".into());

    let merged = merge_attribute_type(Some(&old), Some(&new)).unwrap();
    assert_eq!(merged.unique_scopes, strings(&["cn=users", "cn=groups"]));
    assert_eq!(merged.equality.as_deref(), Some("caseIgnoreMatch"));
}

#[test]
fn merge_with_one_side_returns_that_side() {
    let at = AttributeType::new("1", "x").with_syntax(DIRECTORY_STRING);
    assert_eq!(merge_attribute_type(Some(&at), None).unwrap(), at);
    assert_eq!(merge_attribute_type(None, Some(&at)).unwrap(), at);
}

#[test]
fn merge_with_neither_side_is_invalid() {
    let err = merge_object_class(None, None).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidParameter(_)));
}

// ── Classes and content rules ────────────────────────────────────

#[test]
fn class_merge_unions_may() {
    let old = ObjectClass::new("1", "c", ObjectClassKind::Structural)
        .with_sup("top")
        .with_may(["a", "b"])
        .with_desc("kept");
    let new = ObjectClass::new("1", "c", ObjectClassKind::Structural)
        .with_sup("top")
        .with_may(["B", "c"]);

    let merged = merge_object_class(Some(&old), Some(&new)).unwrap();
    assert_eq!(merged.may, strings(&["a", "b", "c"]));
    assert_eq!(merged.desc.as_deref(), Some("kept"));
}

#[test]
fn content_rule_merge_unions_may_and_aux() {
    let old = ContentRule::new("1", "person").with_aux(["x"]).with_may(["a"]);
    let new = ContentRule::new("1", "person").with_aux(["y"]).with_may(["b"]);
    let merged = merge_content_rule(Some(&old), Some(&new)).unwrap();
    assert_eq!(merged.aux, strings(&["x", "y"]));
    assert_eq!(merged.may, strings(&["a", "b"]));
}

// ── Whole schemas ────────────────────────────────────────────────

#[test]
fn schema_merge_applies_attribute_rules() {
    let mut old = base_schema();
    let cn = AttributeType::clone(old.attribute_type("cn").unwrap()).with_search_flags(0x1);
    old.add_attribute_type(cn).unwrap();

    let mut incoming = LdapSchema::new();
    let mut cn = AttributeType::clone(old.attribute_type("cn").unwrap());
    cn.desc = None;
    cn.search_flags = 0x2;
    incoming.add_attribute_type(cn).unwrap();

    let merged = merge_schema(&old, &incoming).unwrap();
    let cn = merged.attribute_type("cn").unwrap();
    assert_eq!(cn.search_flags, 0x3);
    assert_eq!(cn.desc.as_deref(), Some("common name"));
    // Inputs are untouched.
    assert_eq!(old.attribute_type("cn").unwrap().search_flags, 0x1);
    assert_eq!(incoming.attribute_type("cn").unwrap().search_flags, 0x2);
}

#[test]
fn schema_merge_adds_new_entities() {
    let old = base_schema();
    let mut incoming = LdapSchema::new();
    incoming
        .add_attribute_type(AttributeType::new("9.9.9.9", "badge").with_syntax(DIRECTORY_STRING))
        .unwrap();
    incoming
        .add_object_class(
            ObjectClass::new("9.9.9.10", "employee", ObjectClassKind::Structural)
                .with_sup("person")
                .with_may(["badge"]),
        )
        .unwrap();

    let merged = merge_schema(&old, &incoming).unwrap();
    assert_eq!(merged.len(), old.len() + 2);
    assert!(merged.object_class("employee").is_some());
}

#[test]
fn schema_merge_fails_verification_on_dangling_reference() {
    let old = base_schema();
    let mut incoming = LdapSchema::new();
    incoming
        .add_object_class(
            ObjectClass::new("9.9.9.11", "broken", ObjectClassKind::Structural)
                .with_sup("top")
                .with_must(["nosuchattr"]),
        )
        .unwrap();

    let err = merge_schema(&old, &incoming).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidSchema(ref m) if m.contains("nosuchattr")));
}

#[test]
fn merging_a_schema_with_itself_changes_nothing() {
    let schema = base_schema();
    assert_eq!(merge_schema(&schema, &schema).unwrap(), schema);
}

// ── Properties ───────────────────────────────────────────────────

fn attr_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,6}", 0..6)
}

proptest! {
    #[test]
    fn merged_may_contains_both_sides(old_may in attr_names(), new_may in attr_names()) {
        let old = ObjectClass::new("1", "c", ObjectClassKind::Auxiliary).with_may(old_may.clone());
        let new = ObjectClass::new("1", "c", ObjectClassKind::Auxiliary).with_may(new_may.clone());
        let merged = merge_object_class(Some(&old), Some(&new)).unwrap();
        for name in old_may.iter().chain(&new_may) {
            prop_assert!(merged.may.iter().any(|m| m.eq_ignore_ascii_case(name)));
        }
    }

    #[test]
    fn attribute_merge_is_idempotent(flags in 0u32..16, desc in proptest::option::of("[a-z ]{1,12}")) {
        let mut at = AttributeType::new("1", "x").with_syntax("1.1").with_search_flags(flags);
        at.desc = desc;
        let merged = merge_attribute_type(Some(&at), Some(&at)).unwrap();
        prop_assert_eq!(merged, at);
    }
}

fn generated_definitions() -> impl Strategy<Value = SchemaDefinitions> {
    (1usize..8, any::<bool>(), prop::collection::vec(any::<bool>(), 8)).prop_map(
        |(count, indexed, in_may)| {
            let mut defs = common::base_definitions();
            let mut may = Vec::new();
            for i in 0..count {
                defs.attribute_types.push(format!(
                    "( 7.7.7.{i} NAME 'gen{i}' SYNTAX {DIRECTORY_STRING} )"
                ));
                if in_may[i] {
                    may.push(format!("gen{i}"));
                }
            }
            let may = if may.is_empty() {
                String::new()
            } else {
                format!(" MAY ( {} )", may.join(" $ "))
            };
            defs.object_classes
                .push(format!("( 7.7.8.1 NAME 'generated' SUP top AUXILIARY{may} )"));
            if indexed {
                defs.indices.push("( NAME 'gen0' )".to_string());
            }
            defs
        },
    )
}

proptest! {
    #[test]
    fn generated_schema_merged_with_itself_is_unchanged(defs in generated_definitions()) {
        let mut schema = LdapSchema::new();
        schema.load_definitions(&defs).unwrap();
        prop_assert_eq!(merge_schema(&schema, &schema).unwrap(), schema);
    }
}
