use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;
use vmdir_types::{InvocationId, SessionId};

// ── InvocationId ─────────────────────────────────────────────────

#[test]
fn invocation_id_generate_is_unique() {
    let a = InvocationId::generate();
    let b = InvocationId::generate();
    assert_ne!(a, b);
}

#[test]
fn invocation_id_from_uuid_matches_display() {
    let uuid = uuid::Uuid::now_v7();
    let id = InvocationId::from_uuid(uuid);
    assert_eq!(id.to_string(), uuid.to_string());
}

#[test]
fn invocation_id_parse_trims() {
    let id = InvocationId::parse("  inv-1 ").unwrap();
    assert_eq!(id.as_str(), "inv-1");
}

#[test]
fn invocation_id_parse_empty_fails() {
    assert!(InvocationId::parse("").is_err());
    assert!(InvocationId::parse("   ").is_err());
}

#[test]
fn invocation_id_rejects_wire_delimiters() {
    assert!(InvocationId::parse("a:b").is_err());
    assert!(InvocationId::parse("a,b").is_err());
}

#[test]
fn invocation_id_from_str() {
    let id = InvocationId::from_str("inv-2").unwrap();
    assert_eq!(id.as_ref(), "inv-2");
}

#[test]
fn invocation_id_serde_roundtrip() {
    let id = InvocationId::parse("inv-3").unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"inv-3\"");
    let back: InvocationId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn invocation_id_serde_rejects_invalid() {
    let result: Result<InvocationId, _> = serde_json::from_str("\"\"");
    assert!(result.is_err());
}

#[test]
fn invocation_id_hash_and_eq() {
    let id = InvocationId::parse("inv-4").unwrap();
    let mut set = HashSet::new();
    set.insert(id.clone());
    set.insert(id);
    assert_eq!(set.len(), 1);
}

// ── SessionId ────────────────────────────────────────────────────

#[test]
fn session_id_next_is_monotonic() {
    let id = SessionId::new(0);
    assert_eq!(id.next(), SessionId::new(1));
    assert!(id < id.next());
}

#[test]
fn session_id_display() {
    assert_eq!(SessionId::from(42).to_string(), "42");
}

proptest! {
    #[test]
    fn invocation_id_display_parse_roundtrip(s in "[A-Za-z0-9-]{1,40}") {
        let id = InvocationId::parse(&s).unwrap();
        prop_assert_eq!(InvocationId::parse(&id.to_string()).unwrap(), id);
    }
}
