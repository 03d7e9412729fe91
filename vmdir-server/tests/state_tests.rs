mod common;

use common::{RecordingClient, config_with_schema, event, schema_file, state};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use vmdir_schema::{LdapSchema, SchemaDefinitions, SchemaError};
use vmdir_server::{
    DirectoryServerState, RequestContext, SchemaHandle, ServerConfig, ServerError,
};
use vmdir_watch::WatchRequest;

fn ctx() -> RequestContext {
    RequestContext::new("test")
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn loads_configured_schema() {
    let state = state();
    let schema = state.schema();
    assert!(schema.attribute_type("commonName").is_some());
    assert!(schema.object_class("person").is_some());
    assert_eq!(state.invocation_id().as_str(), "local-dc");
    assert_eq!(state.indices().len(), 1);
}

#[test]
fn generates_invocation_id_when_absent() {
    let state = DirectoryServerState::new(&ServerConfig::default()).unwrap();
    assert!(!state.invocation_id().as_str().is_empty());
    assert!(state.schema().is_empty());
}

#[test]
fn rejects_bad_invocation_id() {
    let config = ServerConfig {
        invocation_id: Some("a:b".into()),
        ..Default::default()
    };
    assert!(matches!(
        DirectoryServerState::new(&config),
        Err(ServerError::Config(_))
    ));
}

#[test]
fn missing_schema_file_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        schema_file: Some(dir.path().join("none.schema")),
        ..Default::default()
    };
    assert!(matches!(
        DirectoryServerState::new(&config),
        Err(ServerError::Schema(_))
    ));
}

// ── Schema upgrade ───────────────────────────────────────────────

#[test]
fn upgrade_publishes_merged_schema() {
    let state = state();
    let before = state.schema();
    let defs = SchemaDefinitions {
        attribute_types: vec![
            "( 9.9.9.9 NAME 'badgeNumber' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )".into(),
        ],
        object_classes: vec![
            "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST cn MAY ( description $ badgeNumber ) )"
                .into(),
        ],
        ..Default::default()
    };

    let after = state.upgrade_schema(&ctx(), &defs).unwrap();

    assert!(Arc::ptr_eq(&after, &state.schema()));
    let person = after.object_class("person").unwrap();
    assert!(person.may.iter().any(|a| a == "description"));
    assert!(person.may.iter().any(|a| a == "badgeNumber"));
    // Snapshots taken before the upgrade are untouched.
    assert!(before.attribute_type("badgeNumber").is_none());
}

#[test]
fn incompatible_upgrade_keeps_running_schema() {
    let state = state();
    let before = state.schema();
    let defs = SchemaDefinitions {
        attribute_types: vec![
            "( 1.2.840.113556.1.4.221 NAME 'sAMAccountName' \
             SYNTAX 1.3.6.1.4.1.1466.115.121.1.27 SINGLE-VALUE )"
                .into(),
        ],
        ..Default::default()
    };

    let err = state.upgrade_schema(&ctx(), &defs).unwrap_err();

    assert!(matches!(err, ServerError::Schema(SchemaError::NotCompatible { .. })));
    assert!(Arc::ptr_eq(&before, &state.schema()));
}

#[test]
fn unverifiable_upgrade_keeps_running_schema() {
    let state = state();
    let before = state.schema();
    let defs = SchemaDefinitions {
        object_classes: vec!["( 9.9.9.10 NAME 'device' SUP top STRUCTURAL MUST serial )".into()],
        ..Default::default()
    };

    assert!(state.upgrade_schema(&ctx(), &defs).is_err());
    assert!(Arc::ptr_eq(&before, &state.schema()));
}

#[test]
fn preview_reports_operations_without_publishing() {
    let state = state();
    let before = state.schema();
    let defs = SchemaDefinitions {
        attribute_types: vec![
            "( 9.9.9.9 NAME 'badgeNumber' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )".into(),
        ],
        ..Default::default()
    };

    let diff = state.preview_schema_upgrade(&ctx(), &defs).unwrap();

    assert_eq!(diff.attr_to_add.len(), 1);
    assert_eq!(diff.attr_to_add[0].cn, "badgeNumber");
    assert!(diff.class_to_add.is_empty());
    assert!(Arc::ptr_eq(&before, &state.schema()));
}

#[test]
fn schema_handle_publish_returns_previous() {
    let handle = SchemaHandle::default();
    let old = handle.snapshot();
    let returned = handle.publish(Arc::new(LdapSchema::new()));
    assert!(Arc::ptr_eq(&old, &returned));
    assert!(!Arc::ptr_eq(&old, &handle.snapshot()));
}

// ── Replication ──────────────────────────────────────────────────

#[test]
fn applied_usns_update_utd_vector() {
    let state = state();
    assert_eq!(state.usn_needed_from("dc-2"), 0);

    state.record_applied_usn(&ctx(), "dc-2", 100).unwrap();
    state.record_applied_usn(&ctx(), "dc-3", 7).unwrap();

    assert_eq!(state.usn_needed_from("dc-2"), 101);
    assert_eq!(state.utd_vector().serialized(), "dc-2:100,dc-3:7,");
    assert!(state.record_applied_usn(&ctx(), "", 1).is_err());
}

// ── Watch and status ─────────────────────────────────────────────

#[test]
fn publish_change_wakes_parked_sessions() {
    let state = state();
    let client = Arc::new(RecordingClient::default());
    let id = state
        .open_watch(&ctx(), WatchRequest::new(0), client)
        .unwrap();
    let session = state.watch_sessions().get_next_session().unwrap();
    assert_eq!(session.id(), id);
    state.watch_sessions().add_inactive_session(session);

    state.publish_change(event(1, "cn=a,dc=example,dc=com"));

    assert_eq!(state.watch_sessions().active_len(), 1);
    assert_eq!(state.watch_sessions().inactive_len(), 0);
}

#[test]
fn status_serializes_to_json() {
    let file = schema_file();
    let state = DirectoryServerState::new(&config_with_schema(&file)).unwrap();
    state.record_applied_usn(&ctx(), "dc-2", 5).unwrap();
    state.publish_change(event(3, "cn=a,dc=example,dc=com"));

    let status = state.status();
    assert_eq!(status.invocation_id, "local-dc");
    assert_eq!(status.utd_vector, "dc-2:5,");
    assert_eq!(status.latest_revision, Some(3));
    assert_eq!(status.schema_indices, 1);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["utd_vector"], "dc-2:5,");
    assert_eq!(json["active_sessions"], 0);
}

#[test]
fn request_contexts_get_distinct_ids() {
    let a = RequestContext::new("upgrade");
    let b = RequestContext::new("upgrade");
    assert_ne!(a.request_id(), b.request_id());
    assert_eq!(a.operation(), "upgrade");
    assert_eq!(a.in_scope(|| 7), 7);
}

#[test]
fn upgrade_dropping_may_attribute_is_rejected() {
    let state = state();
    let defs = SchemaDefinitions {
        object_classes: vec!["( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST cn )".into()],
        ..Default::default()
    };
    assert!(matches!(
        state.upgrade_schema(&ctx(), &defs),
        Err(ServerError::Schema(SchemaError::NotCompatible { .. }))
    ));
    assert!(state.schema().object_class("person").unwrap().may.iter().any(|a| a == "description"));
}
