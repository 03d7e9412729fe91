mod common;

use common::{BrokenRepository, RecordingClient, event, manager, repository_with};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vmdir_types::SessionId;
use vmdir_watch::{
    DEFAULT_POLL_TIMEOUT, WatchError, WatchRequest, WatchSession, WatchSessionManager,
};

fn client() -> Arc<RecordingClient> {
    Arc::new(RecordingClient::default())
}

fn drain_ids(mgr: &WatchSessionManager) -> Vec<u64> {
    std::iter::from_fn(|| mgr.get_next_session())
        .map(|s| s.id().as_u64())
        .collect()
}

// ── Session creation ─────────────────────────────────────────────

#[test]
fn session_ids_start_at_zero() {
    let mgr = manager(repository_with(&[]));
    assert_eq!(mgr.add_new_session(WatchRequest::new(0), client()).unwrap(), SessionId::new(0));
    assert_eq!(mgr.add_new_session(WatchRequest::new(0), client()).unwrap(), SessionId::new(1));
    assert_eq!(mgr.active_len(), 2);
}

#[test]
fn cursor_is_seeded_from_repository() {
    let mgr = manager(repository_with(&[5, 7]));
    mgr.add_new_session(WatchRequest::new(6), client()).unwrap();
    mgr.add_new_session(WatchRequest::new(8), client()).unwrap();

    let first = mgr.get_next_session().unwrap();
    assert_eq!(first.cursor(), Some(7));
    assert_eq!(first.next_revision(), 7);

    let second = mgr.get_next_session().unwrap();
    assert_eq!(second.cursor(), None);
    assert_eq!(second.next_revision(), 8);
}

#[test]
fn repository_failure_rolls_back() {
    let mgr = WatchSessionManager::new(Arc::new(BrokenRepository));
    let err = mgr.add_new_session(WatchRequest::new(0), client()).unwrap_err();
    assert!(matches!(err, WatchError::Repository(_)));
    assert_eq!(mgr.active_len(), 0);
}

#[test]
fn concurrent_creation_assigns_unique_ids() {
    let mgr = Arc::new(manager(repository_with(&[1])));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mgr = Arc::clone(&mgr);
            thread::spawn(move || {
                (0..25)
                    .map(|_| mgr.add_new_session(WatchRequest::new(0), client()).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<SessionId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(ids.len(), 100);
    assert_eq!(ids.iter().map(|id| id.as_u64()).max(), Some(99));
}

// ── Dequeue ──────────────────────────────────────────────────────

#[test]
fn empty_queue_returns_none_after_timeout() {
    let mgr = manager(repository_with(&[]));
    assert!(mgr.get_next_session().is_none());
}

#[test]
fn default_poll_timeout_is_half_a_second() {
    let mgr = WatchSessionManager::new(repository_with(&[]));
    assert_eq!(mgr.poll_timeout(), DEFAULT_POLL_TIMEOUT);
    assert_eq!(DEFAULT_POLL_TIMEOUT, Duration::from_millis(500));
}

#[test]
fn sessions_come_back_in_fifo_order_skipping_deleted() {
    let mgr = manager(repository_with(&[]));
    for _ in 0..4 {
        mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    }
    mgr.delete_session(SessionId::new(1)).unwrap();
    mgr.delete_session(SessionId::new(3)).unwrap();

    assert_eq!(drain_ids(&mgr), vec![0, 2]);
    assert_eq!(mgr.deleted_len(), 0);
}

#[test]
fn requeued_sessions_keep_fifo_order() {
    let mgr = manager(repository_with(&[]));
    for _ in 0..3 {
        mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    }
    let s0 = mgr.get_next_session().unwrap();
    mgr.add_active_session(s0);

    assert_eq!(drain_ids(&mgr), vec![1, 2, 0]);
}

#[test]
fn deleting_an_unassigned_id_is_rejected() {
    let mgr = manager(repository_with(&[]));
    let err = mgr.delete_session(SessionId::new(0)).unwrap_err();
    assert!(matches!(err, WatchError::InvalidParameter(_)));
    assert_eq!(mgr.deleted_len(), 0);

    let id = mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    assert_eq!(id, SessionId::new(0));
    assert_eq!(mgr.get_next_session().map(|s| s.id()), Some(id));
}

#[test]
fn unassigned_ids_never_accumulate() {
    let mgr = manager(repository_with(&[]));
    mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    for raw in 1..1000 {
        assert!(mgr.delete_session(SessionId::new(raw)).is_err());
    }
    assert_eq!(mgr.deleted_len(), 0);
}

#[test]
fn forget_clears_a_pending_deletion() {
    let mgr = manager(repository_with(&[]));
    let id = mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    let session = mgr.get_next_session().unwrap();
    mgr.delete_session(id).unwrap();
    assert_eq!(mgr.deleted_len(), 1);

    drop(session);
    mgr.forget(id);
    assert_eq!(mgr.deleted_len(), 0);
    mgr.forget(id);
    assert_eq!(mgr.deleted_len(), 0);
}

// ── Inactive sessions ────────────────────────────────────────────

#[test]
fn activate_moves_inactive_sessions() {
    let mgr = manager(repository_with(&[]));
    let c = client();
    mgr.add_inactive_session(WatchSession::new(SessionId::new(10), WatchRequest::new(0), None, c.clone()));
    mgr.add_inactive_session(WatchSession::new(SessionId::new(11), WatchRequest::new(0), None, c));
    assert_eq!(mgr.inactive_len(), 2);
    assert!(mgr.get_next_session().is_none());

    assert_eq!(mgr.activate_sessions(), 2);
    assert_eq!(mgr.inactive_len(), 0);
    assert_eq!(drain_ids(&mgr), vec![10, 11]);
    assert_eq!(mgr.activate_sessions(), 0);
}

#[test]
fn deleted_inactive_session_is_reaped_after_activation() {
    let mgr = manager(repository_with(&[]));
    let id = mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    let session = mgr.get_next_session().unwrap();
    mgr.add_inactive_session(session);
    mgr.delete_session(id).unwrap();
    mgr.activate_sessions();
    assert!(mgr.get_next_session().is_none());
    assert_eq!(mgr.deleted_len(), 0);
}

#[test]
fn clear_drops_everything() {
    let mgr = manager(repository_with(&[]));
    mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    let parked = mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    let first = mgr.get_next_session().unwrap();
    mgr.add_active_session(first);
    let second = mgr.get_next_session().unwrap();
    assert_eq!(second.id(), parked);
    mgr.add_inactive_session(second);
    mgr.delete_session(parked).unwrap();

    mgr.clear();
    assert_eq!((mgr.active_len(), mgr.inactive_len(), mgr.deleted_len()), (0, 0, 0));
}

#[test]
fn blocked_consumer_wakes_for_new_session() {
    let mgr = Arc::new(
        WatchSessionManager::new(repository_with(&[])).with_poll_timeout(Duration::from_secs(5)),
    );
    let consumer = {
        let mgr = Arc::clone(&mgr);
        thread::spawn(move || mgr.get_next_session().map(|s| s.id()))
    };
    thread::sleep(Duration::from_millis(20));
    mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
    assert_eq!(consumer.join().unwrap(), Some(SessionId::new(0)));
}

// ── Sessions ─────────────────────────────────────────────────────

#[test]
fn session_filters_subtree_and_prev_value() {
    let c = client();
    let request = WatchRequest::new(0).with_subtree("cn=users,dc=example,dc=com");
    let mut session = WatchSession::new(SessionId::new(0), request, None, c.clone());

    assert!(session.wants(&event(1, "CN=alice, cn=Users,dc=example,dc=com")));
    assert!(!session.wants(&event(2, "cn=admins,dc=example,dc=com")));

    session.deliver(&event(1, "cn=alice,cn=users,dc=example,dc=com").with_prev_entry("old")).unwrap();
    let delivered = c.delivered.lock();
    assert_eq!(delivered[0].1.prev_entry, None);
    drop(delivered);

    session.advance_past(1);
    assert_eq!(session.next_revision(), 2);
}

#[test]
fn prev_value_is_kept_when_requested() {
    let c = client();
    let session = WatchSession::new(SessionId::new(0), WatchRequest::new(0).with_prev_value(), None, c.clone());
    session.deliver(&event(1, "cn=a").with_prev_entry("old")).unwrap();
    assert_eq!(c.delivered.lock()[0].1.prev_entry.as_deref(), Some("old"));
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn dequeue_order_is_enqueue_order_minus_deleted(deleted in prop::collection::vec(any::<bool>(), 0..12)) {
        let mgr = WatchSessionManager::new(repository_with(&[])).with_poll_timeout(Duration::ZERO);
        for _ in &deleted {
            mgr.add_new_session(WatchRequest::new(0), client()).unwrap();
        }
        for (i, _) in deleted.iter().enumerate().filter(|(_, d)| **d) {
            mgr.delete_session(SessionId::new(i as u64)).unwrap();
        }

        let expected: Vec<u64> = deleted
            .iter()
            .enumerate()
            .filter(|(_, d)| !**d)
            .map(|(i, _)| i as u64)
            .collect();
        prop_assert_eq!(drain_ids(&mgr), expected);
    }
}
