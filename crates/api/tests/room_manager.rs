//! Unit tests for `RoomManager`.
//!
//! These tests exercise the room membership table directly, without
//! performing any HTTP upgrades. They verify add/remove semantics, join and
//! leave behaviour, per-room delivery, the user-filtered operator send, and
//! graceful shutdown.

use assert_matches::assert_matches;
use axum::extract::ws::Message;

use ecuflow_api::ws::{job_room, RoomManager, OPERATOR_ROOM};

fn text(s: &str) -> Message {
    Message::Text(s.to_string().into())
}

fn as_text(msg: Message) -> String {
    match msg {
        Message::Text(t) => t.to_string(),
        other => panic!("expected Text frame, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Connection lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = RoomManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = RoomManager::new();

    let _rx = manager.add("conn-1".to_string(), 1).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn remove_unknown_id_is_noop() {
    let manager = RoomManager::new();

    let _rx = manager.add("conn-1".to_string(), 1).await;
    manager.remove("nonexistent").await;

    assert_eq!(manager.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Room membership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_and_leave_change_room_size() {
    let manager = RoomManager::new();
    let room = job_room(7);

    let _rx = manager.add("conn-1".to_string(), 1).await;
    assert_eq!(manager.room_size(&room).await, 0);

    manager.join("conn-1", &room).await;
    assert_eq!(manager.room_size(&room).await, 1);

    // Joining twice is idempotent.
    manager.join("conn-1", &room).await;
    assert_eq!(manager.room_size(&room).await, 1);

    manager.leave("conn-1", &room).await;
    assert_eq!(manager.room_size(&room).await, 0);
}

#[tokio::test]
async fn join_with_unknown_connection_is_ignored() {
    let manager = RoomManager::new();

    manager.join("ghost", &job_room(1)).await;

    assert_eq!(manager.room_size(&job_room(1)).await, 0);
}

#[tokio::test]
async fn leaving_a_room_never_joined_is_noop() {
    let manager = RoomManager::new();

    let _rx = manager.add("conn-1".to_string(), 1).await;
    manager.leave("conn-1", &job_room(1)).await;

    assert_eq!(manager.room_size(&job_room(1)).await, 0);
}

#[tokio::test]
async fn remove_drops_connection_from_all_rooms() {
    let manager = RoomManager::new();

    let _rx = manager.add("conn-1".to_string(), 1).await;
    manager.join("conn-1", &job_room(1)).await;
    manager.join("conn-1", &job_room(2)).await;
    manager.join("conn-1", OPERATOR_ROOM).await;

    manager.remove("conn-1").await;

    assert_eq!(manager.room_size(&job_room(1)).await, 0);
    assert_eq!(manager.room_size(&job_room(2)).await, 0);
    assert_eq!(manager.room_size(OPERATOR_ROOM).await, 0);
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_room_reaches_only_members() {
    let manager = RoomManager::new();
    let room = job_room(5);

    let mut member_rx = manager.add("member".to_string(), 1).await;
    let mut outsider_rx = manager.add("outsider".to_string(), 2).await;
    manager.join("member", &room).await;

    let delivered = manager.send_to_room(&room, text("hello")).await;
    assert_eq!(delivered, 1);

    assert_eq!(as_text(member_rx.recv().await.unwrap()), "hello");
    assert!(
        outsider_rx.try_recv().is_err(),
        "non-member must not receive room traffic"
    );
}

#[tokio::test]
async fn send_to_empty_room_drops_the_message() {
    let manager = RoomManager::new();

    let delivered = manager.send_to_room(&job_room(99), text("anyone?")).await;

    assert_eq!(delivered, 0);
}

/// Per-room delivery preserves emission order for each member.
#[tokio::test]
async fn room_delivery_preserves_order() {
    let manager = RoomManager::new();
    let room = job_room(3);

    let mut rx = manager.add("conn-1".to_string(), 1).await;
    manager.join("conn-1", &room).await;

    for i in 0..5 {
        manager.send_to_room(&room, text(&format!("event-{i}"))).await;
    }

    for i in 0..5 {
        assert_eq!(as_text(rx.recv().await.unwrap()), format!("event-{i}"));
    }
}

/// The user-filtered send skips members whose user id is not in the
/// eligible set, which is how a revoked operator stops receiving events
/// while still connected.
#[tokio::test]
async fn send_to_room_users_filters_by_user_id() {
    let manager = RoomManager::new();

    let mut current_rx = manager.add("current".to_string(), 10).await;
    let mut revoked_rx = manager.add("revoked".to_string(), 20).await;
    manager.join("current", OPERATOR_ROOM).await;
    manager.join("revoked", OPERATOR_ROOM).await;

    // Only user 10 is still an operator at emission time.
    let delivered = manager
        .send_to_room_users(OPERATOR_ROOM, &[10], text("new job"))
        .await;
    assert_eq!(delivered, 1);

    assert_eq!(as_text(current_rx.recv().await.unwrap()), "new job");
    assert!(
        revoked_rx.try_recv().is_err(),
        "revoked member must not receive operator traffic"
    );
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = RoomManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), 1).await;
    let mut rx2 = manager.add("conn-2".to_string(), 2).await;
    manager.join("conn-1", &job_room(1)).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert_eq!(manager.room_size(&job_room(1)).await, 0);

    assert_matches!(rx1.recv().await, Some(Message::Close(_)));
    assert_matches!(rx2.recv().await, Some(Message::Close(_)));
}
