use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use ecuflow_core::types::{DbId, Timestamp};

/// The shared room receiving every system-wide operator notification
/// (new jobs, problem reports).
pub const OPERATOR_ROOM: &str = "operator";

/// The per-job room name, e.g. `job:17`.
pub fn job_room(job_id: DbId) -> String {
    format!("job:{job_id}")
}

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct RoomConnection {
    /// Authenticated user ID. Connections are registered only after token
    /// validation, so this is always present.
    pub user_id: DbId,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Room membership and connection manager.
///
/// The one structure genuinely shared across concurrent connections:
/// thread-safe via interior `RwLock`, created once at process start,
/// wrapped in `Arc`, and injected through `AppState`. Membership is mutated
/// only by the owning connection's handler task (join/leave/disconnect);
/// emitters take the read lock.
pub struct RoomManager {
    connections: RwLock<HashMap<String, RoomConnection>>,
    /// Room name -> set of member connection IDs.
    rooms: RwLock<HashMap<String, HashSet<String>>>,
}

impl RoomManager {
    /// Create a new, empty manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new authenticated connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink. The connection starts with
    /// no room memberships.
    pub async fn add(&self, conn_id: String, user_id: DbId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = RoomConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection and drop it from every room it joined.
    ///
    /// Disconnect has no further side effects: job, message, and report
    /// state are untouched.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);

        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(conn_id);
            !members.is_empty()
        });
    }

    /// Add a connection to a room. Unknown connection IDs are ignored.
    pub async fn join(&self, conn_id: &str, room: &str) {
        if !self.connections.read().await.contains_key(conn_id) {
            return;
        }
        self.rooms
            .write()
            .await
            .entry(room.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    /// Remove a connection from a room. Leaving a room it never joined is
    /// a no-op.
    pub async fn leave(&self, conn_id: &str, room: &str) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room) {
            members.remove(conn_id);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    /// Send a message to every connection currently in a room.
    ///
    /// An empty or missing room drops the message silently; connections
    /// whose send channels are closed are skipped (they will be cleaned up
    /// by their own receive loop). Returns the number of connections the
    /// message was sent to.
    pub async fn send_to_room(&self, room: &str, message: Message) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };

        let conns = self.connections.read().await;
        let mut count = 0;
        for conn_id in members {
            if let Some(conn) = conns.get(conn_id) {
                if conn.sender.send(message.clone()).is_ok() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Send a message to the room members whose user IDs appear in `user_ids`.
    ///
    /// Used for the operator room, where eligibility is re-checked against
    /// the database per emission rather than trusted from join time; a
    /// member whose role was revoked since joining is silently skipped.
    pub async fn send_to_room_users(
        &self,
        room: &str,
        user_ids: &[DbId],
        message: Message,
    ) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };

        let conns = self.connections.read().await;
        let mut count = 0;
        for conn_id in members {
            if let Some(conn) = conns.get(conn_id) {
                if user_ids.contains(&conn.user_id)
                    && conn.sender.send(message.clone()).is_ok()
                {
                    count += 1;
                }
            }
        }
        count
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Return the current number of members in a room.
    pub async fn room_size(&self, room: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(room)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Send a Close frame to every connection, then clear all state.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        self.rooms.write().await.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
