use std::sync::Arc;

use crate::config::ServerConfig;
use crate::ws::RoomManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// The room membership table lives here rather than in any process-global,
/// so handlers and background tasks receive it explicitly.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: ecuflow_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket room membership and connection manager.
    pub rooms: Arc<RoomManager>,
    /// Centralized event bus for publishing domain events.
    pub event_bus: Arc<ecuflow_events::EventBus>,
}
