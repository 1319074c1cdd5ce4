pub mod auth;
pub mod health;
pub mod jobs;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                          WebSocket (token query param)
///
/// /auth/register               register (public)
/// /auth/login                  login (public)
/// /auth/refresh                refresh (public)
/// /auth/logout                 logout (requires auth)
///
/// /jobs                        list, submit (GET, POST)
/// /jobs/{id}                   get, edit (GET, PATCH)
/// /jobs/{id}/complete          complete job (POST, operator)
/// /jobs/{id}/cancel            cancel job (POST, operator)
/// /jobs/{id}/message           set operator message (PUT, operator)
/// /jobs/{id}/messages          thread: list, post (GET, POST)
/// /jobs/{id}/problems          reports: list, file (GET, POST)
/// /jobs/{id}/problems/resolve  resolve open report (POST, operator)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Authentication routes (register, login, refresh, logout).
        .nest("/auth", auth::router())
        // Job lifecycle, message threads, and problem reports.
        .nest("/jobs", jobs::router())
}
