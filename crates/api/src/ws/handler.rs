use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use ecuflow_core::policy::{authorize, Actor, JobOperation, JobTarget};
use ecuflow_core::roles::ROLE_OPERATOR;
use ecuflow_core::types::DbId;
use ecuflow_db::repositories::TuningJobRepo;

use crate::auth::jwt::validate_token;
use crate::state::AppState;
use crate::ws::manager::{job_room, OPERATOR_ROOM};

/// Query parameters for the WebSocket upgrade. Browsers cannot set an
/// `Authorization` header on an upgrade request, so the access token is
/// passed as a query parameter instead.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Inbound client frames: join or leave a job room.
///
/// Anything else (unknown types, malformed JSON) is ignored; the socket
/// carries no other client-to-server traffic.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Join { job_id: DbId },
    Leave { job_id: DbId },
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The access token is validated before the upgrade is honored; an
/// unauthenticated upgrade attempt is rejected with 401 and never reaches
/// the room manager.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let claims = match validate_token(&query.token, &state.config.jwt) {
        Ok(claims) => claims,
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, claims.sub, claims.role))
        .into_response()
}

/// Manage a single authenticated WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `RoomManager`.
///   2. Joins operators to the shared operator room.
///   3. Spawns a sender task that forwards messages from the manager channel.
///   4. Processes inbound join/leave frames on the current task.
///   5. Cleans up on disconnect (removal from every room, nothing else).
async fn handle_socket(socket: WebSocket, state: AppState, user_id: DbId, role: String) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = state.rooms.add(conn_id.clone(), user_id).await;

    // Operators receive system-wide notifications. Membership alone does
    // not grant delivery: the dispatcher re-checks the role per event.
    if role == ROLE_OPERATOR {
        state.rooms.join(&conn_id, OPERATOR_ROOM).await;
    }

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound frames.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                if let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) {
                    handle_frame(&state, &conn_id, user_id, &role, frame).await;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    state.rooms.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Apply a join/leave frame.
///
/// A join is admitted only after re-checking eligibility (owner or
/// operator) against a freshly fetched job row. An ineligible or unknown
/// job silently has no effect: room membership carries no payload that a
/// later authorized read would not equally deny.
async fn handle_frame(
    state: &AppState,
    conn_id: &str,
    user_id: DbId,
    role: &str,
    frame: ClientFrame,
) {
    match frame {
        ClientFrame::Join { job_id } => {
            let job = match TuningJobRepo::find_by_id(&state.pool, job_id).await {
                Ok(Some(job)) => job,
                Ok(None) => return,
                Err(e) => {
                    tracing::error!(job_id, error = %e, "Room join lookup failed");
                    return;
                }
            };

            let actor = Actor { user_id, role };
            let target = JobTarget {
                job_id: job.id,
                owner_id: job.owner_id,
            };
            if authorize(&actor, JobOperation::JoinRoom, target).is_ok() {
                state.rooms.join(conn_id, &job_room(job_id)).await;
                tracing::debug!(conn_id = %conn_id, job_id, "Joined job room");
            }
        }
        ClientFrame::Leave { job_id } => {
            state.rooms.leave(conn_id, &job_room(job_id)).await;
        }
    }
}
