//! Event-to-room routing engine.
//!
//! [`EventDispatcher`] consumes the event bus on a single task, in publish
//! order, and forwards each event to the matching room. Because handlers
//! publish after their mutation commits and this loop processes events one
//! at a time, delivery order within any room matches commit order. No
//! ordering holds across rooms, and delivery is at-most-once: an empty room
//! drops the event.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;

use ecuflow_core::roles::ROLE_OPERATOR;
use ecuflow_db::repositories::UserRepo;
use ecuflow_db::DbPool;
use ecuflow_events::bus::{
    DomainEvent, EVENT_JOB_CANCELLED, EVENT_JOB_COMPLETED, EVENT_JOB_CREATED, EVENT_JOB_MESSAGE,
    EVENT_PROBLEM_FILED, EVENT_PROBLEM_RESOLVED,
};

use crate::ws::{job_room, RoomManager, OPERATOR_ROOM};

/// Routes domain events to WebSocket rooms.
pub struct EventDispatcher {
    pool: DbPool,
    rooms: Arc<RoomManager>,
}

impl EventDispatcher {
    /// Create a new dispatcher with the given database pool and room manager.
    pub fn new(pool: DbPool, rooms: Arc<RoomManager>) -> Self {
        Self { pool, rooms }
    }

    /// Run the main routing loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](ecuflow_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver a single event to its room.
    ///
    /// Fan-out failures never propagate anywhere; the persisted row is the
    /// recovery path for clients that missed the event.
    async fn route_event(&self, event: &DomainEvent) {
        let msg = client_message(event);

        match event.event_type.as_str() {
            // System-wide operator notifications.
            EVENT_JOB_CREATED | EVENT_PROBLEM_FILED | EVENT_PROBLEM_RESOLVED => {
                self.send_to_operators(event, msg).await;
            }

            // Job-scoped status and message events.
            EVENT_JOB_COMPLETED | EVENT_JOB_CANCELLED | EVENT_JOB_MESSAGE => {
                let Some(job_id) = event.job_id else {
                    tracing::warn!(event_type = %event.event_type, "Job event without job id");
                    return;
                };
                let delivered = self.rooms.send_to_room(&job_room(job_id), msg).await;
                tracing::debug!(
                    event_type = %event.event_type,
                    job_id,
                    delivered,
                    "Routed job event"
                );
            }

            other => {
                tracing::debug!(event_type = other, "No room route for event type");
            }
        }
    }

    /// Deliver to the operator room, filtered by the current operator set.
    ///
    /// The operator user-id set is re-queried per emission rather than
    /// trusted from join time, so a role downgrade stops deliveries at the
    /// next event even for a still-connected session.
    async fn send_to_operators(&self, event: &DomainEvent, msg: Message) {
        let operator_ids = match UserRepo::list_active_ids_by_role(&self.pool, ROLE_OPERATOR).await
        {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(
                    event_type = %event.event_type,
                    error = %e,
                    "Failed to resolve operator set, dropping event"
                );
                return;
            }
        };

        let delivered = self
            .rooms
            .send_to_room_users(OPERATOR_ROOM, &operator_ids, msg)
            .await;
        tracing::debug!(
            event_type = %event.event_type,
            delivered,
            "Routed operator event"
        );
    }
}

/// Serialize an event into the frame clients receive.
fn client_message(event: &DomainEvent) -> Message {
    let frame = serde_json::json!({
        "type": event.event_type,
        "job_id": event.job_id,
        "actor_display_name": event.actor_display_name,
        "payload": event.payload,
        "timestamp": event.timestamp,
    });
    Message::Text(frame.to_string().into())
}
