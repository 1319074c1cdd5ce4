//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`DomainEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.
//! Handlers publish exactly zero or one event per committed mutation, after
//! the commit, so subscriber delivery order within a single receiver matches
//! commit order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use ecuflow_core::types::DbId;

// ---------------------------------------------------------------------------
// Event type names
// ---------------------------------------------------------------------------

/// A requester submitted a new job.
pub const EVENT_JOB_CREATED: &str = "job.created";

/// The operator completed a job.
pub const EVENT_JOB_COMPLETED: &str = "job.completed";

/// The operator cancelled a job.
pub const EVENT_JOB_CANCELLED: &str = "job.cancelled";

/// A message was posted to a job's thread.
pub const EVENT_JOB_MESSAGE: &str = "job.message";

/// A requester filed a problem report against a completed job.
pub const EVENT_PROBLEM_FILED: &str = "problem.filed";

/// The operator resolved a job's open problem report.
pub const EVENT_PROBLEM_RESOLVED: &str = "problem.resolved";

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred on the service.
///
/// Constructed via [`DomainEvent::new`] and enriched with the builder
/// methods [`with_job`](DomainEvent::with_job),
/// [`with_actor`](DomainEvent::with_actor), and
/// [`with_payload`](DomainEvent::with_payload).
///
/// Payloads carry identifiers and the minimal denormalized fields a client
/// needs to render the event without a follow-up fetch -- never credentials
/// and never full option sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"job.created"`.
    pub event_type: String,

    /// The job the event concerns, when there is one.
    pub job_id: Option<DbId>,

    /// Id of the user whose action produced the event.
    pub actor_user_id: Option<DbId>,

    /// Display name of the acting user, denormalized for client rendering.
    pub actor_display_name: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Create a new event with only the required `event_type`.
    ///
    /// All optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            job_id: None,
            actor_user_id: None,
            actor_display_name: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the subject job to the event.
    pub fn with_job(mut self, job_id: DbId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId, display_name: impl Into<String>) -> Self {
        self.actor_user_id = Some(user_id);
        self.actor_display_name = Some(display_name.into());
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`DomainEvent`].
///
/// # Usage
///
/// ```rust
/// use ecuflow_events::bus::{DomainEvent, EventBus, EVENT_JOB_CREATED};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DomainEvent::new(EVENT_JOB_CREATED).with_job(1));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// persisted rows remain the recovery path for absent clients.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
