//! Fire-and-forget push-notification sink.
//!
//! [`PushSink`] forwards selected [`DomainEvent`]s to an external bridge
//! URL via HTTP POST. Delivery is a single attempt with a short timeout:
//! a failure is logged at warn level and swallowed. The sink never blocks
//! or retries, and nothing in the requester/operator flow can observe a
//! sink failure.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::bus::{
    DomainEvent, EVENT_JOB_CREATED, EVENT_JOB_MESSAGE, EVENT_PROBLEM_FILED,
    EVENT_PROBLEM_RESOLVED,
};

/// HTTP request timeout for a delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Event types forwarded to the push bridge.
const PUSH_EVENT_TYPES: [&str; 4] = [
    EVENT_JOB_CREATED,
    EVENT_JOB_MESSAGE,
    EVENT_PROBLEM_FILED,
    EVENT_PROBLEM_RESOLVED,
];

/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The bridge returned a non-2xx status code.
    #[error("Push bridge returned HTTP {0}")]
    HttpStatus(u16),
}

/// Delivers domain events to the external push-notification bridge.
pub struct PushSink {
    client: reqwest::Client,
    url: String,
}

impl PushSink {
    /// Create a new sink targeting the given bridge URL.
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            url: url.into(),
        }
    }

    /// Consume the bus receiver, forwarding push-worthy events until the
    /// channel closes.
    ///
    /// Failures are logged and dropped; a lagged receiver skips the missed
    /// events rather than stalling, since the sink carries no correctness
    /// weight.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if !PUSH_EVENT_TYPES.contains(&event.event_type.as_str()) {
                        continue;
                    }
                    if let Err(e) = self.deliver(&event).await {
                        tracing::warn!(
                            event_type = %event.event_type,
                            error = %e,
                            "Push delivery failed, dropping event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Push sink lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, push sink shutting down");
                    break;
                }
            }
        }
    }

    /// Execute a single POST to the bridge and check the response status.
    async fn deliver(&self, event: &DomainEvent) -> Result<(), PushError> {
        let payload = serde_json::json!({
            "event_type": event.event_type,
            "job_id": event.job_id,
            "actor_display_name": event.actor_display_name,
            "payload": event.payload,
            "timestamp": event.timestamp,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
