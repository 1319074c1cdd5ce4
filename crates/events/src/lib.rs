//! Ecuflow event bus and delivery infrastructure.
//!
//! Building blocks for the real-time fan-out layer:
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`] — the canonical domain event envelope.
//! - [`delivery`] — the outbound push-notification sink (fire-and-forget).
//!
//! Delivery is at-most-once with no persistence or replay: subscribers that
//! are absent when an event is published never see it, and clients are
//! expected to reconcile through the synchronous read APIs on reconnect.

pub mod bus;
pub mod delivery;

pub use bus::{DomainEvent, EventBus};
pub use delivery::push::PushSink;
