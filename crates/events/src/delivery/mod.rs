//! Outbound delivery channels.
//!
//! Currently a single channel: the push-notification webhook sink.

pub mod push;
