//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams domain events to subscribers.
//! The platform adapter registers with `register_adapter`; it alone
//! receives platform requests and answers each with an `ack`.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
