//! # vzp-gateway
//!
//! REST API and WebSocket gateway managing VZP sign-up events for a
//! gaming community: creation, tier-gated sign-ups, list locking, player
//! swaps, start with temporary voice and text channels, and close with an
//! archived result.
//!
//! The chat platform is reached only through the collaborator traits in
//! [`platform`]. The bundled implementation publishes outbound requests
//! (post refreshes, DMs, channel management) on the event bus, where the
//! platform adapter picks them up over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Platform adapter (HTTP commands, WebSocket feed)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── VzpService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── VzpStore (domain/)
//!     ├── Renderer (render/)
//!     ├── Collaborators (platform/)
//!     │
//!     └── JSON snapshots (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod render;
pub mod service;
pub mod ws;
