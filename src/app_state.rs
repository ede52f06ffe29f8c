//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::platform::{AdapterHub, MemberDirectory};
use crate::service::VzpService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event service for all business logic.
    pub vzp_service: Arc<VzpService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Member directory fed by the platform adapter.
    pub directory: Arc<MemberDirectory>,
    /// Routes platform requests to the registered adapter connection.
    pub adapter: Arc<AdapterHub>,
}
