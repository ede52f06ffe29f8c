//! REST endpoint handlers organized by resource.

pub mod member;
pub mod roster;
pub mod system;
pub mod vzp;

use axum::Router;

use crate::app_state::AppState;
use crate::domain::VzpId;
use crate::error::VzpError;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(vzp::routes())
        .merge(roster::routes())
        .merge(member::routes())
        .merge(system::operator_routes())
}

/// Parses an event id path segment.
fn parse_vzp_id(raw: &str) -> Result<VzpId, VzpError> {
    VzpId::parse(raw).ok_or_else(|| VzpError::Validation(format!("'{raw}' is not a vzp id")))
}
