//! System endpoints: health check, catalog, ping and archive cleanup.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::DeliveryDto;
use crate::api::extract::Operator;
use crate::app_state::AppState;
use crate::config::JoinPolicy;
use crate::domain::{Caliber, Condition, Mode};
use crate::error::{ErrorResponse, VzpError};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    active_vzps: usize,
    adapter_connected: bool,
}

/// `GET /health`: service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and active event count.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            active_vzps: state.vzp_service.store().active_count().await,
            adapter_connected: state.adapter.is_connected().await,
        }),
    )
}

/// One selectable value with its display label.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogEntry {
    /// Wire value accepted by the create command.
    value: serde_json::Value,
    label: &'static str,
}

impl CatalogEntry {
    fn of<T: Serialize>(value: T, label: &'static str) -> Self {
        Self {
            value: serde_json::to_value(value).unwrap_or_default(),
            label,
        }
    }
}

/// Choices offered by the create command, plus deployment limits.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    modes: Vec<CatalogEntry>,
    conditions: Vec<CatalogEntry>,
    calibers: Vec<CatalogEntry>,
    max_active: usize,
    max_participants: u32,
    join_mode: &'static str,
}

/// `GET /config/catalog`: modes, conditions and calibers.
#[utoipa::path(
    get,
    path = "/config/catalog",
    tag = "System",
    summary = "Create-command catalog",
    description = "Returns the values accepted by the create command with their display labels.",
    responses(
        (status = 200, description = "Catalog", body = CatalogResponse),
    )
)]
pub async fn catalog_handler(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.vzp_service.config();
    Json(CatalogResponse {
        modes: Mode::ALL
            .iter()
            .map(|&m| CatalogEntry::of(m, m.label()))
            .collect(),
        conditions: Condition::ALL
            .iter()
            .map(|&c| CatalogEntry::of(c, c.label()))
            .collect(),
        calibers: Caliber::ALL
            .iter()
            .map(|&c| CatalogEntry::of(c, c.label()))
            .collect(),
        max_active: config.limits.max_active,
        max_participants: config.limits.max_participants,
        join_mode: match config.join_policy {
            JoinPolicy::Toggle => "toggle",
            JoinPolicy::AddOnly => "add_only",
        },
    })
}

/// `POST /ping`: headline followed by `@everyone` pings.
///
/// # Errors
///
/// Returns [`VzpError::ExternalCollaborator`] if the headline could not be
/// posted.
#[utoipa::path(
    post,
    path = "/api/v1/ping",
    tag = "System",
    summary = "Ping everyone",
    params(("x-actor-id" = String, Header, description = "Acting operator")),
    responses(
        (status = 200, description = "Pings sent", body = DeliveryDto),
        (status = 403, description = "Actor is not an operator", body = ErrorResponse),
        (status = 502, description = "No adapter connected", body = ErrorResponse),
    )
)]
pub async fn ping_handler(
    State(state): State<AppState>,
    Operator(_operator): Operator,
) -> Result<impl IntoResponse, VzpError> {
    let report = state.vzp_service.broadcast_ping().await?;
    Ok(Json(DeliveryDto::from(report)))
}

/// Cleanup result.
#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupResponse {
    pruned: usize,
}

/// `POST /archive/cleanup`: prune old archive entries.
///
/// # Errors
///
/// Returns [`VzpError::Forbidden`] for non-operators.
#[utoipa::path(
    post,
    path = "/api/v1/archive/cleanup",
    tag = "System",
    summary = "Prune the archive",
    description = "Drops archived events closed longer ago than the retention window.",
    params(("x-actor-id" = String, Header, description = "Acting operator")),
    responses(
        (status = 200, description = "Archive pruned", body = CleanupResponse),
        (status = 403, description = "Actor is not an operator", body = ErrorResponse),
    )
)]
pub async fn cleanup_handler(
    State(state): State<AppState>,
    Operator(_operator): Operator,
) -> Result<impl IntoResponse, VzpError> {
    let pruned = state.vzp_service.cleanup().await;
    Ok(Json(CleanupResponse { pruned }))
}

/// Operator routes mounted under `/api/v1`.
pub fn operator_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", post(ping_handler))
        .route("/archive/cleanup", post(cleanup_handler))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/catalog", get(catalog_handler))
}
