//! Event lifecycle handlers: create, list, get, render, lock, unlock,
//! start, close and archive lookup.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::parse_vzp_id;
use crate::api::dto::{
    ArchivedVzpDto, CloseVzpRequest, CloseVzpResponse, CreateVzpRequest, CreateVzpResponse,
    PaginationParams, StartResponse, StatusChangeResponse, VzpDto, VzpListResponse,
    VzpSummaryDto,
};
use crate::api::extract::Operator;
use crate::app_state::AppState;
use crate::domain::StatusChange;
use crate::error::{ErrorResponse, VzpError};
use crate::render::RenderedVzp;

/// `POST /vzps`: create an event and post it.
///
/// # Errors
///
/// Returns [`VzpError::Validation`] on invalid input and
/// [`VzpError::Forbidden`] for non-operators.
#[utoipa::path(
    post,
    path = "/api/v1/vzps",
    tag = "VZP",
    summary = "Create a VZP",
    description = "Creates an OPEN event and requests its post with an @everyone mention.",
    request_body = CreateVzpRequest,
    params(("x-actor-id" = String, Header, description = "Acting operator")),
    responses(
        (status = 201, description = "Event created", body = CreateVzpResponse),
        (status = 400, description = "Invalid loadout, conditions or capacity, or active limit reached", body = ErrorResponse),
        (status = 403, description = "Actor is not an operator", body = ErrorResponse),
    )
)]
pub async fn create_vzp(
    State(state): State<AppState>,
    Operator(actor): Operator,
    Json(req): Json<CreateVzpRequest>,
) -> Result<impl IntoResponse, VzpError> {
    let (vzp, rendered) = state.vzp_service.create(req.into()).await?;
    tracing::debug!(vzp_id = %vzp.id, %actor, "create requested");
    Ok((
        StatusCode::CREATED,
        Json(CreateVzpResponse {
            vzp: VzpDto::from(&vzp),
            rendered,
        }),
    ))
}

/// `GET /vzps`: list active events.
///
/// # Errors
///
/// Never fails; the signature matches the other handlers.
#[utoipa::path(
    get,
    path = "/api/v1/vzps",
    tag = "VZP",
    summary = "List active VZPs",
    description = "Returns a paginated list of active events in creation order.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated event list", body = VzpListResponse),
    )
)]
pub async fn list_vzps(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, VzpError> {
    let summaries = state.vzp_service.list().await;
    let (page, pagination) = params.paginate(summaries);
    Ok(Json(VzpListResponse {
        data: page.into_iter().map(VzpSummaryDto::from).collect(),
        pagination,
    }))
}

/// `GET /vzps/{id}`: full state of an active event.
///
/// # Errors
///
/// Returns [`VzpError::VzpNotFound`] if no active event has this id.
#[utoipa::path(
    get,
    path = "/api/v1/vzps/{id}",
    tag = "VZP",
    summary = "Get a VZP",
    params(("id" = String, Path, description = "Eight-character event id")),
    responses(
        (status = 200, description = "Event state", body = VzpDto),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_vzp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let vzp = state.vzp_service.get(&id).await?;
    Ok(Json(VzpDto::from(&vzp)))
}

/// `GET /vzps/{id}/render`: current post payload.
///
/// # Errors
///
/// Returns [`VzpError::VzpNotFound`] if no active event has this id.
#[utoipa::path(
    get,
    path = "/api/v1/vzps/{id}/render",
    tag = "VZP",
    summary = "Render a VZP",
    description = "Renders the event post from current state without publishing it.",
    params(("id" = String, Path, description = "Eight-character event id")),
    responses(
        (status = 200, description = "Rendered post", body = RenderedVzp),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn render_vzp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    Ok(Json(state.vzp_service.rendered(&id).await?))
}

/// `POST /vzps/{id}/lock`: stop sign-ups.
///
/// # Errors
///
/// Returns [`VzpError::InvalidTransition`] unless the event is `OPEN`.
#[utoipa::path(
    post,
    path = "/api/v1/vzps/{id}/lock",
    tag = "VZP",
    summary = "Lock the list",
    params(
        ("id" = String, Path, description = "Eight-character event id"),
        ("x-actor-id" = String, Header, description = "Acting operator"),
    ),
    responses(
        (status = 200, description = "Status changed", body = StatusChangeResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Illegal transition", body = ErrorResponse),
    )
)]
pub async fn lock_vzp(
    State(state): State<AppState>,
    Operator(_operator): Operator,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let change = state.vzp_service.lock(&id).await?;
    Ok(Json(status_response(&change)))
}

/// `POST /vzps/{id}/unlock`: reopen sign-ups.
///
/// # Errors
///
/// Returns [`VzpError::InvalidTransition`] unless the event is
/// `LIST_LOCKED`.
#[utoipa::path(
    post,
    path = "/api/v1/vzps/{id}/unlock",
    tag = "VZP",
    summary = "Unlock the list",
    params(
        ("id" = String, Path, description = "Eight-character event id"),
        ("x-actor-id" = String, Header, description = "Acting operator"),
    ),
    responses(
        (status = 200, description = "Status changed", body = StatusChangeResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Illegal transition", body = ErrorResponse),
    )
)]
pub async fn unlock_vzp(
    State(state): State<AppState>,
    Operator(_operator): Operator,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let change = state.vzp_service.unlock(&id).await?;
    Ok(Json(status_response(&change)))
}

/// `POST /vzps/{id}/start`: open the space and start the event.
///
/// # Errors
///
/// Returns [`VzpError::InvalidTransition`] for an illegal start and
/// [`VzpError::ExternalCollaborator`] if the space could not be opened.
#[utoipa::path(
    post,
    path = "/api/v1/vzps/{id}/start",
    tag = "VZP",
    summary = "Start a VZP",
    description = "Opens the voice and text channels for roster members and replacements, moves the event to IN_PROGRESS and DMs every participant.",
    params(
        ("id" = String, Path, description = "Eight-character event id"),
        ("x-actor-id" = String, Header, description = "Acting operator"),
    ),
    responses(
        (status = 200, description = "Event started", body = StartResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Illegal transition", body = ErrorResponse),
        (status = 502, description = "Space could not be opened", body = ErrorResponse),
    )
)]
pub async fn start_vzp(
    State(state): State<AppState>,
    Operator(_operator): Operator,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let report = state.vzp_service.start(&id).await?;
    Ok(Json(StartResponse {
        vzp: VzpDto::from(&report.vzp),
        space: report.space.as_str().to_string(),
        notified: report.delivery.into(),
    }))
}

/// `POST /vzps/{id}/close`: close and archive the event.
///
/// # Errors
///
/// Returns [`VzpError::VzpNotFound`] for an unknown id and
/// [`VzpError::InvalidTransition`] if already closed.
#[utoipa::path(
    post,
    path = "/api/v1/vzps/{id}/close",
    tag = "VZP",
    summary = "Close a VZP",
    request_body = CloseVzpRequest,
    params(
        ("id" = String, Path, description = "Eight-character event id"),
        ("x-actor-id" = String, Header, description = "Acting operator"),
    ),
    responses(
        (status = 200, description = "Event closed", body = CloseVzpResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Already closed", body = ErrorResponse),
    )
)]
pub async fn close_vzp(
    State(state): State<AppState>,
    Operator(_operator): Operator,
    Path(id): Path<String>,
    body: Option<Json<CloseVzpRequest>>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let Json(req) = body.unwrap_or_default();
    let report = state.vzp_service.close(&id, req.outcome, req.opponent).await?;
    Ok(Json(CloseVzpResponse {
        archived: ArchivedVzpDto::new(id, report.archived),
        rendered: report.rendered,
        channels_released: report.channels_released,
        notified: report.delivery.into(),
    }))
}

/// `GET /archive/{id}`: archive entry of a closed event.
///
/// # Errors
///
/// Returns [`VzpError::VzpNotFound`] if the id is not archived.
#[utoipa::path(
    get,
    path = "/api/v1/archive/{id}",
    tag = "VZP",
    summary = "Get an archived VZP",
    params(("id" = String, Path, description = "Eight-character event id")),
    responses(
        (status = 200, description = "Archive entry", body = ArchivedVzpDto),
        (status = 404, description = "Not archived", body = ErrorResponse),
    )
)]
pub async fn get_archived(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let archived = state.vzp_service.archived(&id).await?;
    Ok(Json(ArchivedVzpDto::new(id, archived)))
}

fn status_response(change: &StatusChange) -> StatusChangeResponse {
    StatusChangeResponse {
        vzp_id: change.vzp.id.clone(),
        from: change.from,
        to: change.to,
    }
}

/// Event lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vzps", post(create_vzp).get(list_vzps))
        .route("/vzps/{id}", get(get_vzp))
        .route("/vzps/{id}/render", get(render_vzp))
        .route("/vzps/{id}/lock", post(lock_vzp))
        .route("/vzps/{id}/unlock", post(unlock_vzp))
        .route("/vzps/{id}/start", post(start_vzp))
        .route("/vzps/{id}/close", post(close_vzp))
        .route("/archive/{id}", get(get_archived))
}
