//! Roster handlers: join button, leave, swap and removal.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::parse_vzp_id;
use crate::api::dto::{
    JoinAction, RemoveRequest, RosterEditResponse, RosterResponse, SwapRequest, VzpDto,
};
use crate::api::extract::{Actor, Operator};
use crate::app_state::AppState;
use crate::domain::RosterChange;
use crate::error::{ErrorResponse, VzpError};

/// `POST /vzps/{id}/join`: join-button press by the acting member.
///
/// # Errors
///
/// Returns [`VzpError::Precondition`] if sign-ups are closed, the member
/// has no tier role, is already listed or the roster is full.
#[utoipa::path(
    post,
    path = "/api/v1/vzps/{id}/join",
    tag = "Roster",
    summary = "Press the join button",
    description = "Joins the roster. In toggle mode a listed member pressing again leaves.",
    params(
        ("id" = String, Path, description = "Eight-character event id"),
        ("x-actor-id" = String, Header, description = "Member pressing the button"),
    ),
    responses(
        (status = 200, description = "Roster updated", body = RosterResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Sign-up rejected", body = ErrorResponse),
    )
)]
pub async fn join_vzp(
    State(state): State<AppState>,
    Actor(user): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let outcome = state.vzp_service.press_join(&id, user).await?;
    let (action, tier) = match outcome.change {
        RosterChange::Joined(tier) => (JoinAction::Joined, Some(tier.get())),
        RosterChange::Left => (JoinAction::Left, None),
    };
    Ok(Json(RosterResponse {
        vzp_id: id,
        user_id: user,
        action,
        tier,
        filled: outcome.vzp.filled(),
        capacity: outcome.vzp.capacity,
    }))
}

/// `POST /vzps/{id}/leave`: the acting member leaves the roster.
///
/// # Errors
///
/// Returns [`VzpError::Precondition`] if sign-ups are closed, the member
/// is not listed or leaving is disabled.
#[utoipa::path(
    post,
    path = "/api/v1/vzps/{id}/leave",
    tag = "Roster",
    summary = "Leave the roster",
    params(
        ("id" = String, Path, description = "Eight-character event id"),
        ("x-actor-id" = String, Header, description = "Member leaving"),
    ),
    responses(
        (status = 200, description = "Roster updated", body = RosterResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Leave rejected", body = ErrorResponse),
    )
)]
pub async fn leave_vzp(
    State(state): State<AppState>,
    Actor(user): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let vzp = state.vzp_service.leave(&id, user).await?;
    Ok(Json(RosterResponse {
        vzp_id: id,
        user_id: user,
        action: JoinAction::Left,
        tier: None,
        filled: vzp.filled(),
        capacity: vzp.capacity,
    }))
}

/// `POST /vzps/{id}/swap`: replace a roster member.
///
/// # Errors
///
/// Returns [`VzpError::ParticipantNotFound`] if the old member is not
/// listed and [`VzpError::Precondition`] if the new member cannot replace
/// them.
#[utoipa::path(
    post,
    path = "/api/v1/vzps/{id}/swap",
    tag = "Roster",
    summary = "Swap a player",
    request_body = SwapRequest,
    params(
        ("id" = String, Path, description = "Eight-character event id"),
        ("x-actor-id" = String, Header, description = "Acting operator"),
    ),
    responses(
        (status = 200, description = "Player swapped", body = RosterEditResponse),
        (status = 404, description = "Event or member not found", body = ErrorResponse),
        (status = 409, description = "Swap rejected", body = ErrorResponse),
    )
)]
pub async fn swap_player(
    State(state): State<AppState>,
    Operator(_operator): Operator,
    Path(id): Path<String>,
    Json(req): Json<SwapRequest>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let report = state
        .vzp_service
        .swap(&id, req.old_user_id, req.new_user_id)
        .await?;
    Ok(Json(RosterEditResponse {
        vzp: VzpDto::from(&report.vzp),
        notified: report.delivery.into(),
    }))
}

/// `POST /vzps/{id}/remove`: remove a member from roster and swaps.
///
/// # Errors
///
/// Returns [`VzpError::ParticipantNotFound`] if the member is not
/// referenced by the event.
#[utoipa::path(
    post,
    path = "/api/v1/vzps/{id}/remove",
    tag = "Roster",
    summary = "Remove a member",
    request_body = RemoveRequest,
    params(
        ("id" = String, Path, description = "Eight-character event id"),
        ("x-actor-id" = String, Header, description = "Acting operator"),
    ),
    responses(
        (status = 200, description = "Member removed", body = RosterEditResponse),
        (status = 404, description = "Event or member not found", body = ErrorResponse),
    )
)]
pub async fn remove_member(
    State(state): State<AppState>,
    Operator(_operator): Operator,
    Path(id): Path<String>,
    Json(req): Json<RemoveRequest>,
) -> Result<impl IntoResponse, VzpError> {
    let id = parse_vzp_id(&id)?;
    let report = state.vzp_service.remove(&id, req.user_id).await?;
    Ok(Json(RosterEditResponse {
        vzp: VzpDto::from(&report.vzp),
        notified: report.delivery.into(),
    }))
}

/// Roster routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vzps/{id}/join", post(join_vzp))
        .route("/vzps/{id}/leave", post(leave_vzp))
        .route("/vzps/{id}/swap", post(swap_player))
        .route("/vzps/{id}/remove", post(remove_member))
}
