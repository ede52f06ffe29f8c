//! Member directory sync from the platform adapter.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::put;
use axum::{Json, Router};

use crate::api::dto::{MemberResponse, UpsertMemberRequest};
use crate::app_state::AppState;
use crate::domain::{RoleId, UserId};
use crate::error::{ErrorResponse, VzpError};
use crate::platform::MemberProfile;

/// `PUT /members/{user_id}`: record a member's name and roles.
///
/// # Errors
///
/// Returns [`VzpError::Validation`] if the user id or a role id is not a
/// number.
#[utoipa::path(
    put,
    path = "/api/v1/members/{user_id}",
    tag = "Members",
    summary = "Sync a member",
    description = "Called by the platform adapter whenever a member's name or roles change.",
    request_body = UpsertMemberRequest,
    params(("user_id" = String, Path, description = "Member snowflake")),
    responses(
        (status = 200, description = "Member recorded", body = MemberResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
    )
)]
pub async fn upsert_member(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<UpsertMemberRequest>,
) -> Result<impl IntoResponse, VzpError> {
    let user = parse_snowflake(&user_id).map(UserId::new)?;
    let roles = req
        .roles
        .iter()
        .map(|r| parse_snowflake(r).map(RoleId::new))
        .collect::<Result<Vec<_>, _>>()?;

    let config = state.vzp_service.config();
    let tier = config.tier_roles.resolve(&roles).map(|t| t.get());
    let operator = config.is_admin(&roles);
    let created = state
        .directory
        .upsert(
            user,
            MemberProfile {
                display_name: req.display_name,
                roles,
            },
        )
        .await;
    tracing::debug!(%user, ?tier, operator, created, "member synced");

    Ok(Json(MemberResponse {
        user_id: user,
        tier,
        operator,
        created,
    }))
}

fn parse_snowflake(raw: &str) -> Result<u64, VzpError> {
    raw.trim()
        .parse()
        .map_err(|_| VzpError::Validation(format!("'{raw}' is not a snowflake id")))
}

/// Member routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/members/{user_id}", put(upsert_member))
}
