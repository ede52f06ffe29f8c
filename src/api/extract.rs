//! Request extractors identifying the acting member.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::VzpError;

/// Header carrying the platform identity of the member who triggered the
/// request.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The member who triggered the request.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = VzpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or(VzpError::Unauthenticated)?;
        let text = raw.to_str().map_err(|_| VzpError::Unauthenticated)?;
        text.trim()
            .parse::<u64>()
            .map(|id| Self(UserId::new(id)))
            .map_err(|_| VzpError::Validation(format!("{ACTOR_HEADER} is not a user id")))
    }
}

/// A member allowed to run operator commands.
#[derive(Debug, Clone, Copy)]
pub struct Operator(pub UserId);

impl FromRequestParts<AppState> for Operator {
    type Rejection = VzpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Actor(user) = Actor::from_request_parts(parts, state).await?;
        state.vzp_service.authorize_operator(user).await?;
        Ok(Self(user))
    }
}
