//! Gateway error types with HTTP status code mapping.
//!
//! [`VzpError`] is the central error type. Each variant maps to a numeric
//! code and an HTTP status, and renders as a structured JSON error
//! response carrying a human-readable reason for the rejected operation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Status, UserId, VzpId};
use crate::platform::CollaboratorError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "precondition failed: sign-ups are closed (status LIST_LOCKED)",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see ranges on [`VzpError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category                 | HTTP Status                  |
/// |-----------|--------------------------|------------------------------|
/// | 1000–1999 | Validation               | 400 Bad Request              |
/// | 2000–2999 | Not Found / Precondition | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / Collaborator    | 500 / 502                    |
/// | 4000–4999 | Permission               | 401 / 403                    |
#[derive(Debug, thiserror::Error)]
pub enum VzpError {
    /// No active or archived event with the given identifier.
    #[error("vzp not found: {0}")]
    VzpNotFound(String),

    /// The member is neither in the roster nor in the swap record.
    #[error("member {user_id} is not listed in vzp {vzp_id}")]
    ParticipantNotFound {
        /// Event that was searched.
        vzp_id: VzpId,
        /// Member that was not found.
        user_id: UserId,
    },

    /// A status or membership rule rejected the operation.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Malformed creation input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The requested status change is not allowed by the state machine.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: Status,
        /// Requested status.
        to: Status,
    },

    /// A collaborator (roles, notifications, spaces, presenter) failed in
    /// a way that aborted the operation.
    #[error("collaborator error: {0}")]
    ExternalCollaborator(#[from] CollaboratorError),

    /// The request did not identify the acting member.
    #[error("missing or malformed actor header")]
    Unauthenticated,

    /// The acting member lacks the required role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Snapshot read or write failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VzpError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::VzpNotFound(_) => 2001,
            Self::ParticipantNotFound { .. } => 2002,
            Self::Precondition(_) => 2003,
            Self::InvalidTransition { .. } => 2004,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::ExternalCollaborator(_) => 3002,
            Self::Unauthenticated => 4001,
            Self::Forbidden(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::VzpNotFound(_) | Self::ParticipantNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Precondition(_) | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::ExternalCollaborator(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for an unknown event reference.
    #[must_use]
    pub fn vzp_not_found(id: &VzpId) -> Self {
        Self::VzpNotFound(id.to_string())
    }
}

impl IntoResponse for VzpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_maps_to_conflict() {
        let err = VzpError::Precondition("sign-ups are closed".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2003);
    }

    #[test]
    fn transition_message_names_both_states() {
        let err = VzpError::InvalidTransition {
            from: Status::InProgress,
            to: Status::Open,
        };
        assert_eq!(err.to_string(), "invalid transition from IN_PROGRESS to OPEN");
    }

    #[test]
    fn collaborator_errors_convert() {
        let err: VzpError = CollaboratorError::Unavailable.into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn response_carries_status() {
        let response = VzpError::VzpNotFound("deadbeef".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
