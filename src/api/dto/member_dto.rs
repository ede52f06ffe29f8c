//! Member directory DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::UserId;

/// Request body for `PUT /members/{user_id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertMemberRequest {
    /// Name shown in event posts.
    pub display_name: String,
    /// Role ids currently held by the member, as decimal strings.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Response body for `PUT /members/{user_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    /// Member identity.
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// Resolved tier, if any tier role matches.
    pub tier: Option<u8>,
    /// Whether the member holds an operator role.
    pub operator: bool,
    /// `true` if the member was not known before.
    pub created: bool,
}
