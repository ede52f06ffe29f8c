//! Roster DTOs for join, leave, swap and remove operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::DeliveryDto;
use super::vzp_dto::VzpDto;
use crate::domain::{UserId, VzpId};

/// What a join-button press did.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JoinAction {
    /// The member was added.
    Joined,
    /// The member was removed.
    Left,
}

/// Response body for join and leave.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterResponse {
    /// Event identifier.
    #[schema(value_type = String)]
    pub vzp_id: VzpId,
    /// Acting member.
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// What happened.
    pub action: JoinAction,
    /// Tier of a joining member.
    pub tier: Option<u8>,
    /// Roster size after the action.
    pub filled: usize,
    /// Target participant count.
    pub capacity: u32,
}

/// Request body for `POST /vzps/{id}/swap`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapRequest {
    /// Roster member to replace.
    #[schema(value_type = String)]
    pub old_user_id: UserId,
    /// Member playing instead.
    #[schema(value_type = String)]
    pub new_user_id: UserId,
}

/// Request body for `POST /vzps/{id}/remove`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveRequest {
    /// Member to remove.
    #[schema(value_type = String)]
    pub user_id: UserId,
}

/// Response body for swap and remove.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterEditResponse {
    /// Event state after the edit.
    pub vzp: VzpDto,
    /// Notifications to the members concerned.
    pub notified: DeliveryDto,
}
