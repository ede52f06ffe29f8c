//! Event DTOs for create, get, list, status and close operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{DeliveryDto, PaginationMeta};
use crate::domain::{
    ArchivedVzp, Caliber, Condition, Mode, NewVzp, Outcome, Status, UserId, Vzp, VzpId,
    VzpSummary,
};
use crate::render::{RenderedVzp, summary_line};

/// Request body for `POST /vzps`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVzpRequest {
    /// Target participant count.
    pub capacity: u32,
    /// Attack or defense.
    pub mode: Mode,
    /// One to three conditions.
    pub conditions: Vec<Condition>,
    /// Three distinct calibers.
    pub calibers: Vec<Caliber>,
    /// Scheduling label, e.g. `"20:00"`.
    pub schedule: String,
    /// Opponent label.
    #[serde(default)]
    pub opponent: Option<String>,
}

impl From<CreateVzpRequest> for NewVzp {
    fn from(req: CreateVzpRequest) -> Self {
        Self {
            capacity: req.capacity,
            mode: req.mode,
            conditions: req.conditions,
            loadout: req.calibers,
            schedule: req.schedule,
            opponent: req.opponent,
        }
    }
}

/// One roster line.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterEntryDto {
    /// Member identity.
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// Member tier.
    pub tier: u8,
}

/// One swap record entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapEntryDto {
    /// Member taken out of the roster.
    #[schema(value_type = String)]
    pub replaced: UserId,
    /// Member playing instead.
    #[schema(value_type = String)]
    pub replacement: UserId,
}

/// Full event state for `GET /vzps/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct VzpDto {
    /// Event identifier.
    #[schema(value_type = String)]
    pub vzp_id: VzpId,
    /// Lifecycle status.
    pub status: Status,
    /// Attack or defense.
    pub mode: Mode,
    /// Opponent label.
    pub opponent: String,
    /// Scheduling label.
    pub schedule: String,
    /// Conditions in order.
    pub conditions: Vec<Condition>,
    /// The three calibers.
    pub loadout: Vec<Caliber>,
    /// Target participant count.
    pub capacity: u32,
    /// Accepted participants.
    pub filled: usize,
    /// Roster in sign-up order.
    pub roster: Vec<RosterEntryDto>,
    /// Swap record.
    pub swaps: Vec<SwapEntryDto>,
    /// Posted representation reference.
    pub presentation: Option<String>,
    /// Temporary channel grouping reference.
    pub space: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Vzp> for VzpDto {
    fn from(vzp: &Vzp) -> Self {
        Self {
            vzp_id: vzp.id.clone(),
            status: vzp.status,
            mode: vzp.mode,
            opponent: vzp.opponent.clone(),
            schedule: vzp.schedule.clone(),
            conditions: vzp.conditions.clone(),
            loadout: vzp.loadout.to_vec(),
            capacity: vzp.capacity,
            filled: vzp.filled(),
            roster: vzp
                .roster
                .iter()
                .map(|(&user_id, tier)| RosterEntryDto {
                    user_id,
                    tier: tier.get(),
                })
                .collect(),
            swaps: vzp
                .swaps
                .iter()
                .map(|(&replaced, &replacement)| SwapEntryDto {
                    replaced,
                    replacement,
                })
                .collect(),
            presentation: vzp.presentation.as_ref().map(|h| h.as_str().to_string()),
            space: vzp.space.as_ref().map(|h| h.as_str().to_string()),
            created_at: vzp.created_at,
        }
    }
}

/// Response body for `POST /vzps` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateVzpResponse {
    /// Created event.
    pub vzp: VzpDto,
    /// Initial post payload.
    pub rendered: RenderedVzp,
}

/// Event summary for list responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct VzpSummaryDto {
    /// Event identifier.
    #[schema(value_type = String)]
    pub vzp_id: VzpId,
    /// Lifecycle status.
    pub status: Status,
    /// Attack or defense.
    pub mode: Mode,
    /// Opponent label.
    pub opponent: String,
    /// Scheduling label.
    pub schedule: String,
    /// Accepted participants.
    pub filled: usize,
    /// Target participant count.
    pub capacity: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Preformatted one-line description.
    pub line: String,
}

impl From<VzpSummary> for VzpSummaryDto {
    fn from(summary: VzpSummary) -> Self {
        let line = summary_line(&summary);
        Self {
            vzp_id: summary.id,
            status: summary.status,
            mode: summary.mode,
            opponent: summary.opponent,
            schedule: summary.schedule,
            filled: summary.filled,
            capacity: summary.capacity,
            created_at: summary.created_at,
            line,
        }
    }
}

/// Paginated list response for `GET /vzps`.
#[derive(Debug, Serialize, ToSchema)]
pub struct VzpListResponse {
    /// Events on this page.
    pub data: Vec<VzpSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for lock and unlock.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChangeResponse {
    /// Event identifier.
    #[schema(value_type = String)]
    pub vzp_id: VzpId,
    /// Status before the change.
    pub from: Status,
    /// Status after the change.
    pub to: Status,
}

/// Response body for `POST /vzps/{id}/start`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartResponse {
    /// Event state after the start.
    pub vzp: VzpDto,
    /// Space opened for the participants.
    pub space: String,
    /// Start notifications.
    pub notified: DeliveryDto,
}

/// Request body for `POST /vzps/{id}/close`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CloseVzpRequest {
    /// Recorded result.
    #[serde(default)]
    pub outcome: Option<Outcome>,
    /// Opponent label override.
    #[serde(default)]
    pub opponent: Option<String>,
}

/// Archive entry of a closed event.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArchivedVzpDto {
    /// Event identifier.
    #[schema(value_type = String)]
    pub vzp_id: VzpId,
    /// Opponent label at close.
    pub opponent: String,
    /// Scheduling label.
    pub schedule: String,
    /// Target participant count.
    pub capacity: u32,
    /// Final roster size.
    pub participants: usize,
    /// Recorded result.
    pub outcome: Option<Outcome>,
    /// Close timestamp.
    pub closed_at: DateTime<Utc>,
}

impl ArchivedVzpDto {
    /// Pairs an archive entry with its id.
    #[must_use]
    pub fn new(vzp_id: VzpId, archived: ArchivedVzp) -> Self {
        Self {
            vzp_id,
            opponent: archived.opponent,
            schedule: archived.schedule,
            capacity: archived.capacity,
            participants: archived.participants,
            outcome: archived.outcome,
            closed_at: archived.closed_at,
        }
    }
}

/// Response body for `POST /vzps/{id}/close`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CloseVzpResponse {
    /// Archive entry.
    pub archived: ArchivedVzpDto,
    /// Final post payload.
    pub rendered: RenderedVzp,
    /// Channels released by the space manager.
    pub channels_released: usize,
    /// Close notifications.
    pub notified: DeliveryDto,
}
