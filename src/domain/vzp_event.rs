//! Domain events published on the [`super::EventBus`] after every store
//! mutation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Mode, Outcome, Status, Tier, UserId, VzpId};

/// Why a member's roster entry changed.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterChangeKind {
    /// Signed up through the join button.
    Joined,
    /// Left through the join button or the leave command.
    Left,
    /// Removed by an operator.
    Removed,
}

/// Event emitted after every mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum VzpEvent {
    /// A new event was created.
    VzpCreated {
        /// Event identifier.
        vzp_id: VzpId,
        /// Attack or defense.
        mode: Mode,
        /// Opponent label.
        opponent: String,
        /// Scheduling label.
        schedule: String,
        /// Target participant count.
        capacity: u32,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A roster entry was added or removed.
    RosterChanged {
        /// Event identifier.
        vzp_id: VzpId,
        /// Affected member.
        user_id: UserId,
        /// What happened.
        change: RosterChangeKind,
        /// Tier of a joining member.
        #[serde(skip_serializing_if = "Option::is_none")]
        tier: Option<Tier>,
        /// Roster size after the change.
        filled: usize,
        /// Target participant count.
        capacity: u32,
        /// Timestamp of the change.
        timestamp: DateTime<Utc>,
    },

    /// A member was replaced.
    PlayerSwapped {
        /// Event identifier.
        vzp_id: VzpId,
        /// Member taken out of the roster.
        replaced: UserId,
        /// Member recorded as replacement.
        replacement: UserId,
        /// Timestamp of the swap.
        timestamp: DateTime<Utc>,
    },

    /// The event moved to another status.
    StatusChanged {
        /// Event identifier.
        vzp_id: VzpId,
        /// Previous status.
        from: Status,
        /// New status.
        to: Status,
        /// Timestamp of the change.
        timestamp: DateTime<Utc>,
    },

    /// The event was closed and archived.
    VzpClosed {
        /// Event identifier.
        vzp_id: VzpId,
        /// Recorded result.
        outcome: Option<Outcome>,
        /// Final roster size.
        participants: usize,
        /// Close timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl VzpEvent {
    /// Returns the event identifier this bus event concerns.
    #[must_use]
    pub fn vzp_id(&self) -> &VzpId {
        match self {
            Self::VzpCreated { vzp_id, .. }
            | Self::RosterChanged { vzp_id, .. }
            | Self::PlayerSwapped { vzp_id, .. }
            | Self::StatusChanged { vzp_id, .. }
            | Self::VzpClosed { vzp_id, .. } => vzp_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::VzpCreated { .. } => "vzp_created",
            Self::RosterChanged { .. } => "roster_changed",
            Self::PlayerSwapped { .. } => "player_swapped",
            Self::StatusChanged { .. } => "status_changed",
            Self::VzpClosed { .. } => "vzp_closed",
        }
    }
}
