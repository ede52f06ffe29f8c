//! Event status and its transition rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a VZP event.
///
/// ```text
/// OPEN ──lock──▶ LIST_LOCKED ──unlock──▶ OPEN
/// OPEN | LIST_LOCKED ──start──▶ IN_PROGRESS
/// OPEN | LIST_LOCKED | IN_PROGRESS ──close──▶ CLOSED
/// ```
///
/// `CLOSED` is terminal. Nothing returns to `OPEN` once the event started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Accepting sign-ups.
    Open,
    /// Sign-ups stopped while the list is finalised; admin edits allowed.
    ListLocked,
    /// Event running; roster frozen against joins.
    InProgress,
    /// Finished and archived.
    Closed,
}

impl Status {
    /// Returns `true` if moving from `self` to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::ListLocked)
                | (Self::ListLocked, Self::Open)
                | (Self::Open | Self::ListLocked, Self::InProgress)
                | (
                    Self::Open | Self::ListLocked | Self::InProgress,
                    Self::Closed
                )
        )
    }

    /// Returns `true` while participants may sign up.
    #[must_use]
    pub const fn accepts_joins(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` for every status except `CLOSED`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Banner text shown in the rendered post.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::ListLocked => "LIST IN PROCESS",
            Self::InProgress => "VZP IN PROCESS",
            Self::Closed => "CLOSED",
        }
    }

    /// Banner color (RGB) for the rendered post.
    #[must_use]
    pub const fn color(self) -> u32 {
        match self {
            Self::Open => 0x2E_CC_71,
            Self::ListLocked => 0xF1_C4_0F,
            Self::InProgress => 0x34_98_DB,
            Self::Closed => 0xE7_4C_3C,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "OPEN",
            Self::ListLocked => "LIST_LOCKED",
            Self::InProgress => "IN_PROGRESS",
            Self::Closed => "CLOSED",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Status; 4] = [
        Status::Open,
        Status::ListLocked,
        Status::InProgress,
        Status::Closed,
    ];

    #[test]
    fn lock_and_unlock_are_symmetric() {
        assert!(Status::Open.can_transition_to(Status::ListLocked));
        assert!(Status::ListLocked.can_transition_to(Status::Open));
    }

    #[test]
    fn started_event_never_reopens() {
        assert!(!Status::InProgress.can_transition_to(Status::Open));
        assert!(!Status::InProgress.can_transition_to(Status::ListLocked));
    }

    #[test]
    fn closed_is_terminal() {
        for target in ALL {
            assert!(!Status::Closed.can_transition_to(target));
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn every_active_status_can_close() {
        for status in ALL.into_iter().filter(|s| s.is_active()) {
            assert!(status.can_transition_to(Status::Closed));
        }
    }

    #[test]
    fn only_open_accepts_joins() {
        let accepting: Vec<Status> = ALL.into_iter().filter(|s| s.accepts_joins()).collect();
        assert_eq!(accepting, vec![Status::Open]);
    }
}
