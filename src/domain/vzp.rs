//! The VZP aggregate: roster, swap record, status and linked handles.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Caliber, Condition, Mode, Outcome, Status, Tier, UserId, VzpId};

/// Opponent label used when the operator did not name one.
pub const UNKNOWN_OPPONENT: &str = "—";

/// Reference to the posted representation of an event.
///
/// Opaque to the service; only the presenter interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresentationHandle(String);

impl PresentationHandle {
    /// Wraps a presenter-issued reference.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference to the temporary channel grouping opened at start.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceHandle(String);

impl SpaceHandle {
    /// Wraps a space-manager-issued reference.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Operator input for creating an event, before validation.
#[derive(Debug, Clone)]
pub struct NewVzp {
    /// Target participant count.
    pub capacity: u32,
    /// Attack or defense.
    pub mode: Mode,
    /// Requested conditions; duplicates are dropped, order kept.
    pub conditions: Vec<Condition>,
    /// Requested calibers; must hold three distinct values.
    pub loadout: Vec<Caliber>,
    /// Free-text scheduling label (e.g. `"20:00"`).
    pub schedule: String,
    /// Free-text opponent label.
    pub opponent: Option<String>,
}

/// One sign-up session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vzp {
    /// Unique identifier (immutable after creation).
    pub id: VzpId,
    /// Target participant count.
    pub capacity: u32,
    /// Scheduling label.
    pub schedule: String,
    /// Opponent label.
    pub opponent: String,
    /// Attack or defense.
    pub mode: Mode,
    /// One to three distinct conditions.
    pub conditions: Vec<Condition>,
    /// Exactly three distinct calibers.
    pub loadout: [Caliber; 3],
    /// Accepted participants and their tier, in sign-up order.
    pub roster: IndexMap<UserId, Tier>,
    /// Replaced participant to replacement. Persisted in the separate
    /// swap history document, not alongside the event.
    #[serde(skip)]
    pub swaps: IndexMap<UserId, UserId>,
    /// Lifecycle status.
    pub status: Status,
    /// Posted representation, once presented.
    #[serde(default)]
    pub presentation: Option<PresentationHandle>,
    /// Temporary channel grouping, present from start until close.
    #[serde(default)]
    pub space: Option<SpaceHandle>,
    /// Result, set only on close.
    #[serde(default)]
    pub outcome: Option<Outcome>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Vzp {
    /// Number of accepted participants.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.roster.len()
    }

    /// Returns `true` if `user` is an accepted participant.
    #[must_use]
    pub fn in_roster(&self, user: UserId) -> bool {
        self.roster.contains_key(&user)
    }

    /// Returns `true` if `user` is recorded as a replacement.
    #[must_use]
    pub fn is_replacement(&self, user: UserId) -> bool {
        self.swaps.values().any(|&r| r == user)
    }

    /// Everyone expected to play: roster members followed by replacements.
    #[must_use]
    pub fn participants(&self) -> Vec<UserId> {
        self.roster
            .keys()
            .chain(self.swaps.values())
            .copied()
            .collect()
    }

    /// Every identity the rendered post refers to.
    #[must_use]
    pub fn referenced_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.roster.keys().copied().collect();
        for (&replaced, &replacement) in &self.swaps {
            users.push(replaced);
            users.push(replacement);
        }
        users.sort_unstable();
        users.dedup();
        users
    }
}

/// Summary kept after an event is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedVzp {
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

impl ArchivedVzp {
    /// Builds the archive summary of a just-closed event.
    #[must_use]
    pub fn from_closed(vzp: &Vzp, closed_at: DateTime<Utc>) -> Self {
        Self {
            opponent: vzp.opponent.clone(),
            schedule: vzp.schedule.clone(),
            capacity: vzp.capacity,
            participants: vzp.filled(),
            outcome: vzp.outcome,
            closed_at,
        }
    }
}

/// Lightweight summary of an active event for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct VzpSummary {
    /// Event identifier.
    pub id: VzpId,
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
    pub loadout: [Caliber; 3],
    /// Accepted participants.
    pub filled: usize,
    /// Target participant count.
    pub capacity: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Vzp> for VzpSummary {
    fn from(vzp: &Vzp) -> Self {
        Self {
            id: vzp.id.clone(),
            status: vzp.status,
            mode: vzp.mode,
            opponent: vzp.opponent.clone(),
            schedule: vzp.schedule.clone(),
            conditions: vzp.conditions.clone(),
            loadout: vzp.loadout,
            filled: vzp.filled(),
            capacity: vzp.capacity,
            created_at: vzp.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vzp {
        Vzp {
            id: VzpId::generate(),
            capacity: 10,
            schedule: "20:00".to_string(),
            opponent: "Ballas".to_string(),
            mode: Mode::Attack,
            conditions: vec![Condition::Armor],
            loadout: [Caliber::C556, Caliber::C762, Caliber::C9],
            roster: IndexMap::new(),
            swaps: IndexMap::new(),
            status: Status::Open,
            presentation: None,
            space: None,
            outcome: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn participants_lists_roster_then_replacements() {
        let mut vzp = sample();
        vzp.roster.insert(UserId::new(1), Tier::ALL[0]);
        vzp.roster.insert(UserId::new(2), Tier::ALL[1]);
        vzp.swaps.insert(UserId::new(3), UserId::new(4));

        assert_eq!(
            vzp.participants(),
            vec![UserId::new(1), UserId::new(2), UserId::new(4)]
        );
        assert!(vzp.is_replacement(UserId::new(4)));
        assert!(!vzp.is_replacement(UserId::new(3)));
    }

    #[test]
    fn referenced_users_include_both_swap_sides() {
        let mut vzp = sample();
        vzp.roster.insert(UserId::new(5), Tier::ALL[2]);
        vzp.swaps.insert(UserId::new(3), UserId::new(4));
        assert_eq!(
            vzp.referenced_users(),
            vec![UserId::new(3), UserId::new(4), UserId::new(5)]
        );
    }

    #[test]
    fn archive_summary_counts_final_roster() {
        let mut vzp = sample();
        vzp.roster.insert(UserId::new(1), Tier::ALL[0]);
        vzp.outcome = Some(Outcome::Win);
        let archived = ArchivedVzp::from_closed(&vzp, Utc::now());
        assert_eq!(archived.participants, 1);
        assert_eq!(archived.outcome, Some(Outcome::Win));
        assert_eq!(archived.capacity, 10);
    }
}
