//! Authoritative in-memory store for active and archived events.
//!
//! [`VzpStore`] keeps every active event, its roster and swap record, and
//! the archive of closed events behind a single [`tokio::sync::RwLock`].
//! Each operation validates and mutates under one write guard, so two
//! actions racing on the same event cannot interleave between the check
//! and the write. Operations return a clone of the mutated event for the
//! caller to render.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::vzp::{ArchivedVzp, NewVzp, SpaceHandle, UNKNOWN_OPPONENT, Vzp, VzpSummary};
use super::{Outcome, PresentationHandle, Status, Tier, UserId, VzpId};
use crate::error::VzpError;

/// Maximum number of conditions per event.
pub const MAX_CONDITIONS: usize = 3;

/// Global caps enforced by the store.
#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    /// Maximum number of active (non-closed) events.
    pub max_active: usize,
    /// Hard cap on roster size, whatever the event capacity.
    pub max_participants: u32,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_active: 15,
            max_participants: 100,
        }
    }
}

/// Full store contents, used for persistence and restore.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    /// Active events by identifier, in creation order.
    pub active: IndexMap<VzpId, Vzp>,
    /// Closed event summaries by identifier.
    pub archive: IndexMap<VzpId, ArchivedVzp>,
}

/// Result of a status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// Status before the change.
    pub from: Status,
    /// Status after the change.
    pub to: Status,
    /// Event state after the change.
    pub vzp: Vzp,
}

/// Result of closing an event.
#[derive(Debug, Clone)]
pub struct ClosedVzp {
    /// Final event state, swap record included for the last render.
    pub vzp: Vzp,
    /// Status the event was closed from.
    pub previous: Status,
    /// The archive entry that replaced it.
    pub archived: ArchivedVzp,
}

/// Outcome of a join-button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    /// The member was added with the given tier.
    Joined(Tier),
    /// The member was removed.
    Left,
}

/// Central store for all events.
#[derive(Debug)]
pub struct VzpStore {
    state: RwLock<StoreSnapshot>,
    limits: StoreLimits,
}

impl VzpStore {
    /// Creates an empty store with the given limits.
    #[must_use]
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            state: RwLock::new(StoreSnapshot::default()),
            limits,
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Validates creation input and inserts a new `OPEN` event.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::Validation`] if the loadout has fewer than three
    /// distinct calibers, the conditions are empty or more than three, the
    /// capacity is zero or above the hard cap, or the active-event cap is
    /// reached. Nothing is created on error.
    pub async fn create(&self, input: NewVzp) -> Result<Vzp, VzpError> {
        let loadout = validate_loadout(&input)?;
        let conditions = dedup_in_order(&input.conditions);
        if conditions.is_empty() {
            return Err(VzpError::Validation(
                "at least one condition is required".to_string(),
            ));
        }
        if conditions.len() > MAX_CONDITIONS {
            return Err(VzpError::Validation(format!(
                "at most {MAX_CONDITIONS} conditions are allowed"
            )));
        }
        if input.capacity == 0 {
            return Err(VzpError::Validation(
                "capacity must be positive".to_string(),
            ));
        }
        if input.capacity > self.limits.max_participants {
            return Err(VzpError::Validation(format!(
                "capacity {} exceeds the maximum of {} participants",
                input.capacity, self.limits.max_participants
            )));
        }

        let mut state = self.state.write().await;
        let active = state.active.values().filter(|v| v.status.is_active()).count();
        if active >= self.limits.max_active {
            return Err(VzpError::Validation(format!(
                "active vzp limit reached ({}); close one first",
                self.limits.max_active
            )));
        }

        let mut id = VzpId::generate();
        while state.active.contains_key(&id) || state.archive.contains_key(&id) {
            id = VzpId::generate();
        }

        let opponent = input
            .opponent
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| UNKNOWN_OPPONENT.to_string());

        let vzp = Vzp {
            id: id.clone(),
            capacity: input.capacity,
            schedule: input.schedule.trim().to_string(),
            opponent,
            mode: input.mode,
            conditions,
            loadout,
            roster: IndexMap::new(),
            swaps: IndexMap::new(),
            status: Status::Open,
            presentation: None,
            space: None,
            outcome: None,
            created_at: Utc::now(),
        };
        state.active.insert(id, vzp.clone());
        Ok(vzp)
    }

    /// Returns a clone of an active event.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] if no active event has this id.
    pub async fn get(&self, id: &VzpId) -> Result<Vzp, VzpError> {
        let state = self.state.read().await;
        state
            .active
            .get(id)
            .cloned()
            .ok_or_else(|| VzpError::vzp_not_found(id))
    }

    /// Adds a participant to the roster.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] for an unknown id and
    /// [`VzpError::Precondition`] if the event is closed or not `OPEN`, the
    /// tier is unresolved, the member is already listed or is a pending
    /// replacement, or the roster is full.
    pub async fn join(
        &self,
        id: &VzpId,
        user: UserId,
        tier: Option<Tier>,
    ) -> Result<Vzp, VzpError> {
        let mut state = self.state.write().await;
        let limits = self.limits;
        let vzp = active_mut(&mut state, id)?;
        check_can_join(vzp, user, tier, limits).map(|tier| {
            vzp.roster.insert(user, tier);
            vzp.clone()
        })
    }

    /// Toggles membership: a listed member leaves, anyone else joins.
    ///
    /// Both directions require the event to be `OPEN`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::join`] for the joining direction; leaving only fails
    /// on an unknown id or a non-`OPEN` status.
    pub async fn toggle(
        &self,
        id: &VzpId,
        user: UserId,
        tier: Option<Tier>,
    ) -> Result<(RosterChange, Vzp), VzpError> {
        let mut state = self.state.write().await;
        let limits = self.limits;
        let vzp = active_mut(&mut state, id)?;
        if vzp.in_roster(user) {
            require_open(vzp)?;
            vzp.roster.shift_remove(&user);
            return Ok((RosterChange::Left, vzp.clone()));
        }
        let tier = check_can_join(vzp, user, tier, limits)?;
        vzp.roster.insert(user, tier);
        Ok((RosterChange::Joined(tier), vzp.clone()))
    }

    /// Removes a participant on their own request.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] for an unknown id and
    /// [`VzpError::Precondition`] if the event is not `OPEN` or the member
    /// is not in the roster.
    pub async fn leave(&self, id: &VzpId, user: UserId) -> Result<Vzp, VzpError> {
        let mut state = self.state.write().await;
        let vzp = active_mut(&mut state, id)?;
        require_open(vzp)?;
        if vzp.roster.shift_remove(&user).is_none() {
            return Err(VzpError::Precondition(format!(
                "{} is not signed up",
                user.mention()
            )));
        }
        Ok(vzp.clone())
    }

    /// Removes a member by operator action and cleans their swap entries.
    ///
    /// Succeeds if the member was in the roster, was replaced, or was a
    /// replacement.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] for an unknown id and
    /// [`VzpError::ParticipantNotFound`] if the member is not referenced.
    pub async fn admin_remove(&self, id: &VzpId, user: UserId) -> Result<Vzp, VzpError> {
        let mut state = self.state.write().await;
        let vzp = listed_mut(&mut state, id)?;
        let in_roster = vzp.roster.shift_remove(&user).is_some();
        let before = vzp.swaps.len();
        vzp.swaps
            .retain(|&replaced, &mut replacement| replaced != user && replacement != user);
        if !in_roster && vzp.swaps.len() == before {
            return Err(VzpError::ParticipantNotFound {
                vzp_id: id.clone(),
                user_id: user,
            });
        }
        Ok(vzp.clone())
    }

    /// Replaces `old` with `new`: `old` leaves the roster and the pair is
    /// recorded in the swap record. `new` is not added to the roster.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] for an unknown id,
    /// [`VzpError::ParticipantNotFound`] if `old` is not in the roster and
    /// [`VzpError::Precondition`] if `old` was already replaced once, or if
    /// `new` is `old`, already listed, already a replacement or has no tier.
    pub async fn swap(
        &self,
        id: &VzpId,
        old: UserId,
        new: UserId,
        new_tier: Option<Tier>,
    ) -> Result<Vzp, VzpError> {
        let mut state = self.state.write().await;
        let vzp = listed_mut(&mut state, id)?;
        if !vzp.in_roster(old) {
            return Err(VzpError::ParticipantNotFound {
                vzp_id: id.clone(),
                user_id: old,
            });
        }
        if let Some(prior) = vzp.swaps.get(&old) {
            return Err(VzpError::Precondition(format!(
                "{} was already replaced by {}",
                old.mention(),
                prior.mention()
            )));
        }
        if old == new {
            return Err(VzpError::Precondition(
                "a member cannot replace themselves".to_string(),
            ));
        }
        if vzp.in_roster(new) {
            return Err(VzpError::Precondition(format!(
                "{} is already in the roster",
                new.mention()
            )));
        }
        if vzp.is_replacement(new) {
            return Err(VzpError::Precondition(format!(
                "{} is already a replacement",
                new.mention()
            )));
        }
        if new_tier.is_none() {
            return Err(VzpError::Precondition(format!(
                "{} has no tier role",
                new.mention()
            )));
        }
        vzp.roster.shift_remove(&old);
        vzp.swaps.insert(old, new);
        Ok(vzp.clone())
    }

    /// Checks that `target` is reachable without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] for an unknown id and
    /// [`VzpError::InvalidTransition`] if the state machine forbids it.
    pub async fn check_transition(&self, id: &VzpId, target: Status) -> Result<Vzp, VzpError> {
        let state = self.state.read().await;
        let vzp = transition_target(&state, id, target)?;
        ensure_transition(vzp.status, target)?;
        Ok(vzp.clone())
    }

    /// Moves an event to `target` following the state machine.
    ///
    /// A `CLOSED` target closes the event without an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] for an unknown id and
    /// [`VzpError::InvalidTransition`] for an illegal change.
    pub async fn set_status(&self, id: &VzpId, target: Status) -> Result<StatusChange, VzpError> {
        if target == Status::Closed {
            let closed = self.close(id, None, None).await?;
            return Ok(StatusChange {
                from: closed.previous,
                to: Status::Closed,
                vzp: closed.vzp,
            });
        }
        self.transition(id, target, None).await
    }

    /// Moves an event to `IN_PROGRESS` and records its space.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_status`].
    pub async fn start(&self, id: &VzpId, space: SpaceHandle) -> Result<StatusChange, VzpError> {
        self.transition(id, Status::InProgress, Some(space)).await
    }

    async fn transition(
        &self,
        id: &VzpId,
        target: Status,
        space: Option<SpaceHandle>,
    ) -> Result<StatusChange, VzpError> {
        let mut state = self.state.write().await;
        transition_target(&state, id, target)?;
        let vzp = active_mut(&mut state, id)?;
        let from = vzp.status;
        ensure_transition(from, target)?;
        vzp.status = target;
        if space.is_some() {
            vzp.space = space;
        }
        Ok(StatusChange {
            from,
            to: target,
            vzp: vzp.clone(),
        })
    }

    /// Closes an event and moves it to the archive.
    ///
    /// The swap record is discarded with the active entry; the returned
    /// [`ClosedVzp`] still carries it for the final render.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] for an unknown id and
    /// [`VzpError::InvalidTransition`] if the event is already closed.
    pub async fn close(
        &self,
        id: &VzpId,
        outcome: Option<Outcome>,
        opponent: Option<String>,
    ) -> Result<ClosedVzp, VzpError> {
        let mut state = self.state.write().await;
        let previous = transition_target(&state, id, Status::Closed)?.status;
        ensure_transition(previous, Status::Closed)?;

        let Some(mut vzp) = state.active.shift_remove(id) else {
            return Err(VzpError::vzp_not_found(id));
        };
        vzp.status = Status::Closed;
        vzp.outcome = outcome;
        if let Some(opponent) = opponent.map(|o| o.trim().to_string()).filter(|o| !o.is_empty()) {
            vzp.opponent = opponent;
        }
        let archived = ArchivedVzp::from_closed(&vzp, Utc::now());
        state.archive.insert(id.clone(), archived.clone());

        Ok(ClosedVzp {
            vzp,
            previous,
            archived,
        })
    }

    /// Records the presentation handle of an active event.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] if the event is no longer active.
    pub async fn attach_presentation(
        &self,
        id: &VzpId,
        handle: PresentationHandle,
    ) -> Result<(), VzpError> {
        let mut state = self.state.write().await;
        active_mut(&mut state, id)?.presentation = Some(handle);
        Ok(())
    }

    /// Returns summaries of all active events in creation order.
    pub async fn list_active(&self) -> Vec<VzpSummary> {
        let state = self.state.read().await;
        state.active.values().map(VzpSummary::from).collect()
    }

    /// Returns the archive summary of a closed event.
    pub async fn archived(&self, id: &VzpId) -> Option<ArchivedVzp> {
        self.state.read().await.archive.get(id).cloned()
    }

    /// Drops archive entries closed before `cutoff`. Returns how many
    /// entries were removed.
    pub async fn prune_archive(&self, cutoff: DateTime<Utc>) -> usize {
        let mut state = self.state.write().await;
        let before = state.archive.len();
        state.archive.retain(|_, entry| entry.closed_at >= cutoff);
        before - state.archive.len()
    }

    /// Returns the number of active events.
    pub async fn active_count(&self) -> usize {
        self.state.read().await.active.len()
    }

    /// Returns a full copy of the store contents.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.clone()
    }

    /// Replaces the store contents, typically at startup.
    pub async fn restore(&self, snapshot: StoreSnapshot) {
        *self.state.write().await = snapshot;
    }
}

fn active_mut<'a>(state: &'a mut StoreSnapshot, id: &VzpId) -> Result<&'a mut Vzp, VzpError> {
    if state.archive.contains_key(id) && !state.active.contains_key(id) {
        return Err(VzpError::Precondition(format!("vzp {id} is closed")));
    }
    state
        .active
        .get_mut(id)
        .ok_or_else(|| VzpError::vzp_not_found(id))
}

/// Looks up an active event. Archived ids are reported as unknown.
fn listed_mut<'a>(state: &'a mut StoreSnapshot, id: &VzpId) -> Result<&'a mut Vzp, VzpError> {
    state
        .active
        .get_mut(id)
        .ok_or_else(|| VzpError::vzp_not_found(id))
}

/// Looks up the event a status change applies to. Archived events report
/// the change as leaving `CLOSED`.
fn transition_target<'a>(
    state: &'a StoreSnapshot,
    id: &VzpId,
    target: Status,
) -> Result<&'a Vzp, VzpError> {
    match state.active.get(id) {
        Some(vzp) => Ok(vzp),
        None if state.archive.contains_key(id) => Err(VzpError::InvalidTransition {
            from: Status::Closed,
            to: target,
        }),
        None => Err(VzpError::vzp_not_found(id)),
    }
}

fn require_open(vzp: &Vzp) -> Result<(), VzpError> {
    if vzp.status.accepts_joins() {
        Ok(())
    } else {
        Err(VzpError::Precondition(format!(
            "sign-ups are closed (status {})",
            vzp.status
        )))
    }
}

fn check_can_join(
    vzp: &Vzp,
    user: UserId,
    tier: Option<Tier>,
    limits: StoreLimits,
) -> Result<Tier, VzpError> {
    require_open(vzp)?;
    let Some(tier) = tier else {
        return Err(VzpError::Precondition(
            "a tier role is required to sign up".to_string(),
        ));
    };
    if vzp.in_roster(user) {
        return Err(VzpError::Precondition("already signed up".to_string()));
    }
    if vzp.is_replacement(user) {
        return Err(VzpError::Precondition(
            "already listed as a replacement".to_string(),
        ));
    }
    let cap = vzp.capacity.min(limits.max_participants);
    if vzp.filled() >= cap as usize {
        return Err(VzpError::Precondition(format!("roster is full ({cap})")));
    }
    Ok(tier)
}

fn ensure_transition(from: Status, to: Status) -> Result<(), VzpError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(VzpError::InvalidTransition { from, to })
    }
}

fn validate_loadout(input: &NewVzp) -> Result<[super::Caliber; 3], VzpError> {
    let distinct = dedup_in_order(&input.loadout);
    match distinct.as_slice() {
        [a, b, c] if input.loadout.len() == 3 => Ok([*a, *b, *c]),
        _ => Err(VzpError::Validation(
            "loadout needs exactly three different calibers".to_string(),
        )),
    }
}

fn dedup_in_order<T: Copy + Eq + std::hash::Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items.iter().copied().filter(|i| seen.insert(*i)).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Caliber, Condition, Mode};

    fn tier(n: u8) -> Option<Tier> {
        Tier::new(n)
    }

    fn input(capacity: u32) -> NewVzp {
        NewVzp {
            capacity,
            mode: Mode::Attack,
            conditions: vec![Condition::Armor],
            loadout: vec![Caliber::C556, Caliber::C762, Caliber::C9],
            schedule: "20:00".to_string(),
            opponent: Some("Vagos".to_string()),
        }
    }

    async fn store_with(capacity: u32) -> (VzpStore, VzpId) {
        let store = VzpStore::new(StoreLimits::default());
        let Ok(vzp) = store.create(input(capacity)).await else {
            panic!("create failed");
        };
        (store, vzp.id)
    }

    fn user(n: u64) -> UserId {
        UserId::new(n)
    }

    #[tokio::test]
    async fn create_join_close_scenario() {
        let (store, id) = store_with(10).await;
        let Ok(vzp) = store.get(&id).await else {
            panic!("missing vzp");
        };
        assert_eq!(vzp.status, Status::Open);
        assert!(vzp.roster.is_empty());

        let Ok(vzp) = store.join(&id, user(1), tier(1)).await else {
            panic!("join failed");
        };
        assert_eq!(vzp.roster.get(&user(1)), tier(1).as_ref());

        let Ok(closed) = store.close(&id, Some(Outcome::Win), None).await else {
            panic!("close failed");
        };
        assert_eq!(closed.vzp.status, Status::Closed);
        assert_eq!(closed.archived.participants, 1);
        assert_eq!(closed.archived.outcome, Some(Outcome::Win));
        assert!(store.get(&id).await.is_err());
        assert_eq!(store.active_count().await, 0);
        assert!(store.archived(&id).await.is_some());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_calibers_and_creates_nothing() {
        let store = VzpStore::new(StoreLimits::default());
        let mut bad = input(10);
        bad.loadout = vec![Caliber::C556, Caliber::C556, Caliber::C9];
        let result = store.create(bad).await;
        assert!(matches!(result, Err(VzpError::Validation(_))));
        assert_eq!(store.active_count().await, 0);

        let mut short = input(10);
        short.loadout = vec![Caliber::C556, Caliber::C9];
        assert!(matches!(
            store.create(short).await,
            Err(VzpError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn create_drops_duplicate_conditions() {
        let store = VzpStore::new(StoreLimits::default());
        let mut req = input(10);
        req.conditions = vec![Condition::Armor, Condition::Medkits, Condition::Armor];
        let Ok(vzp) = store.create(req).await else {
            panic!("create failed");
        };
        assert_eq!(vzp.conditions, vec![Condition::Armor, Condition::Medkits]);
    }

    #[tokio::test]
    async fn create_validates_conditions_and_capacity() {
        let store = VzpStore::new(StoreLimits::default());
        let mut empty = input(10);
        empty.conditions.clear();
        assert!(matches!(
            store.create(empty).await,
            Err(VzpError::Validation(_))
        ));
        assert!(matches!(
            store.create(input(101)).await,
            Err(VzpError::Validation(_))
        ));
        assert!(matches!(
            store.create(input(0)).await,
            Err(VzpError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn create_enforces_active_cap() {
        let store = VzpStore::new(StoreLimits {
            max_active: 2,
            max_participants: 100,
        });
        assert!(store.create(input(5)).await.is_ok());
        assert!(store.create(input(5)).await.is_ok());
        assert!(matches!(
            store.create(input(5)).await,
            Err(VzpError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn opponent_defaults_when_blank() {
        let store = VzpStore::new(StoreLimits::default());
        let mut req = input(5);
        req.opponent = Some("   ".to_string());
        let Ok(vzp) = store.create(req).await else {
            panic!("create failed");
        };
        assert_eq!(vzp.opponent, UNKNOWN_OPPONENT);
    }

    #[tokio::test]
    async fn join_rejects_unknown_event() {
        let store = VzpStore::new(StoreLimits::default());
        let result = store.join(&VzpId::generate(), user(1), tier(1)).await;
        assert!(matches!(result, Err(VzpError::VzpNotFound(_))));
    }

    #[tokio::test]
    async fn join_requires_tier_and_uniqueness() {
        let (store, id) = store_with(10).await;
        assert!(matches!(
            store.join(&id, user(1), None).await,
            Err(VzpError::Precondition(_))
        ));
        assert!(store.join(&id, user(1), tier(2)).await.is_ok());
        assert!(matches!(
            store.join(&id, user(1), tier(2)).await,
            Err(VzpError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn roster_never_exceeds_capacity() {
        let (store, id) = store_with(2).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        assert!(store.join(&id, user(2), tier(1)).await.is_ok());
        assert!(matches!(
            store.join(&id, user(3), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));
        let Ok(vzp) = store.get(&id).await else {
            panic!("missing vzp");
        };
        assert_eq!(vzp.filled(), 2);
    }

    #[tokio::test]
    async fn hard_cap_applies_below_capacity() {
        let store = VzpStore::new(StoreLimits {
            max_active: 15,
            max_participants: 3,
        });
        let Ok(vzp) = store.create(input(3)).await else {
            panic!("create failed");
        };
        for n in 1..=3 {
            assert!(store.join(&vzp.id, user(n), tier(1)).await.is_ok());
        }
        assert!(store.join(&vzp.id, user(4), tier(1)).await.is_err());
    }

    #[tokio::test]
    async fn join_rejected_when_locked_started_or_closed() {
        let (store, id) = store_with(10).await;
        assert!(store.set_status(&id, Status::ListLocked).await.is_ok());
        assert!(matches!(
            store.join(&id, user(1), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));

        assert!(store.start(&id, SpaceHandle::new("space-1")).await.is_ok());
        assert!(matches!(
            store.join(&id, user(1), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));
        let Ok(vzp) = store.get(&id).await else {
            panic!("missing vzp");
        };
        assert!(vzp.roster.is_empty());

        assert!(store.close(&id, None, None).await.is_ok());
        assert!(matches!(
            store.join(&id, user(1), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn replacement_cannot_join_directly() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        assert!(store.swap(&id, user(1), user(2), tier(3)).await.is_ok());
        assert!(matches!(
            store.join(&id, user(2), tier(3)).await,
            Err(VzpError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() {
        let (store, id) = store_with(10).await;
        let Ok((change, vzp)) = store.toggle(&id, user(1), tier(2)).await else {
            panic!("toggle failed");
        };
        assert_eq!(change, RosterChange::Joined(Tier::ALL[1]));
        assert_eq!(vzp.filled(), 1);

        let Ok((change, vzp)) = store.toggle(&id, user(1), tier(2)).await else {
            panic!("toggle failed");
        };
        assert_eq!(change, RosterChange::Left);
        assert_eq!(vzp.filled(), 0);
    }

    #[tokio::test]
    async fn toggle_leave_blocked_once_locked() {
        let (store, id) = store_with(10).await;
        assert!(store.toggle(&id, user(1), tier(1)).await.is_ok());
        assert!(store.set_status(&id, Status::ListLocked).await.is_ok());
        assert!(matches!(
            store.toggle(&id, user(1), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn leave_requires_membership() {
        let (store, id) = store_with(10).await;
        assert!(matches!(
            store.leave(&id, user(9)).await,
            Err(VzpError::Precondition(_))
        ));
        assert!(store.join(&id, user(9), tier(1)).await.is_ok());
        let Ok(vzp) = store.leave(&id, user(9)).await else {
            panic!("leave failed");
        };
        assert!(vzp.roster.is_empty());
    }

    #[tokio::test]
    async fn swap_moves_old_out_and_records_pair() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        let Ok(vzp) = store.swap(&id, user(1), user(2), tier(2)).await else {
            panic!("swap failed");
        };
        assert!(!vzp.in_roster(user(1)));
        assert!(!vzp.in_roster(user(2)));
        assert_eq!(vzp.swaps.get(&user(1)), Some(&user(2)));
    }

    #[tokio::test]
    async fn swap_validates_both_sides() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        assert!(store.join(&id, user(2), tier(1)).await.is_ok());

        assert!(matches!(
            store.swap(&id, user(9), user(3), tier(1)).await,
            Err(VzpError::ParticipantNotFound { .. })
        ));
        assert!(matches!(
            store.swap(&id, user(1), user(2), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));
        assert!(matches!(
            store.swap(&id, user(1), user(3), None).await,
            Err(VzpError::Precondition(_))
        ));
        assert!(store.swap(&id, user(1), user(3), tier(1)).await.is_ok());
        assert!(matches!(
            store.swap(&id, user(2), user(3), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn remove_replacement_clears_swap_entry() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        assert!(store.swap(&id, user(1), user(2), tier(1)).await.is_ok());
        let Ok(vzp) = store.admin_remove(&id, user(2)).await else {
            panic!("remove failed");
        };
        assert!(vzp.swaps.is_empty());
        assert!(vzp.roster.is_empty());
    }

    #[tokio::test]
    async fn remove_replaced_member_who_rejoined() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        assert!(store.swap(&id, user(1), user(2), tier(1)).await.is_ok());
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        let Ok(vzp) = store.admin_remove(&id, user(1)).await else {
            panic!("remove failed");
        };
        assert!(vzp.roster.is_empty());
        assert!(vzp.swaps.is_empty());
    }

    #[tokio::test]
    async fn second_swap_of_the_same_member_is_rejected() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        assert!(store.swap(&id, user(1), user(2), tier(1)).await.is_ok());
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());

        assert!(matches!(
            store.swap(&id, user(1), user(3), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));
        let Ok(vzp) = store.get(&id).await else {
            panic!("event missing");
        };
        assert_eq!(vzp.swaps.get(&user(1)), Some(&user(2)));
        assert!(vzp.in_roster(user(1)));
    }

    #[tokio::test]
    async fn archived_event_is_unknown_to_remove_and_swap() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        assert!(store.close(&id, Some(Outcome::Win), None).await.is_ok());

        assert!(matches!(
            store.admin_remove(&id, user(1)).await,
            Err(VzpError::VzpNotFound(_))
        ));
        assert!(matches!(
            store.swap(&id, user(1), user(2), tier(1)).await,
            Err(VzpError::VzpNotFound(_))
        ));
        assert!(matches!(
            store.join(&id, user(2), tier(1)).await,
            Err(VzpError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn remove_unknown_member_fails() {
        let (store, id) = store_with(10).await;
        assert!(matches!(
            store.admin_remove(&id, user(5)).await,
            Err(VzpError::ParticipantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn lock_unlock_round_trip() {
        let (store, id) = store_with(10).await;
        assert!(store.set_status(&id, Status::ListLocked).await.is_ok());
        let Ok(change) = store.set_status(&id, Status::Open).await else {
            panic!("unlock failed");
        };
        assert_eq!(change.from, Status::ListLocked);
        assert_eq!(change.to, Status::Open);
    }

    #[tokio::test]
    async fn started_event_cannot_reopen() {
        let (store, id) = store_with(10).await;
        assert!(store.set_status(&id, Status::ListLocked).await.is_ok());
        assert!(store.set_status(&id, Status::InProgress).await.is_ok());
        let result = store.set_status(&id, Status::Open).await;
        assert!(matches!(
            result,
            Err(VzpError::InvalidTransition {
                from: Status::InProgress,
                to: Status::Open
            })
        ));
    }

    #[tokio::test]
    async fn start_records_space() {
        let (store, id) = store_with(10).await;
        let Ok(change) = store.start(&id, SpaceHandle::new("space-7")).await else {
            panic!("start failed");
        };
        assert_eq!(change.vzp.space, Some(SpaceHandle::new("space-7")));
        assert!(store.check_transition(&id, Status::InProgress).await.is_err());
    }

    #[tokio::test]
    async fn closing_twice_is_an_invalid_transition() {
        let (store, id) = store_with(10).await;
        assert!(store.set_status(&id, Status::Closed).await.is_ok());
        assert!(matches!(
            store.close(&id, Some(Outcome::Lose), None).await,
            Err(VzpError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn close_overrides_opponent_and_keeps_swaps_for_render() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        assert!(store.swap(&id, user(1), user(2), tier(1)).await.is_ok());
        let Ok(closed) = store
            .close(&id, Some(Outcome::Lose), Some("Families".to_string()))
            .await
        else {
            panic!("close failed");
        };
        assert_eq!(closed.archived.opponent, "Families");
        assert_eq!(closed.vzp.swaps.len(), 1);
        assert!(store.snapshot().await.active.is_empty());
    }

    #[tokio::test]
    async fn prune_archive_drops_old_entries() {
        let (store, id) = store_with(10).await;
        assert!(store.close(&id, None, None).await.is_ok());
        assert_eq!(store.prune_archive(Utc::now() - chrono::Duration::days(7)).await, 0);
        assert_eq!(store.prune_archive(Utc::now() + chrono::Duration::seconds(1)).await, 1);
        assert!(store.archived(&id).await.is_none());
    }

    #[tokio::test]
    async fn list_active_is_restartable() {
        let store = VzpStore::new(StoreLimits::default());
        assert!(store.create(input(5)).await.is_ok());
        assert!(store.create(input(6)).await.is_ok());
        let first: Vec<u32> = store.list_active().await.iter().map(|s| s.capacity).collect();
        let second: Vec<u32> = store.list_active().await.iter().map(|s| s.capacity).collect();
        assert_eq!(first, vec![5, 6]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn restore_replaces_contents() {
        let (store, id) = store_with(10).await;
        assert!(store.join(&id, user(1), tier(1)).await.is_ok());
        let snapshot = store.snapshot().await;

        let fresh = VzpStore::new(StoreLimits::default());
        fresh.restore(snapshot.clone()).await;
        assert_eq!(fresh.snapshot().await, snapshot);
    }
}
