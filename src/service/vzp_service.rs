//! Event service: orchestrates commands and emits events.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::{JoinPolicy, VzpConfig};
use crate::domain::{
    ArchivedVzp, ClosedVzp, EventBus, NewVzp, Outcome, PresentationHandle, RosterChange,
    RosterChangeKind, SpaceHandle, Status, StatusChange, Tier, UserId, Vzp, VzpEvent, VzpId,
    VzpStore, VzpSummary,
};
use crate::error::VzpError;
use crate::persistence::SnapshotStore;
use crate::platform::{Collaborators, Notice};
use crate::render::{DisplayNames, RenderedVzp, render};

/// Count of messages delivered out of those attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Messages the notifier accepted.
    pub delivered: usize,
    /// Messages attempted.
    pub recipients: usize,
}

/// Result of a join-button press.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Whether the member joined or left.
    pub change: RosterChange,
    /// Event state after the press.
    pub vzp: Vzp,
}

/// Result of starting an event.
#[derive(Debug, Clone)]
pub struct StartReport {
    /// Event state after the start.
    pub vzp: Vzp,
    /// Space opened for the participants.
    pub space: SpaceHandle,
    /// Start notifications.
    pub delivery: DeliveryReport,
}

/// Result of closing an event.
#[derive(Debug, Clone)]
pub struct CloseReport {
    /// Archive entry of the event.
    pub archived: ArchivedVzp,
    /// Final rendered post.
    pub rendered: RenderedVzp,
    /// Channels released by the space manager.
    pub channels_released: usize,
    /// Close notifications.
    pub delivery: DeliveryReport,
}

/// Result of a swap or removal.
#[derive(Debug, Clone)]
pub struct RosterEditReport {
    /// Event state after the edit.
    pub vzp: Vzp,
    /// Notifications to the members concerned.
    pub delivery: DeliveryReport,
}

/// Orchestration layer for all event commands.
///
/// Owns references to the [`VzpStore`] for state, the [`EventBus`] for
/// event emission, the platform [`Collaborators`] and the
/// [`SnapshotStore`]. Every mutation follows the pattern: validate and
/// mutate in the store, emit events, re-render and present, persist,
/// notify. Collaborator and persistence failures after the mutation are
/// logged and do not undo it.
#[derive(Debug, Clone)]
pub struct VzpService {
    store: Arc<VzpStore>,
    event_bus: EventBus,
    collaborators: Collaborators,
    snapshots: Arc<SnapshotStore>,
    config: Arc<VzpConfig>,
}

impl VzpService {
    /// Creates a new `VzpService` with an empty store.
    #[must_use]
    pub fn new(
        config: Arc<VzpConfig>,
        event_bus: EventBus,
        collaborators: Collaborators,
        snapshots: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            store: Arc::new(VzpStore::new(config.limits)),
            event_bus,
            collaborators,
            snapshots,
            config,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`VzpStore`].
    #[must_use]
    pub fn store(&self) -> &Arc<VzpStore> {
        &self.store
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &VzpConfig {
        &self.config
    }

    /// Restores the store from the snapshot files. Returns the number of
    /// active events loaded.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::Persistence`] if a snapshot file is unreadable.
    pub async fn load(&self) -> Result<usize, VzpError> {
        let snapshot = self.snapshots.load().await?;
        let active = snapshot.active.len();
        let archived = snapshot.archive.len();
        self.store.restore(snapshot).await;
        tracing::info!(active, archived, dir = %self.snapshots.dir().display(), "state restored");
        Ok(active)
    }

    /// Checks that `actor` may run operator commands.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::Forbidden`] if the actor is unknown or holds no
    /// admin role, and [`VzpError::ExternalCollaborator`] if the lookup
    /// failed.
    pub async fn authorize_operator(&self, actor: UserId) -> Result<(), VzpError> {
        let Some(profile) = self.collaborators.directory.member(actor).await? else {
            return Err(VzpError::Forbidden(format!(
                "{} is not a known member",
                actor.mention()
            )));
        };
        if self.config.is_admin(&profile.roles) {
            Ok(())
        } else {
            Err(VzpError::Forbidden(format!(
                "{} holds no operator role",
                actor.mention()
            )))
        }
    }

    /// Creates an event and posts it.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::Validation`] if the input is rejected.
    pub async fn create(&self, input: NewVzp) -> Result<(Vzp, RenderedVzp), VzpError> {
        let mut vzp = self.store.create(input).await?;

        let _ = self.event_bus.publish(VzpEvent::VzpCreated {
            vzp_id: vzp.id.clone(),
            mode: vzp.mode,
            opponent: vzp.opponent.clone(),
            schedule: vzp.schedule.clone(),
            capacity: vzp.capacity,
            timestamp: Utc::now(),
        });
        tracing::info!(
            vzp_id = %vzp.id,
            mode = vzp.mode.label(),
            capacity = vzp.capacity,
            "vzp created"
        );

        let (rendered, handle) = self.present(&vzp).await;
        vzp.presentation = handle;
        self.persist().await;
        Ok((vzp, rendered))
    }

    /// Returns an active event.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] if no active event has this id.
    pub async fn get(&self, id: &VzpId) -> Result<Vzp, VzpError> {
        self.store.get(id).await
    }

    /// Returns the archive entry of a closed event.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] if the id is not archived.
    pub async fn archived(&self, id: &VzpId) -> Result<ArchivedVzp, VzpError> {
        self.store
            .archived(id)
            .await
            .ok_or_else(|| VzpError::vzp_not_found(id))
    }

    /// Renders an active event without presenting it.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] if no active event has this id.
    pub async fn rendered(&self, id: &VzpId) -> Result<RenderedVzp, VzpError> {
        let vzp = self.store.get(id).await?;
        Ok(render(&vzp, &self.display_names(&vzp).await))
    }

    /// Returns summaries of all active events in creation order.
    pub async fn list(&self) -> Vec<VzpSummary> {
        self.store.list_active().await
    }

    /// Handles a join-button press according to the configured
    /// [`JoinPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::VzpNotFound`] for an unknown id and
    /// [`VzpError::Precondition`] if sign-ups are closed, the member has no
    /// tier role, is already listed (add-only mode) or the roster is full.
    pub async fn press_join(&self, id: &VzpId, user: UserId) -> Result<JoinOutcome, VzpError> {
        let tier = self.resolve_tier(user).await?;
        let (change, vzp) = match self.config.join_policy {
            JoinPolicy::Toggle => self.store.toggle(id, user, tier).await?,
            JoinPolicy::AddOnly => {
                let vzp = self.store.join(id, user, tier).await?;
                let joined = vzp.roster.get(&user).copied().or(tier);
                match joined {
                    Some(tier) => (RosterChange::Joined(tier), vzp),
                    None => return Err(VzpError::Internal("joined without a tier".to_string())),
                }
            }
        };

        let (kind, tier) = match change {
            RosterChange::Joined(tier) => (RosterChangeKind::Joined, Some(tier)),
            RosterChange::Left => (RosterChangeKind::Left, None),
        };
        self.publish_roster_change(&vzp, user, kind, tier);
        tracing::info!(vzp_id = %id, %user, ?change, filled = vzp.filled(), "join pressed");

        self.present(&vzp).await;
        self.persist().await;

        if self.config.join_policy == JoinPolicy::AddOnly {
            let notice = self
                .participant_notice(&vzp, "Signed up", "You are on the list for this VZP.");
            self.notify(&[user], &notice).await;
        }
        Ok(JoinOutcome { change, vzp })
    }

    /// Removes a member on their own request.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::Precondition`] in add-only mode, if sign-ups are
    /// closed or the member is not listed, and [`VzpError::VzpNotFound`]
    /// for an unknown id.
    pub async fn leave(&self, id: &VzpId, user: UserId) -> Result<Vzp, VzpError> {
        if self.config.join_policy == JoinPolicy::AddOnly {
            return Err(VzpError::Precondition(
                "leaving is only possible through an operator".to_string(),
            ));
        }
        let vzp = self.store.leave(id, user).await?;
        self.publish_roster_change(&vzp, user, RosterChangeKind::Left, None);
        tracing::info!(vzp_id = %id, %user, filled = vzp.filled(), "member left");

        self.present(&vzp).await;
        self.persist().await;
        Ok(vzp)
    }

    /// Locks the list: `OPEN` to `LIST_LOCKED`.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::InvalidTransition`] unless the event is `OPEN`.
    pub async fn lock(&self, id: &VzpId) -> Result<StatusChange, VzpError> {
        self.change_status(id, Status::ListLocked).await
    }

    /// Unlocks the list: `LIST_LOCKED` to `OPEN`.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::InvalidTransition`] unless the event is
    /// `LIST_LOCKED`.
    pub async fn unlock(&self, id: &VzpId) -> Result<StatusChange, VzpError> {
        self.change_status(id, Status::Open).await
    }

    async fn change_status(&self, id: &VzpId, target: Status) -> Result<StatusChange, VzpError> {
        let change = self.store.set_status(id, target).await?;
        self.publish_status_change(&change);
        tracing::info!(vzp_id = %id, from = %change.from, to = %change.to, "status changed");

        self.present(&change.vzp).await;
        self.persist().await;
        Ok(change)
    }

    /// Starts an event: opens a space for every participant, moves the
    /// event to `IN_PROGRESS` and notifies the participants.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::InvalidTransition`] unless the event is `OPEN` or
    /// `LIST_LOCKED`, and [`VzpError::ExternalCollaborator`] if the space
    /// could not be opened. State is unchanged on error.
    pub async fn start(&self, id: &VzpId) -> Result<StartReport, VzpError> {
        let vzp = self.store.check_transition(id, Status::InProgress).await?;
        let members = vzp.participants();
        let space = self.collaborators.spaces.open(id, &members).await?;

        let change = match self.store.start(id, space.clone()).await {
            Ok(change) => change,
            Err(err) => {
                if let Err(release) = self.collaborators.spaces.close(id, &space).await {
                    tracing::warn!(
                        vzp_id = %id,
                        error = %release,
                        "failed to release space after aborted start"
                    );
                }
                return Err(err);
            }
        };
        self.publish_status_change(&change);

        // The roster may have moved while the space was being opened.
        let participants = change.vzp.participants();
        for &user in participants.iter().filter(|u| !members.contains(u)) {
            self.set_space_access(id, &space, user, true).await;
        }
        for &user in members.iter().filter(|u| !participants.contains(u)) {
            self.set_space_access(id, &space, user, false).await;
        }
        tracing::info!(
            vzp_id = %id,
            space = space.as_str(),
            participants = participants.len(),
            "vzp started"
        );

        self.present(&change.vzp).await;
        self.persist().await;

        let notice = self.participant_notice(
            &change.vzp,
            "VZP started",
            "The VZP has started. Join the voice channel.",
        );
        let delivery = self.notify(&participants, &notice).await;
        Ok(StartReport {
            vzp: change.vzp,
            space,
            delivery,
        })
    }

    /// Closes an event, archives it and releases its space.
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
    ) -> Result<CloseReport, VzpError> {
        let ClosedVzp {
            vzp,
            previous,
            archived,
        } = self.store.close(id, outcome, opponent).await?;

        let _ = self.event_bus.publish(VzpEvent::StatusChanged {
            vzp_id: id.clone(),
            from: previous,
            to: Status::Closed,
            timestamp: Utc::now(),
        });
        let _ = self.event_bus.publish(VzpEvent::VzpClosed {
            vzp_id: id.clone(),
            outcome,
            participants: archived.participants,
            timestamp: Utc::now(),
        });
        tracing::info!(
            vzp_id = %id,
            from = %previous,
            outcome = ?outcome,
            participants = archived.participants,
            "vzp closed"
        );

        let (rendered, _) = self.present(&vzp).await;

        let channels_released = match &vzp.space {
            Some(space) => match self.collaborators.spaces.close(id, space).await {
                Ok(count) => count,
                Err(err) => {
                    tracing::warn!(vzp_id = %id, error = %err, "failed to release space");
                    0
                }
            },
            None => 0,
        };
        self.persist().await;

        let body = match outcome {
            Some(result) => format!("The VZP is over. Result: {}.", result.label()),
            None => "The VZP is over.".to_string(),
        };
        let notice = self.participant_notice(&vzp, "VZP closed", body);
        let delivery = self.notify(&vzp.participants(), &notice).await;

        Ok(CloseReport {
            archived,
            rendered,
            channels_released,
            delivery,
        })
    }

    /// Replaces roster member `old` with `new` and notifies both.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::ParticipantNotFound`] if `old` is not listed and
    /// [`VzpError::Precondition`] if `new` cannot be a replacement.
    pub async fn swap(
        &self,
        id: &VzpId,
        old: UserId,
        new: UserId,
    ) -> Result<RosterEditReport, VzpError> {
        let tier = self.resolve_tier(new).await?;
        let vzp = self.store.swap(id, old, new, tier).await?;

        let _ = self.event_bus.publish(VzpEvent::PlayerSwapped {
            vzp_id: id.clone(),
            replaced: old,
            replacement: new,
            timestamp: Utc::now(),
        });
        tracing::info!(vzp_id = %id, replaced = %old, replacement = %new, "player swapped");

        if let Some(space) = &vzp.space {
            self.set_space_access(id, space, old, false).await;
            self.set_space_access(id, space, new, true).await;
        }
        self.present(&vzp).await;
        self.persist().await;

        let names = self.display_names(&vzp).await;
        let name = |user: UserId| names.get(&user).cloned().unwrap_or_else(|| user.mention());
        let to_old = Notice::new("You were replaced", format!("Your replacement: {}", name(new)))
            .for_vzp(id)
            .field("VZP ID", id.as_str());
        let to_new = self.participant_notice(
            &vzp,
            "You replaced a player",
            format!("You replaced {}", name(old)),
        );
        let mut delivery = self.notify(&[old], &to_old).await;
        let second = self.notify(&[new], &to_new).await;
        delivery.delivered += second.delivered;
        delivery.recipients += second.recipients;

        Ok(RosterEditReport { vzp, delivery })
    }

    /// Removes a member by operator action and notifies them.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::ParticipantNotFound`] if the member is neither
    /// listed nor part of a swap.
    pub async fn remove(&self, id: &VzpId, user: UserId) -> Result<RosterEditReport, VzpError> {
        let vzp = self.store.admin_remove(id, user).await?;
        self.publish_roster_change(&vzp, user, RosterChangeKind::Removed, None);
        tracing::info!(vzp_id = %id, %user, filled = vzp.filled(), "member removed");

        if let Some(space) = &vzp.space {
            self.set_space_access(id, space, user, false).await;
        }
        self.present(&vzp).await;
        self.persist().await;

        let notice = Notice::new("You were removed from the list", "Removed by an operator.")
            .for_vzp(id)
            .field("VZP ID", id.as_str());
        let delivery = self.notify(&[user], &notice).await;
        Ok(RosterEditReport { vzp, delivery })
    }

    /// Posts the ping headline followed by the configured number of
    /// `@everyone` pings.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::ExternalCollaborator`] if the headline could not
    /// be posted. Failed pings after it are only counted.
    pub async fn broadcast_ping(&self) -> Result<DeliveryReport, VzpError> {
        let notifier = &self.collaborators.notifier;
        notifier.broadcast(&self.config.ping_message).await?;

        let mut report = DeliveryReport {
            delivered: 1,
            recipients: 1,
        };
        for _ in 0..self.config.ping_repeat {
            pause(self.config.ping_interval).await;
            report.recipients += 1;
            match notifier.broadcast("@everyone").await {
                Ok(()) => report.delivered += 1,
                Err(err) => tracing::warn!(error = %err, "ping failed"),
            }
        }
        tracing::info!(delivered = report.delivered, "ping broadcast");
        Ok(report)
    }

    /// Drops archive entries older than the retention window. Returns the
    /// number removed.
    pub async fn cleanup(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::days(self.config.archive_retention_days);
        let pruned = self.store.prune_archive(cutoff).await;
        if pruned > 0 {
            self.persist().await;
        }
        tracing::info!(pruned, "archive cleanup");
        pruned
    }

    async fn resolve_tier(&self, user: UserId) -> Result<Option<Tier>, VzpError> {
        let profile = self.collaborators.directory.member(user).await?;
        Ok(profile.and_then(|p| self.config.tier_roles.resolve(&p.roles)))
    }

    async fn display_names(&self, vzp: &Vzp) -> DisplayNames {
        let mut names = DisplayNames::new();
        for user in vzp.referenced_users() {
            if let Ok(Some(profile)) = self.collaborators.directory.member(user).await {
                names.insert(user, profile.display_name);
            }
        }
        names
    }

    /// Renders and presents an event. Returns the payload and the post
    /// handle, recording the handle when the post is new.
    async fn present(&self, vzp: &Vzp) -> (RenderedVzp, Option<PresentationHandle>) {
        let rendered = render(vzp, &self.display_names(vzp).await);
        let existing = vzp.presentation.as_ref();
        match self
            .collaborators
            .presenter
            .present(&vzp.id, &rendered, existing)
            .await
        {
            Ok(handle) => {
                if existing.is_none()
                    && vzp.status.is_active()
                    && let Err(err) = self
                        .store
                        .attach_presentation(&vzp.id, handle.clone())
                        .await
                {
                    tracing::warn!(vzp_id = %vzp.id, error = %err, "failed to record presentation");
                }
                (rendered, Some(handle))
            }
            Err(err) => {
                tracing::warn!(vzp_id = %vzp.id, error = %err, "failed to present vzp");
                (rendered, existing.cloned())
            }
        }
    }

    async fn persist(&self) {
        if let Err(err) = self.snapshots.save(&self.store).await {
            tracing::warn!(error = %err, "failed to persist snapshot");
        }
    }

    /// Sends `notice` to each user in turn, pausing between sends.
    async fn notify(&self, users: &[UserId], notice: &Notice) -> DeliveryReport {
        let mut report = DeliveryReport {
            delivered: 0,
            recipients: users.len(),
        };
        for (i, &user) in users.iter().enumerate() {
            if i > 0 {
                pause(self.config.notify_pacing).await;
            }
            match self.collaborators.notifier.send_direct(user, notice).await {
                Ok(()) => report.delivered += 1,
                Err(err) => tracing::warn!(%user, error = %err, "direct message failed"),
            }
        }
        if report.recipients > 0 {
            tracing::debug!(
                delivered = report.delivered,
                recipients = report.recipients,
                title = %notice.title,
                "notifications sent"
            );
        }
        report
    }

    async fn set_space_access(
        &self,
        id: &VzpId,
        space: &SpaceHandle,
        user: UserId,
        granted: bool,
    ) {
        if let Err(err) = self
            .collaborators
            .spaces
            .set_access(id, space, user, granted)
            .await
        {
            tracing::warn!(
                vzp_id = %id,
                %user,
                granted,
                error = %err,
                "failed to update space access"
            );
        }
    }

    fn participant_notice(&self, vzp: &Vzp, title: &str, body: impl Into<String>) -> Notice {
        Notice::new(title, body)
            .for_vzp(&vzp.id)
            .field("VZP ID", vzp.id.as_str())
            .field("Time", vzp.schedule.as_str())
            .field("Opponent", vzp.opponent.as_str())
    }

    fn publish_roster_change(
        &self,
        vzp: &Vzp,
        user: UserId,
        change: RosterChangeKind,
        tier: Option<Tier>,
    ) {
        let _ = self.event_bus.publish(VzpEvent::RosterChanged {
            vzp_id: vzp.id.clone(),
            user_id: user,
            change,
            tier,
            filled: vzp.filled(),
            capacity: vzp.capacity,
            timestamp: Utc::now(),
        });
    }

    fn publish_status_change(&self, change: &StatusChange) {
        let _ = self.event_bus.publish(VzpEvent::StatusChanged {
            vzp_id: change.vzp.id.clone(),
            from: change.from,
            to: change.to,
            timestamp: Utc::now(),
        });
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
