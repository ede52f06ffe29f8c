//! Per-connection subscription manager.
//!
//! Tracks which event ids a WebSocket client is subscribed to and
//! provides server-side filtering of bus traffic.

use std::collections::HashSet;

use crate::domain::VzpId;

/// Manages the set of event subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed event ids. If `subscribe_all` is true, this set is ignored.
    vzp_ids: HashSet<VzpId>,
    /// Whether the client subscribes to every event (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds event ids to the subscription set.
    pub fn subscribe(&mut self, ids: &[VzpId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.vzp_ids.extend(ids.iter().cloned());
    }

    /// Removes event ids from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[VzpId]) {
        for id in ids {
            self.vzp_ids.remove(id);
        }
    }

    /// Returns `true` if an event concerning `vzp_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, vzp_id: &VzpId) -> bool {
        self.subscribe_all || self.vzp_ids.contains(vzp_id)
    }

    /// Returns the number of explicitly subscribed event ids.
    #[must_use]
    pub fn count(&self) -> usize {
        self.vzp_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
