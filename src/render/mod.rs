//! Derivation of the posted event representation from store state.
//!
//! [`render`] is a pure function: it reads a [`Vzp`] snapshot and a map of
//! known display names and returns a [`RenderedVzp`]. Nothing is cached
//! between calls, so rendering the same state twice yields the same
//! payload and the post can be refreshed from the store at any time.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Tier, UserId, Vzp, VzpSummary};

/// Display names known for the members an event refers to.
pub type DisplayNames = HashMap<UserId, String>;

/// Placeholder for an empty tier section.
pub const EMPTY_SECTION: &str = "—";

/// One tier group of the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TierSection {
    /// Section title, e.g. `"TIER 1 (4)"`.
    pub title: String,
    /// One bullet line per member, or a single placeholder line.
    pub lines: Vec<String>,
}

/// Display payload for one event post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RenderedVzp {
    /// `"{MODE} vs {opponent} {filled}/{capacity} {schedule}"`.
    pub headline: String,
    /// Comma-separated condition labels.
    pub conditions: String,
    /// `"a + b + c"` caliber labels.
    pub loadout: String,
    /// Banner color (RGB).
    pub color: u32,
    /// Roster grouped by tier, tiers 1 to 3 in order.
    pub tiers: Vec<TierSection>,
    /// `"replacement → replaced"` lines; empty when no swaps.
    pub swaps: Vec<String>,
    /// Status banner text.
    pub status_label: String,
    /// Event identifier shown in the footer.
    pub footer: String,
    /// Whether the join button is shown.
    pub join_enabled: bool,
}

/// Renders an event snapshot.
#[must_use]
pub fn render(vzp: &Vzp, names: &DisplayNames) -> RenderedVzp {
    let name = |user: UserId| {
        names
            .get(&user)
            .cloned()
            .unwrap_or_else(|| user.mention())
    };

    let tiers = Tier::ALL
        .iter()
        .map(|&tier| {
            let lines: Vec<String> = vzp
                .roster
                .iter()
                .filter(|&(_, &t)| t == tier)
                .map(|(&user, _)| format!("• {}", name(user)))
                .collect();
            TierSection {
                title: format!("{tier} ({})", lines.len()),
                lines: if lines.is_empty() {
                    vec![EMPTY_SECTION.to_string()]
                } else {
                    lines
                },
            }
        })
        .collect();

    let swaps = vzp
        .swaps
        .iter()
        .map(|(&replaced, &replacement)| format!("• {} → {}", name(replacement), name(replaced)))
        .collect();

    RenderedVzp {
        headline: format!(
            "{} vs {} {}/{} {}",
            vzp.mode.label(),
            vzp.opponent,
            vzp.filled(),
            vzp.capacity,
            vzp.schedule
        ),
        conditions: vzp
            .conditions
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", "),
        loadout: loadout_line(vzp),
        color: vzp.status.color(),
        tiers,
        swaps,
        status_label: vzp.status.label().to_string(),
        footer: vzp.id.to_string(),
        join_enabled: vzp.status.accepts_joins(),
    }
}

/// One-line description of an active event for listings.
#[must_use]
pub fn summary_line(summary: &VzpSummary) -> String {
    format!(
        "{} [{}] {} vs {} {}/{} {}",
        summary.id,
        summary.status.label(),
        summary.mode.label(),
        summary.opponent,
        summary.filled,
        summary.capacity,
        summary.schedule
    )
}

fn loadout_line(vzp: &Vzp) -> String {
    vzp.loadout
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(" + ")
}
