//! On-disk document shapes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::{ArchivedVzp, StoreSnapshot, UserId, Vzp, VzpId};

/// File name of the event document.
pub const VZP_DATA_FILE: &str = "vzp_data.json";

/// File name of the swap document.
pub const SWAP_DATA_FILE: &str = "swap_data.json";

/// Swap records keyed by event id, then replaced member.
pub type SwapDocument = IndexMap<VzpId, IndexMap<UserId, UserId>>;

/// Contents of `vzp_data.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VzpDocument {
    /// Active events by id, in creation order.
    #[serde(default)]
    pub active: IndexMap<VzpId, Vzp>,
    /// Archive summaries by id.
    #[serde(default)]
    pub closed: IndexMap<VzpId, ArchivedVzp>,
}

/// Splits a store snapshot into its two documents.
#[must_use]
pub fn to_documents(snapshot: &StoreSnapshot) -> (VzpDocument, SwapDocument) {
    let swaps = snapshot
        .active
        .iter()
        .filter(|(_, vzp)| !vzp.swaps.is_empty())
        .map(|(id, vzp)| (id.clone(), vzp.swaps.clone()))
        .collect();
    let doc = VzpDocument {
        active: snapshot.active.clone(),
        closed: snapshot.archive.clone(),
    };
    (doc, swaps)
}

/// Merges the two documents back into a store snapshot. Swap records of
/// events that are no longer active are dropped.
#[must_use]
pub fn from_documents(doc: VzpDocument, mut swaps: SwapDocument) -> StoreSnapshot {
    let active = doc
        .active
        .into_iter()
        .map(|(id, mut vzp)| {
            if let Some(record) = swaps.shift_remove(&id) {
                vzp.swaps = record;
            }
            (id, vzp)
        })
        .collect();
    if !swaps.is_empty() {
        tracing::warn!(orphaned = swaps.len(), "dropping swap records of inactive events");
    }
    StoreSnapshot {
        active,
        archive: doc.closed,
    }
}
