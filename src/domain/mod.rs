//! Domain layer: core types, the event store, and the event system.
//!
//! This module contains the event model (identifiers, vocabularies,
//! status machine, the [`Vzp`] aggregate), the [`VzpStore`] that owns all
//! event state, and the [`EventBus`] broadcasting every change.

pub mod catalog;
pub mod event_bus;
pub mod status;
pub mod vzp;
pub mod vzp_event;
pub mod vzp_id;
pub mod vzp_store;

pub use catalog::{Caliber, Condition, Mode, Outcome, Tier};
pub use event_bus::EventBus;
pub use status::Status;
pub use vzp::{ArchivedVzp, NewVzp, PresentationHandle, SpaceHandle, Vzp, VzpSummary};
pub use vzp_event::{RosterChangeKind, VzpEvent};
pub use vzp_id::{RoleId, UserId, VzpId};
pub use vzp_store::{ClosedVzp, RosterChange, StatusChange, StoreLimits, StoreSnapshot, VzpStore};
