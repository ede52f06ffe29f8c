//! Service layer: command orchestration.
//!
//! [`VzpService`] validates commands against the store, emits events
//! through the [`super::domain::EventBus`], refreshes the event post and
//! persists the result.

pub mod vzp_service;

pub use vzp_service::{
    CloseReport, DeliveryReport, JoinOutcome, RosterEditReport, StartReport, VzpService,
};
