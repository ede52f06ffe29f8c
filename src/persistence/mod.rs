//! Persistence layer: full-snapshot JSON documents.
//!
//! The whole store is written after every mutation to two documents in
//! the data directory: `vzp_data.json` (active events and the archive)
//! and `swap_data.json` (swap records of active events). Both are reread
//! once at startup.

pub mod models;
pub mod snapshot;

pub use snapshot::SnapshotStore;
