//! Snapshot persistence for the Replicator simulation.
//!
//! The entity store keeps the whole simulation in memory and hands a full
//! [`WorldState`](replicator_types::WorldState) clone to a
//! [`SnapshotStore`] after mutations and at the end of every tick. A
//! snapshot is a single self-describing JSON document; there is no query
//! layer.
//!
//! # Modules
//!
//! - [`snapshot_store`] -- The [`SnapshotStore`] capability with a JSON file
//!   backend and an in-memory backend for tests.
//! - [`error`] -- Shared error types

pub mod error;
pub mod snapshot_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use snapshot_store::{JsonFileSnapshotStore, MemorySnapshotStore, SnapshotStore};
