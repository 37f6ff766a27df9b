//! Probe economy, lifecycle, and action execution for the Replicator
//! simulation.
//!
//! This crate contains the logic layer for probes: everything that operates
//! on probe and world state without touching I/O or locks. It sits between
//! `replicator-types` (the data model) and `replicator-core` (the entity
//! store and the tick scheduler), which calls in here while holding the
//! store's write lock.
//!
//! # Modules
//!
//! - [`actions`] -- Validation and execution of every action kind.
//! - [`config`] -- Economy parameters ([`EconomyConfig`]).
//! - [`error`] -- Error types for action execution ([`ActionError`]).
//! - [`income`] -- Passive solar income.
//! - [`inventory`] -- Storage capacity checks and checked deposits/spends.
//! - [`memory`] -- Experience records and memory inheritance.
//! - [`probe`] -- Seed and child probe factories.

pub mod actions;
pub mod config;
pub mod error;
pub mod income;
pub mod inventory;
pub mod memory;
pub mod probe;

// Re-export primary types at crate root for convenience.
pub use actions::{ActionContext, execute_action};
pub use config::EconomyConfig;
pub use error::ActionError;
pub use income::apply_solar_income;
pub use probe::{SEED_PROBE_ID, build_child, seed_probe};
