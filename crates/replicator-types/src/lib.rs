//! Shared type definitions for the Replicator simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the workspace: probes, solar systems, celestial bodies, resource vectors,
//! experience records, and the closed set of actions a probe can take.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for probes, systems, and bodies
//! - [`resources`] -- The five-field [`ResourceVector`] and its arithmetic
//! - [`enums`] -- Probe status, body category, priority, and event tags
//! - [`structs`] -- Core entity structs and the full [`WorldState`]
//! - [`actions`] -- Action proposals, typed outcomes, and the result envelope

pub mod actions;
pub mod enums;
pub mod ids;
pub mod resources;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{ActionOutcome, ActionProposal, ActionResult, FailureReason, ProbeAction};
pub use enums::{ActionKind, BodyKind, EventTag, Priority, ProbeStatus};
pub use ids::{BodyId, ProbeId, SystemId};
pub use resources::{ResourceKind, ResourceVector};
pub use structs::{
    Capabilities, CelestialBody, Discovery, Experience, Position, Probe, ProbeMemory, SolarSystem,
    WorldState,
};
