//! Space, celestial bodies, and the seed system for the Replicator simulation.
//!
//! This crate models the spatial side of the world: Euclidean distance with
//! a single configurable AU scale, body ranking across systems, stock
//! extraction, and the deterministic seed system every new simulation
//! starts from.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world operations.
//! - [`geometry`] -- [`DistanceScale`] and the raw-unit to AU conversion
//!   used by every range check and cost.
//! - [`bodies`] -- Nearby-body ranking and stock extraction.
//! - [`starting_world`] -- The seed system: one star and five bodies with
//!   fixed starting stock.

pub mod bodies;
pub mod error;
pub mod geometry;
pub mod starting_world;

// Re-export primary types at crate root.
pub use bodies::{NearbyBody, extractable, nearby_bodies, withdraw};
pub use error::WorldError;
pub use geometry::{DistanceScale, ceil_to_u64, euclidean};
pub use starting_world::{SeedIds, create_seed_system, seed_position};
