//! Economy parameters for probe actions and lifecycle.
//!
//! These values mirror the `economy` section of `replicator-config.yaml`.
//! Every field has a default, so an empty section (or none at all) yields
//! the standard economy.

use replicator_types::{Capabilities, ResourceVector};
use serde::Deserialize;

/// Tunable costs, rates, and starting inventories.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EconomyConfig {
    /// Energy each active probe gains at the start of every tick (default: 20).
    #[serde(default = "default_solar_income")]
    pub solar_income: u64,

    /// Energy spent per AU travelled (default: 2).
    #[serde(default = "default_energy_per_distance")]
    pub energy_per_distance: f64,

    /// Maximum distance in AU at which a body can be harvested (default: 1.0).
    #[serde(default = "default_harvest_proximity")]
    pub harvest_proximity: f64,

    /// Longest allowed harvest in cycles (default: 100).
    #[serde(default = "default_max_harvest_duration")]
    pub max_harvest_duration: u32,

    /// Resources consumed by manufacturing one child probe.
    #[serde(default = "default_replication_cost")]
    pub replication_cost: ResourceVector,

    /// Inventory every newly manufactured probe starts with.
    #[serde(default = "default_child_starting_resources")]
    pub child_starting_resources: ResourceVector,

    /// Inventory of the generation-0 seed probe.
    #[serde(default = "default_seed_probe_resources")]
    pub seed_probe_resources: ResourceVector,

    /// Capabilities of the seed probe, inherited by its descendants.
    #[serde(default = "default_seed_capabilities")]
    pub seed_capabilities: Capabilities,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            solar_income: default_solar_income(),
            energy_per_distance: default_energy_per_distance(),
            harvest_proximity: default_harvest_proximity(),
            max_harvest_duration: default_max_harvest_duration(),
            replication_cost: default_replication_cost(),
            child_starting_resources: default_child_starting_resources(),
            seed_probe_resources: default_seed_probe_resources(),
            seed_capabilities: default_seed_capabilities(),
        }
    }
}

const fn default_solar_income() -> u64 {
    20
}

const fn default_energy_per_distance() -> f64 {
    2.0
}

const fn default_harvest_proximity() -> f64 {
    1.0
}

const fn default_max_harvest_duration() -> u32 {
    100
}

const fn default_replication_cost() -> ResourceVector {
    ResourceVector::new(500, 200, 100, 50, 10)
}

const fn default_child_starting_resources() -> ResourceVector {
    ResourceVector::energy(100)
}

const fn default_seed_probe_resources() -> ResourceVector {
    ResourceVector::new(1000, 500, 300, 200, 50)
}

const fn default_seed_capabilities() -> Capabilities {
    Capabilities {
        max_speed: 0.5,
        harvest_rate: 10,
        sensor_range: 2.0,
        communication_range: 5.0,
        storage_capacity: 10_000,
    }
}
