//! Read-only operator status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use replicator_types::{ResourceVector, SolarSystem, WorldState};
use serde::Serialize;

/// Population, inventory and durability at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationStatus {
    /// Last completed tick.
    pub tick: u64,
    /// When the simulation first started.
    pub started_at: DateTime<Utc>,
    /// Seconds elapsed since `started_at`.
    pub uptime_seconds: u64,
    /// Every probe ever built, destroyed ones included.
    pub total_probes: usize,
    /// Non-destroyed probes.
    pub active_probes: usize,
    /// Probe count per generation.
    pub probes_by_generation: BTreeMap<u32, usize>,
    /// Probe count per status name.
    pub probes_by_status: BTreeMap<String, usize>,
    /// Sum of every probe's inventory.
    pub total_resources: ResourceVector,
    /// Known systems.
    pub system_count: usize,
    /// Bodies across all systems, stars included.
    pub body_count: usize,
    /// Whether the last snapshot write failed.
    pub durability_degraded: bool,
}

impl SimulationStatus {
    /// Summarize `state` as of `now`.
    pub fn from_state(state: &WorldState, durability_degraded: bool, now: DateTime<Utc>) -> Self {
        let mut probes_by_generation: BTreeMap<u32, usize> = BTreeMap::new();
        let mut probes_by_status: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_resources = ResourceVector::ZERO;

        for probe in state.probes.values() {
            let generation = probes_by_generation.entry(probe.generation).or_default();
            *generation = generation.saturating_add(1);
            let status = probes_by_status
                .entry(probe.status.as_str().to_owned())
                .or_default();
            *status = status.saturating_add(1);
            total_resources = total_resources.saturating_add(probe.resources);
        }

        let uptime_seconds = u64::try_from(
            now.signed_duration_since(state.started_at)
                .num_seconds()
                .max(0),
        )
        .unwrap_or_default();

        Self {
            tick: state.tick,
            started_at: state.started_at,
            uptime_seconds,
            total_probes: state.probes.len(),
            active_probes: state.live_probe_ids().len(),
            probes_by_generation,
            probes_by_status,
            total_resources,
            system_count: state.systems.len(),
            body_count: state.systems.values().map(SolarSystem::body_count).sum(),
            durability_degraded,
        }
    }
}
