//! Seed and child probe factories.
//!
//! The seed probe is the single generation-0 probe of a fresh simulation;
//! it has a fixed id so the seed state is reproducible. Every other probe
//! is built by [`build_child`] during a manufacture action.

use chrono::{DateTime, Utc};
use replicator_types::{Probe, ProbeId, ProbeMemory, ProbeStatus};
use replicator_world::{SeedIds, seed_position};

use crate::config::EconomyConfig;
use crate::error::ActionError;
use crate::memory;

/// Fixed id of the generation-0 seed probe.
pub const SEED_PROBE_ID: ProbeId = ProbeId::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_1000);

/// Display name of the seed probe.
pub const SEED_PROBE_NAME: &str = "Bob";

/// Build the seed probe on the first body of the seed system.
pub fn seed_probe(economy: &EconomyConfig, now: DateTime<Utc>) -> Probe {
    let mut memory = ProbeMemory::default();
    memory.visited_systems.insert(SeedIds::SYSTEM);

    Probe {
        id: SEED_PROBE_ID,
        name: SEED_PROBE_NAME.to_owned(),
        status: ProbeStatus::Active,
        position: seed_position(),
        system_id: SeedIds::SYSTEM,
        resources: economy.seed_probe_resources,
        capabilities: economy.seed_capabilities,
        memory,
        parent_id: None,
        generation: 0,
        created_at: now,
    }
}

/// Build a child of `parent` at the parent's position.
///
/// The child gets a fresh id, the fixed starting inventory, the parent's
/// capabilities, and an inherited copy of the parent's memory. The caller
/// charges the replication cost and inserts the child.
///
/// # Errors
///
/// Returns [`ActionError::InvariantViolation`] if the generation counter
/// would overflow.
pub fn build_child(
    parent: &Probe,
    name: &str,
    economy: &EconomyConfig,
    now: DateTime<Utc>,
) -> Result<Probe, ActionError> {
    let generation = parent
        .generation
        .checked_add(1)
        .ok_or_else(|| ActionError::invariant("generation overflow"))?;

    Ok(Probe {
        id: ProbeId::new(),
        name: name.trim().to_owned(),
        status: ProbeStatus::Active,
        position: parent.position,
        system_id: parent.system_id,
        resources: economy.child_starting_resources,
        capabilities: parent.capabilities,
        memory: memory::inherit(parent),
        parent_id: Some(parent.id),
        generation,
        created_at: now,
    })
}
