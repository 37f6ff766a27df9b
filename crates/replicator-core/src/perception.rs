//! Decision context assembly.
//!
//! Before a probe decides, the pipeline builds a [`DecisionRequest`] from
//! a consistent read of the store: the probe itself, the bodies around it
//! ranked by distance with the closest one singled out, and a bounded slice
//! of its memory. Only the recent window of experiences travels with the
//! request; the full log stays in the store.

use replicator_types::{Experience, Probe, SystemId, WorldState};
use replicator_world::{DistanceScale, NearbyBody, nearby_bodies};
use serde::Serialize;

use crate::config::PipelineConfig;

/// What a probe can see from where it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    /// The system the probe is in.
    pub system_id: SystemId,
    /// That system's name, if the system is known.
    pub system_name: Option<String>,
    /// Bodies by ascending distance.
    pub nearby: Vec<NearbyBody>,
    /// The closest body, highlighted for the decision provider.
    pub closest: Option<NearbyBody>,
}

impl Environment {
    /// Nearby bodies that still hold any stock.
    pub fn with_stock(&self) -> impl Iterator<Item = &NearbyBody> {
        self.nearby.iter().filter(|body| !body.resources.is_empty())
    }
}

/// Everything a decision provider is given for one probe and one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRequest {
    /// The tick being decided.
    pub tick: u64,
    /// The probe, with its experience log cut to the recent window.
    pub probe: Probe,
    /// The probe's surroundings.
    pub environment: Environment,
    /// The most recent experiences, oldest first.
    pub recent_experiences: Vec<Experience>,
    /// The most recent failures, oldest first.
    pub recent_failures: Vec<Experience>,
    /// Most proposals that will be executed.
    pub max_actions: usize,
}

/// Rank the bodies around `probe`.
pub fn assemble_environment(
    state: &WorldState,
    probe: &Probe,
    scale: DistanceScale,
    limit: usize,
) -> Environment {
    let nearby = nearby_bodies(state, &probe.position, scale, limit);
    Environment {
        system_id: probe.system_id,
        system_name: state
            .systems
            .get(&probe.system_id)
            .map(|system| system.name.clone()),
        closest: nearby.first().cloned(),
        nearby,
    }
}

/// Build the bounded decision context for `probe`.
pub fn build_request(
    state: &WorldState,
    probe: &Probe,
    tick: u64,
    config: &PipelineConfig,
    scale: DistanceScale,
) -> DecisionRequest {
    let recent_experiences = probe
        .memory
        .recent(config.recent_experience_window)
        .to_vec();
    let recent_failures = probe.memory.recent_failures(config.failure_context_window);

    let mut bounded = probe.clone();
    bounded.memory.experiences.clone_from(&recent_experiences);

    DecisionRequest {
        tick,
        environment: assemble_environment(state, probe, scale, config.nearby_body_limit),
        probe: bounded,
        recent_experiences,
        recent_failures,
        max_actions: config.max_actions,
    }
}
