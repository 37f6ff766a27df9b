//! Execution handlers that commit a validated [`ActionPlan`].
//!
//! Each handler computes every new value first and only then assigns, so an
//! invariant violation discovered halfway leaves the world untouched. The
//! transient statuses (traveling, harvesting, manufacturing) are entered
//! and left inside the same call; no other observer can see them because
//! the caller holds the store's write lock.

use replicator_types::{ActionOutcome, EventTag, Probe, ProbeId, ProbeStatus, WorldState};
use replicator_world::{WorldError, withdraw};
use serde_json::json;
use tracing::info;

use super::ActionContext;
use super::validation::{ActionPlan, HarvestPlan, ManufacturePlan, ScanPlan, TravelPlan};
use crate::error::ActionError;
use crate::{inventory, memory, probe};

/// Apply a validated plan for `probe_id`.
///
/// # Errors
///
/// Returns [`ActionError::ProbeNotFound`] if the probe vanished,
/// [`ActionError::World`] if a referenced body vanished, and
/// [`ActionError::InvariantViolation`] if checked arithmetic fails.
pub fn apply_plan(
    state: &mut WorldState,
    probe_id: ProbeId,
    plan: ActionPlan,
    ctx: &ActionContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    match plan {
        ActionPlan::Travel(plan) => {
            let probe = probe_mut(state, probe_id)?;
            apply_travel(probe, &plan)
        }
        ActionPlan::Scan(plan) => {
            let probe = probe_mut(state, probe_id)?;
            Ok(apply_scan(probe, plan))
        }
        ActionPlan::Harvest(plan) => apply_harvest(state, probe_id, &plan),
        ActionPlan::Manufacture(plan) => apply_manufacture(state, probe_id, plan, ctx),
        ActionPlan::Wait => Ok(ActionOutcome::Waited),
        ActionPlan::Explore => Ok(ActionOutcome::Explored),
    }
}

fn probe_mut(state: &mut WorldState, probe_id: ProbeId) -> Result<&mut Probe, ActionError> {
    state
        .probes
        .get_mut(&probe_id)
        .ok_or(ActionError::ProbeNotFound(probe_id))
}

/// Spend the trip's energy and move.
pub fn apply_travel(probe: &mut Probe, plan: &TravelPlan) -> Result<ActionOutcome, ActionError> {
    let remaining = probe
        .resources
        .energy
        .checked_sub(plan.energy_cost)
        .ok_or_else(|| ActionError::invariant("travel energy underflow"))?;

    probe.status = ProbeStatus::Traveling;
    probe.resources.energy = remaining;
    probe.position = plan.to;
    probe.status = ProbeStatus::Active;

    Ok(ActionOutcome::Traveled {
        from: plan.from,
        to: plan.to,
        distance_au: plan.distance_au,
        energy_spent: plan.energy_cost,
        travel_time: plan.travel_time,
    })
}

/// Remember a body's stock and mark its system as surveyed.
pub fn apply_scan(probe: &mut Probe, plan: ScanPlan) -> ActionOutcome {
    probe
        .memory
        .discovered_resources
        .insert(plan.body_id, plan.resources);
    probe.memory.visited_systems.insert(plan.system_id);

    ActionOutcome::Scanned {
        body_id: plan.body_id,
        body_name: plan.body_name,
        distance_au: plan.distance_au,
        resources: plan.resources,
    }
}

/// Move the extracted stock from the body into the probe.
pub fn apply_harvest(
    state: &mut WorldState,
    probe_id: ProbeId,
    plan: &HarvestPlan,
) -> Result<ActionOutcome, ActionError> {
    let body = state
        .systems
        .values_mut()
        .find_map(|system| system.body_mut(plan.body_id))
        .ok_or(WorldError::BodyNotFound(plan.body_id))?;
    let probe = state
        .probes
        .get_mut(&probe_id)
        .ok_or(ActionError::ProbeNotFound(probe_id))?;

    let inventory = probe
        .resources
        .checked_add(plan.extracted)
        .ok_or_else(|| ActionError::invariant("harvest inventory overflow"))?;
    withdraw(body, plan.extracted)?;

    probe.status = ProbeStatus::Harvesting;
    probe.resources = inventory;
    probe
        .memory
        .discovered_resources
        .insert(body.id, body.resources);
    probe.status = ProbeStatus::Active;

    Ok(ActionOutcome::Harvested {
        body_id: plan.body_id,
        duration: plan.duration,
        extracted: plan.extracted,
    })
}

/// Charge the parent and insert the child.
///
/// The parent learns of the child; the child starts with a copy of the
/// parent's memory, the parent in its known probes, and a birth record.
pub fn apply_manufacture(
    state: &mut WorldState,
    parent_id: ProbeId,
    plan: ManufacturePlan,
    ctx: &ActionContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let parent = state
        .probes
        .get(&parent_id)
        .ok_or(ActionError::ProbeNotFound(parent_id))?;

    let mut charged = parent.clone();
    inventory::spend(&mut charged, plan.cost)?;
    let mut child = probe::build_child(parent, &plan.name, ctx.economy, ctx.now)?;
    if state.probes.contains_key(&child.id) {
        return Err(ActionError::DuplicateProbe(child.id));
    }

    let payload = json!({
        "parent_id": parent_id,
        "parent_name": parent.name,
        "generation": child.generation,
    });
    memory::record_event(&mut child, EventTag::Created, payload, ctx.tick, ctx.now);

    charged.status = ProbeStatus::Manufacturing;
    charged.memory.known_probes.insert(child.id);
    charged.status = ProbeStatus::Active;

    let outcome = ActionOutcome::Manufactured {
        child_id: child.id,
        child_name: child.name.clone(),
        generation: child.generation,
        cost: plan.cost,
    };

    info!(
        parent_id = %parent_id,
        child_id = %child.id,
        generation = child.generation,
        "probe manufactured"
    );

    state.probes.insert(parent_id, charged);
    state.probes.insert(child.id, child);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use replicator_types::{ActionKind, ProbeAction, ResourceVector};
    use replicator_world::{DistanceScale, SeedIds, create_seed_system};

    use super::*;
    use crate::actions::execute_action;
    use crate::config::EconomyConfig;
    use crate::probe::{SEED_PROBE_ID, seed_probe};

    fn world(economy: &EconomyConfig) -> WorldState {
        let mut state = WorldState::empty(Utc::now());
        let system = create_seed_system();
        state.systems.insert(system.id, system);
        let probe = seed_probe(economy, Utc::now());
        state.probes.insert(probe.id, probe);
        state
    }

    fn ctx(economy: &EconomyConfig) -> ActionContext<'_> {
        ActionContext {
            economy,
            scale: DistanceScale::AU,
            tick: 3,
            now: Utc::now(),
        }
    }

    fn seed(state: &WorldState) -> Option<&Probe> {
        state.probes.get(&SEED_PROBE_ID)
    }

    #[test]
    fn travel_spends_energy_and_moves() {
        let economy = EconomyConfig::default();
        let mut state = world(&economy);
        let target = replicator_types::Position::new(1.52, 0.0, 0.0);
        let result = execute_action(
            &mut state,
            SEED_PROBE_ID,
            &ProbeAction::Travel { target },
            &ctx(&economy),
        );
        assert!(result.as_ref().is_ok_and(|r| r.ok));
        let probe = seed(&state);
        assert_eq!(probe.map(|p| p.resources.energy), Some(998));
        assert_eq!(probe.map(|p| p.position), Some(target));
        assert_eq!(probe.map(|p| p.status), Some(ProbeStatus::Active));
        assert_eq!(
            probe.and_then(|p| p.memory.experiences.last()).map(|e| e.event),
            Some(EventTag::Traveled)
        );
    }

    #[test]
    fn harvest_is_a_transfer() {
        let economy = EconomyConfig::default();
        let mut state = world(&economy);
        let body_before = state.find_body(SeedIds::LUNA).map(|(_, b)| b.resources);
        let probe_before = seed(&state).map(|p| p.resources);

        let result = execute_action(
            &mut state,
            SEED_PROBE_ID,
            &ProbeAction::Harvest {
                body_id: SeedIds::LUNA,
                duration: 20,
            },
            &ctx(&economy),
        );
        assert!(result.is_ok_and(|r| r.ok));

        let body_after = state.find_body(SeedIds::LUNA).map(|(_, b)| b.resources);
        let probe_after = seed(&state).map(|p| p.resources);
        let extracted = ResourceVector::new(0, 200, 200, 100, 150);
        assert_eq!(probe_before.and_then(|v| v.checked_add(extracted)), probe_after);
        assert_eq!(body_before.and_then(|v| v.checked_sub(extracted)), body_after);
        assert_eq!(body_after.map(|v| v.hydrogen), Some(0));
    }

    #[test]
    fn harvest_too_far_changes_nothing_but_memory() {
        let economy = EconomyConfig::default();
        let mut state = world(&economy);
        let body_before = state.find_body(SeedIds::BELT).map(|(_, b)| b.resources);
        let probe_before = seed(&state).map(|p| p.resources);

        let result = execute_action(
            &mut state,
            SEED_PROBE_ID,
            &ProbeAction::Harvest {
                body_id: SeedIds::BELT,
                duration: 10,
            },
            &ctx(&economy),
        );
        assert_eq!(result.ok().and_then(|r| r.reason_tag()), Some("too_far"));
        assert_eq!(state.find_body(SeedIds::BELT).map(|(_, b)| b.resources), body_before);
        assert_eq!(seed(&state).map(|p| p.resources), probe_before);
        assert_eq!(
            seed(&state)
                .and_then(|p| p.memory.experiences.last())
                .map(|e| e.event),
            Some(EventTag::HarvestFailed)
        );
    }

    #[test]
    fn manufacture_with_exact_cost() {
        let economy = EconomyConfig::default();
        let mut state = world(&economy);
        if let Some(probe) = state.probes.get_mut(&SEED_PROBE_ID) {
            probe.resources = economy.replication_cost;
        }

        let result = execute_action(
            &mut state,
            SEED_PROBE_ID,
            &ProbeAction::Manufacture {
                name: String::from("Bob-1-1"),
            },
            &ctx(&economy),
        );
        let child_id = match result.ok().and_then(|r| r.data) {
            Some(ActionOutcome::Manufactured { child_id, .. }) => Some(child_id),
            _ => None,
        };
        assert!(child_id.is_some());

        let parent = seed(&state);
        assert_eq!(parent.map(|p| p.resources), Some(ResourceVector::ZERO));
        let child = child_id.and_then(|id| state.probes.get(&id));
        assert_eq!(child.map(|c| c.generation), Some(1));
        assert_eq!(child.map(|c| c.resources), Some(economy.child_starting_resources));
        assert_eq!(child.and_then(|c| c.parent_id), Some(SEED_PROBE_ID));
        assert!(child.is_some_and(|c| c.memory.known_probes.contains(&SEED_PROBE_ID)));
        assert!(
            child_id.is_some_and(|id| parent.is_some_and(|p| p.memory.known_probes.contains(&id)))
        );
        let birth = child.and_then(|c| c.memory.experiences.last());
        assert_eq!(birth.map(|e| e.event), Some(EventTag::Created));
        assert_eq!(
            birth.and_then(|e| e.payload.get("generation").cloned()),
            Some(json!(1))
        );
        assert_eq!(state.probes.len(), 2);
    }

    #[test]
    fn manufacture_refused_leaves_no_partial_state() {
        let economy = EconomyConfig::default();
        let mut state = world(&economy);
        if let Some(probe) = state.probes.get_mut(&SEED_PROBE_ID) {
            probe.resources.energy = 499;
        }
        let before = seed(&state).map(|p| p.resources);
        let result = execute_action(
            &mut state,
            SEED_PROBE_ID,
            &ProbeAction::Manufacture {
                name: String::from("nope"),
            },
            &ctx(&economy),
        );
        assert_eq!(
            result.ok().and_then(|r| r.reason_tag()),
            Some("insufficient_resources")
        );
        assert_eq!(seed(&state).map(|p| p.resources), before);
        assert_eq!(state.probes.len(), 1);
    }

    #[test]
    fn scan_records_discovery() {
        let economy = EconomyConfig::default();
        let mut state = world(&economy);
        let result = execute_action(
            &mut state,
            SEED_PROBE_ID,
            &ProbeAction::Scan {
                body_id: SeedIds::MARS,
            },
            &ctx(&economy),
        );
        assert!(result.is_ok_and(|r| r.ok && r.kind == ActionKind::Scan));
        let stock = state.find_body(SeedIds::MARS).map(|(_, b)| b.resources);
        assert_eq!(
            seed(&state).and_then(|p| p.memory.discovered_resources.get(&SeedIds::MARS).copied()),
            stock
        );
    }

    #[test]
    fn unknown_probe_is_an_error() {
        let economy = EconomyConfig::default();
        let mut state = world(&economy);
        let result = execute_action(
            &mut state,
            ProbeId::from_u128(42),
            &ProbeAction::Wait,
            &ctx(&economy),
        );
        assert!(matches!(result, Err(ActionError::ProbeNotFound(_))));
    }

    #[test]
    fn destroyed_probe_is_refused() {
        let economy = EconomyConfig::default();
        let mut state = world(&economy);
        if let Some(probe) = state.probes.get_mut(&SEED_PROBE_ID) {
            probe.status = ProbeStatus::Destroyed;
        }
        let result = execute_action(&mut state, SEED_PROBE_ID, &ProbeAction::Wait, &ctx(&economy));
        assert_eq!(result.ok().and_then(|r| r.reason_tag()), Some("probe_destroyed"));
    }
}
