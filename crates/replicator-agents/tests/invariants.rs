//! Property tests for the resource invariants of action execution.
//!
//! Arbitrary sequences of actions run against the seed world must never
//! produce an execution error, must conserve stock on every harvest, and
//! must apply every manufacture either completely or not at all.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc
)]

use chrono::Utc;
use proptest::prelude::*;
use replicator_agents::{ActionContext, EconomyConfig, execute_action, seed_probe};
use replicator_types::{ActionOutcome, BodyId, ProbeAction, ProbeId, ResourceVector, WorldState};
use replicator_world::{DistanceScale, SeedIds, create_seed_system};

const BODIES: [BodyId; 6] = [
    SeedIds::SOL,
    SeedIds::TERRA,
    SeedIds::LUNA,
    SeedIds::MARS,
    SeedIds::BELT,
    SeedIds::JUPITER,
];

/// A generated step: which probe acts and what it tries.
#[derive(Debug, Clone)]
enum Step {
    Travel(usize),
    Scan(usize),
    Harvest(usize, u32),
    Manufacture(bool),
    Wait,
}

fn step() -> impl Strategy<Value = (usize, Step)> {
    let action = prop_oneof![
        (0..BODIES.len()).prop_map(Step::Travel),
        (0..BODIES.len()).prop_map(Step::Scan),
        ((0..BODIES.len()), 0_u32..130).prop_map(|(b, d)| Step::Harvest(b, d)),
        any::<bool>().prop_map(Step::Manufacture),
        Just(Step::Wait),
    ];
    (0_usize..8, action)
}

fn seeded(economy: &EconomyConfig) -> WorldState {
    let mut state = WorldState::empty(Utc::now());
    let system = create_seed_system();
    state.systems.insert(system.id, system);
    let probe = seed_probe(economy, Utc::now());
    state.probes.insert(probe.id, probe);
    state
}

fn to_action(state: &WorldState, step: &Step, n: usize) -> ProbeAction {
    match *step {
        Step::Travel(b) => ProbeAction::Travel {
            target: state.find_body(BODIES[b]).unwrap().1.position,
        },
        Step::Scan(b) => ProbeAction::Scan { body_id: BODIES[b] },
        Step::Harvest(b, duration) => ProbeAction::Harvest {
            body_id: BODIES[b],
            duration,
        },
        Step::Manufacture(named) => ProbeAction::Manufacture {
            name: if named { format!("probe-{n}") } else { String::from(" ") },
        },
        Step::Wait => ProbeAction::Wait,
    }
}

fn body_stock(state: &WorldState, id: BodyId) -> ResourceVector {
    state.find_body(id).unwrap().1.resources
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn action_sequences_keep_resource_invariants(
        steps in proptest::collection::vec(step(), 1..40)
    ) {
        let economy = EconomyConfig::default();
        let mut state = seeded(&economy);

        for (n, (who, step)) in steps.iter().enumerate() {
            let ids: Vec<ProbeId> = state.probes.keys().copied().collect();
            let probe_id = ids[who % ids.len()];
            let action = to_action(&state, step, n);
            let before = state.clone();
            let ctx = ActionContext {
                economy: &economy,
                scale: DistanceScale::AU,
                tick: n as u64,
                now: Utc::now(),
            };

            let result = execute_action(&mut state, probe_id, &action, &ctx);
            prop_assert!(result.is_ok(), "execution error: {:?}", result.err());
            let result = result.unwrap();

            let inv_before = before.probes[&probe_id].resources;
            let inv_after = state.probes[&probe_id].resources;

            if !result.ok {
                // Refused actions touch nothing but memory.
                prop_assert_eq!(inv_before, inv_after);
                prop_assert_eq!(before.probes.len(), state.probes.len());
                for id in BODIES {
                    prop_assert_eq!(body_stock(&before, id), body_stock(&state, id));
                }
                continue;
            }

            match result.data {
                Some(ActionOutcome::Harvested { body_id, extracted, .. }) => {
                    prop_assert_eq!(inv_before.checked_add(extracted), Some(inv_after));
                    prop_assert_eq!(
                        body_stock(&before, body_id).checked_sub(extracted),
                        Some(body_stock(&state, body_id))
                    );
                    prop_assert!(
                        inv_after.total() <= state.probes[&probe_id].capabilities.storage_capacity
                    );
                }
                Some(ActionOutcome::Manufactured { child_id, generation, cost, .. }) => {
                    prop_assert_eq!(inv_before.checked_sub(cost), Some(inv_after));
                    prop_assert_eq!(state.probes.len(), before.probes.len() + 1);
                    let parent_generation = before.probes[&probe_id].generation;
                    prop_assert_eq!(generation, parent_generation + 1);
                    prop_assert_eq!(state.probes[&child_id].generation, generation);
                }
                Some(ActionOutcome::Traveled { energy_spent, .. }) => {
                    prop_assert_eq!(
                        inv_before.energy.checked_sub(energy_spent),
                        Some(inv_after.energy)
                    );
                }
                _ => prop_assert_eq!(inv_before, inv_after),
            }
        }
    }
}
