//! Precondition checks for every action kind.
//!
//! Validation is pure: it reads the world and the acting probe and either
//! refuses with a [`FailureReason`] or returns an [`ActionPlan`] holding
//! every value the handler will commit. Checks run in a fixed order per
//! kind so the reported reason is deterministic:
//!
//! - Travel: energy for the trip.
//! - Scan: body exists, body within sensor range.
//! - Harvest: duration bounds, body exists, proximity, storage capacity.
//! - Manufacture: non-blank name, replication cost affordable.

use replicator_types::{
    BodyId, FailureReason, Position, Probe, ProbeAction, ResourceVector, SystemId, WorldState,
};
use replicator_world::extractable;

use super::ActionContext;
use super::costs;
use crate::inventory;

/// A validated travel.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelPlan {
    /// Starting position.
    pub from: Position,
    /// Destination.
    pub to: Position,
    /// Trip length in AU.
    pub distance_au: f64,
    /// Energy to deduct.
    pub energy_cost: u64,
    /// Travel time in cycles.
    pub travel_time: u64,
}

/// A validated scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPlan {
    /// The scanned body.
    pub body_id: BodyId,
    /// The system containing it.
    pub system_id: SystemId,
    /// The body's display name.
    pub body_name: String,
    /// Distance to it in AU.
    pub distance_au: f64,
    /// Its stock right now.
    pub resources: ResourceVector,
}

/// A validated harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestPlan {
    /// The source body.
    pub body_id: BodyId,
    /// Cycles spent.
    pub duration: u32,
    /// Amount moving from body to probe.
    pub extracted: ResourceVector,
}

/// A validated manufacture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturePlan {
    /// Trimmed child name.
    pub name: String,
    /// Replication cost to deduct from the parent.
    pub cost: ResourceVector,
}

/// The effects of an action that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPlan {
    /// Move.
    Travel(TravelPlan),
    /// Survey a body.
    Scan(ScanPlan),
    /// Transfer stock from a body.
    Harvest(HarvestPlan),
    /// Build a child.
    Manufacture(ManufacturePlan),
    /// Record a wait.
    Wait,
    /// Record an exploration.
    Explore,
}

/// Check an action's preconditions for `probe`.
pub fn validate_action(
    state: &WorldState,
    probe: &Probe,
    action: &ProbeAction,
    ctx: &ActionContext<'_>,
) -> Result<ActionPlan, FailureReason> {
    match action {
        ProbeAction::Travel { target } => {
            validate_travel(probe, *target, ctx).map(ActionPlan::Travel)
        }
        ProbeAction::Scan { body_id } => {
            validate_scan(state, probe, *body_id, ctx).map(ActionPlan::Scan)
        }
        ProbeAction::Harvest { body_id, duration } => {
            validate_harvest(state, probe, *body_id, *duration, ctx).map(ActionPlan::Harvest)
        }
        ProbeAction::Manufacture { name } => {
            validate_manufacture(probe, name, ctx).map(ActionPlan::Manufacture)
        }
        ProbeAction::Wait => Ok(ActionPlan::Wait),
        ProbeAction::Explore => Ok(ActionPlan::Explore),
    }
}

/// Travel needs `ceil(distance × energy_per_distance)` energy.
pub fn validate_travel(
    probe: &Probe,
    target: Position,
    ctx: &ActionContext<'_>,
) -> Result<TravelPlan, FailureReason> {
    let available = probe.resources.energy;
    let distance_au = ctx.scale.distance_au(&probe.position, &target);
    let energy_cost = costs::travel_energy(distance_au, ctx.economy.energy_per_distance)
        .ok_or(FailureReason::InsufficientEnergy {
            required: u64::MAX,
            available,
        })?;

    if available < energy_cost {
        return Err(FailureReason::InsufficientEnergy {
            required: energy_cost,
            available,
        });
    }

    Ok(TravelPlan {
        from: probe.position,
        to: target,
        distance_au,
        energy_cost,
        travel_time: costs::travel_time(distance_au, probe.capabilities.max_speed)
            .unwrap_or(u64::MAX),
    })
}

/// Scans reach as far as the sensor range.
pub fn validate_scan(
    state: &WorldState,
    probe: &Probe,
    body_id: BodyId,
    ctx: &ActionContext<'_>,
) -> Result<ScanPlan, FailureReason> {
    let (system_id, body) = state
        .find_body(body_id)
        .ok_or(FailureReason::BodyNotFound { body_id })?;
    let distance_au = ctx.scale.distance_au(&probe.position, &body.position);
    let range = probe.capabilities.sensor_range;

    if distance_au > range {
        return Err(FailureReason::OutOfRange { distance_au, range });
    }

    Ok(ScanPlan {
        body_id,
        system_id,
        body_name: body.name.clone(),
        distance_au,
        resources: body.resources,
    })
}

/// Harvesting needs a bounded duration, a close body, and free storage.
pub fn validate_harvest(
    state: &WorldState,
    probe: &Probe,
    body_id: BodyId,
    duration: u32,
    ctx: &ActionContext<'_>,
) -> Result<HarvestPlan, FailureReason> {
    let max = ctx.economy.max_harvest_duration;
    if duration == 0 || duration > max {
        return Err(FailureReason::InvalidDuration { duration, max });
    }

    let (_, body) = state
        .find_body(body_id)
        .ok_or(FailureReason::BodyNotFound { body_id })?;
    let distance_au = ctx.scale.distance_au(&probe.position, &body.position);
    let proximity = ctx.economy.harvest_proximity;
    if distance_au > proximity {
        return Err(FailureReason::TooFar {
            distance_au,
            proximity,
        });
    }

    let requested = costs::harvest_request(probe.capabilities.harvest_rate, duration);
    let extracted = extractable(body.resources, requested);
    let capacity = probe.capabilities.storage_capacity;
    inventory::fits_in_storage(probe.resources, extracted, capacity).map_err(
        |resulting_total| FailureReason::StorageFull {
            resulting_total,
            capacity,
        },
    )?;

    Ok(HarvestPlan {
        body_id,
        duration,
        extracted,
    })
}

/// Manufacturing needs a name and the full replication cost.
pub fn validate_manufacture(
    probe: &Probe,
    name: &str,
    ctx: &ActionContext<'_>,
) -> Result<ManufacturePlan, FailureReason> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FailureReason::InvalidName);
    }

    let cost = ctx.economy.replication_cost;
    if !probe.resources.can_afford(&cost) {
        return Err(FailureReason::InsufficientResources {
            required: cost,
            available: probe.resources,
        });
    }

    Ok(ManufacturePlan {
        name: name.to_owned(),
        cost,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use replicator_world::{DistanceScale, SeedIds, create_seed_system};

    use super::*;
    use crate::config::EconomyConfig;
    use crate::probe::seed_probe;

    fn world(economy: &EconomyConfig) -> (WorldState, Probe) {
        let mut state = WorldState::empty(Utc::now());
        let system = create_seed_system();
        state.systems.insert(system.id, system);
        let probe = seed_probe(economy, Utc::now());
        state.probes.insert(probe.id, probe.clone());
        (state, probe)
    }

    fn ctx(economy: &EconomyConfig) -> ActionContext<'_> {
        ActionContext {
            economy,
            scale: DistanceScale::AU,
            tick: 1,
            now: Utc::now(),
        }
    }

    #[test]
    fn travel_cost_rounds_up_and_checks_energy() {
        let economy = EconomyConfig::default();
        let (_, mut probe) = world(&economy);
        let target = Position::new(1.0, 0.75, 0.0);
        let plan = validate_travel(&probe, target, &ctx(&economy));
        assert_eq!(plan.as_ref().map(|p| p.energy_cost).ok(), Some(2));
        assert_eq!(plan.map(|p| p.travel_time).ok(), Some(2));

        probe.resources.energy = 1;
        assert_eq!(
            validate_travel(&probe, target, &ctx(&economy)),
            Err(FailureReason::InsufficientEnergy {
                required: 2,
                available: 1
            })
        );
    }

    #[test]
    fn scan_respects_sensor_range() {
        let economy = EconomyConfig::default();
        let (state, probe) = world(&economy);
        assert!(validate_scan(&state, &probe, SeedIds::MARS, &ctx(&economy)).is_ok());
        let far = validate_scan(&state, &probe, SeedIds::JUPITER, &ctx(&economy));
        assert_eq!(far.err().map(|r| r.tag()), Some("out_of_range"));
        let missing = validate_scan(&state, &probe, BodyId::from_u128(1), &ctx(&economy));
        assert_eq!(missing.err().map(|r| r.tag()), Some("body_not_found"));
    }

    #[test]
    fn harvest_checks_in_order() {
        let economy = EconomyConfig::default();
        let (state, probe) = world(&economy);
        let c = ctx(&economy);
        let tag = |body, duration| {
            validate_harvest(&state, &probe, body, duration, &c)
                .err()
                .map(|r| r.tag())
        };
        assert_eq!(tag(SeedIds::BELT, 0), Some("invalid_duration"));
        assert_eq!(tag(SeedIds::BELT, 101), Some("invalid_duration"));
        assert_eq!(tag(BodyId::from_u128(1), 5), Some("body_not_found"));
        assert_eq!(tag(SeedIds::BELT, 5), Some("too_far"));
        assert_eq!(tag(SeedIds::TERRA, 5), None);
    }

    #[test]
    fn harvest_yield_is_capped_by_stock() {
        let economy = EconomyConfig::default();
        let (state, probe) = world(&economy);
        let plan = validate_harvest(&state, &probe, SeedIds::LUNA, 20, &ctx(&economy));
        // Luna holds no energy, 100 hydrogen, and plenty of the rest.
        assert_eq!(
            plan.map(|p| p.extracted).ok(),
            Some(ResourceVector::new(0, 200, 200, 100, 150))
        );
    }

    #[test]
    fn harvest_refuses_when_storage_full() {
        let economy = EconomyConfig::default();
        let (state, mut probe) = world(&economy);
        probe.capabilities.storage_capacity = 2_100;
        let result = validate_harvest(&state, &probe, SeedIds::TERRA, 5, &ctx(&economy));
        assert_eq!(
            result.err(),
            Some(FailureReason::StorageFull {
                resulting_total: 2_250,
                capacity: 2_100
            })
        );
    }

    #[test]
    fn manufacture_needs_name_and_cost() {
        let economy = EconomyConfig::default();
        let (_, mut probe) = world(&economy);
        assert_eq!(
            validate_manufacture(&probe, "   ", &ctx(&economy)),
            Err(FailureReason::InvalidName)
        );
        assert!(validate_manufacture(&probe, "child", &ctx(&economy)).is_ok());
        probe.resources.rare_elements = 9;
        assert_eq!(
            validate_manufacture(&probe, "child", &ctx(&economy))
                .err()
                .map(|r| r.tag()),
            Some("insufficient_resources")
        );
    }
}
