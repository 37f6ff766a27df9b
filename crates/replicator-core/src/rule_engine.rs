//! Rule-based decision provider.
//!
//! A deterministic provider that needs no model call: every proposal
//! follows from the probe snapshot and its environment alone. Rules are
//! evaluated in priority order and each contributes at most one proposal,
//! up to the request's action limit:
//!
//! 1. **Expansion** -- manufacture a child when the inventory covers the
//!    replication cost plus an energy reserve.
//! 2. **Resource gathering** -- harvest the closest stocked body when it is
//!    within harvest proximity, for the longest duration storage allows.
//! 3. **Exploration** -- scan the closest in-range body whose stock the
//!    probe has never recorded.
//! 4. **Exploration** -- when nothing was harvested, travel to the closest
//!    stocked body out of proximity if the trip is affordable.
//! 5. **Survival** -- otherwise wait; solar income refills energy.

use futures::future::BoxFuture;
use replicator_agents::EconomyConfig;
use replicator_agents::actions::costs;
use replicator_agents::inventory;
use replicator_types::{ActionProposal, Priority, Probe, ProbeAction, ResourceVector};
use replicator_world::{NearbyBody, extractable};

use crate::decision::{Decision, DecisionError, DecisionProvider};
use crate::perception::DecisionRequest;

/// Energy kept in hand after paying for a child.
const EXPANSION_ENERGY_RESERVE: u64 = 100;

/// A decision provider driven by fixed rules.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedProvider {
    economy: EconomyConfig,
}

/// Proposals collected so far, with the priority of the first rule that
/// fired.
#[derive(Debug, Default)]
struct Plan {
    priority: Option<Priority>,
    steps: Vec<&'static str>,
    actions: Vec<ActionProposal>,
}

impl Plan {
    fn push(&mut self, priority: Priority, step: &'static str, proposal: ActionProposal) {
        self.priority.get_or_insert(priority);
        self.steps.push(step);
        self.actions.push(proposal);
    }
}

impl RuleBasedProvider {
    /// Create a provider using the given economy.
    pub const fn new(economy: EconomyConfig) -> Self {
        Self { economy }
    }

    /// Evaluate the rules for one request.
    pub fn plan(&self, request: &DecisionRequest) -> Decision {
        let probe = &request.probe;
        let env = &request.environment;
        let mut plan = Plan::default();

        if let Some(proposal) = self.expansion(probe) {
            plan.push(Priority::Expansion, "replicate", proposal);
        }

        let closest_stocked = env.with_stock().next();
        let within_reach =
            closest_stocked.filter(|body| body.distance_au <= self.economy.harvest_proximity);

        let harvested = within_reach.and_then(|body| self.harvest(probe, body));
        let gathering = harvested.is_some();
        if let Some(proposal) = harvested {
            plan.push(Priority::ResourceGathering, "harvest", proposal);
        }

        let unknown = env.nearby.iter().find(|body| {
            body.distance_au <= probe.capabilities.sensor_range
                && !probe.memory.discovered_resources.contains_key(&body.body_id)
        });
        if let Some(body) = unknown {
            plan.push(
                Priority::Exploration,
                "survey",
                ActionProposal::new(
                    ProbeAction::Scan {
                        body_id: body.body_id,
                    },
                    format!("{} has never been surveyed", body.name),
                ),
            );
        }

        if !gathering
            && within_reach.is_none()
            && let Some(proposal) = closest_stocked.and_then(|body| self.travel(probe, body))
        {
            plan.push(Priority::Exploration, "relocate", proposal);
        }

        if plan.actions.is_empty() {
            return Decision::wait("Nothing worthwhile in reach; recharging");
        }

        plan.actions.truncate(request.max_actions.max(1));
        plan.steps.truncate(request.max_actions.max(1));
        Decision {
            strategy: plan.steps.join(", then "),
            priority: plan.priority.unwrap_or(Priority::Survival),
            actions: plan.actions,
        }
    }

    fn expansion(&self, probe: &Probe) -> Option<ActionProposal> {
        let needed = self
            .economy
            .replication_cost
            .checked_add(ResourceVector::energy(EXPANSION_ENERGY_RESERVE))?;
        if !probe.resources.can_afford(&needed) {
            return None;
        }
        let generation = probe.generation.saturating_add(1);
        let ordinal = probe.memory.known_probes.len().saturating_add(1);
        Some(ActionProposal::new(
            ProbeAction::Manufacture {
                name: format!("{}-{generation}-{ordinal}", probe.name),
            },
            "Replication cost and reserve are covered",
        ))
    }

    /// Longest harvest of `body` that still fits in storage.
    fn harvest(&self, probe: &Probe, body: &NearbyBody) -> Option<ActionProposal> {
        if inventory::headroom(probe) == 0 {
            return None;
        }
        let capacity = probe.capabilities.storage_capacity;
        let duration = (1..=self.economy.max_harvest_duration).rev().find(|&duration| {
            let requested = costs::harvest_request(probe.capabilities.harvest_rate, duration);
            let extracted = extractable(body.resources, requested);
            !extracted.is_empty()
                && inventory::fits_in_storage(probe.resources, extracted, capacity).is_ok()
        })?;
        Some(ActionProposal::new(
            ProbeAction::Harvest {
                body_id: body.body_id,
                duration,
            },
            format!("{} is within reach and has stock", body.name),
        ))
    }

    fn travel(&self, probe: &Probe, body: &NearbyBody) -> Option<ActionProposal> {
        let cost = costs::travel_energy(body.distance_au, self.economy.energy_per_distance)?;
        (cost <= probe.resources.energy).then(|| {
            ActionProposal::new(
                ProbeAction::Travel {
                    target: body.position,
                },
                format!("Heading to {} ({cost} energy)", body.name),
            )
        })
    }
}

impl DecisionProvider for RuleBasedProvider {
    fn name(&self) -> &str {
        "rule_engine"
    }

    fn decide<'a>(
        &'a self,
        request: &'a DecisionRequest,
    ) -> BoxFuture<'a, Result<Decision, DecisionError>> {
        Box::pin(async move { Ok(self.plan(request)) })
    }
}
