//! Tick cycle: the barrier-synchronized loop body of the simulation.
//!
//! Each call to [`TickScheduler::run_tick`] runs these phases:
//!
//! 1. **Solar income** -- every active probe gains the configured energy,
//!    one atomic store mutation (and one experience record) per probe.
//!
//! 2. **Selection** -- snapshot the ids of every non-destroyed probe. With
//!    none left the tick is not counted and the simulation is extinct.
//!
//! 3. **Fan-out** -- advance the tick counter and spawn one [`Pipeline`]
//!    per selected probe under the pipeline deadline.
//!
//! 4. **Fan-in** -- wait for every pipeline. A pipeline error, timeout or
//!    panic becomes a failed result for that probe only.
//!
//! 5. **Aggregate** -- count successes and failures and capture each
//!    probe's resulting state.
//!
//! 6. **Persist** -- write the full state. A failed write is reported and
//!    the tick still completes with in-memory state.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use replicator_agents::{ActionError, apply_solar_income};
use replicator_types::{ProbeId, ProbeStatus, ResourceVector, WorldState};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::events::SimulationObserver;
use crate::executor::{TaskError, TaskExecutor};
use crate::pipeline::{Pipeline, PipelineReport};
use crate::store::EntityStore;

/// How one probe's pipeline ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeTickResult {
    /// The pipeline ran to the end.
    Completed(PipelineReport),
    /// The pipeline failed as a whole.
    Failed {
        /// Why.
        reason: String,
    },
}

impl ProbeTickResult {
    /// Whether the pipeline ran to the end.
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// A probe's state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeState {
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: ProbeStatus,
    /// Generation number.
    pub generation: u32,
    /// Inventory.
    pub resources: ResourceVector,
}

/// Summary of one completed tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// The tick number that ran.
    pub tick: u64,
    /// When the tick began.
    pub started_at: DateTime<Utc>,
    /// When the tick finished.
    pub finished_at: DateTime<Utc>,
    /// Probes that received solar income.
    pub solar_charged: usize,
    /// Probes whose pipelines ran this tick.
    pub active_probes: usize,
    /// Pipelines that ran to the end.
    pub succeeded: usize,
    /// Pipelines that failed as a whole.
    pub failed: usize,
    /// Executed actions that took effect.
    pub actions_succeeded: usize,
    /// Executed actions that were refused.
    pub actions_failed: usize,
    /// Per-probe pipeline results.
    pub results: BTreeMap<ProbeId, ProbeTickResult>,
    /// Every probe's state after the tick, children born this tick included.
    pub probe_states: BTreeMap<ProbeId, ProbeState>,
    /// Non-destroyed probes after the tick.
    pub live_probes: usize,
    /// Whether the end-of-tick snapshot was written.
    pub persisted: bool,
}

/// What [`TickScheduler::run_tick`] found.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tick ran.
    Completed(TickReport),
    /// No probe was left to run; the tick counter was not advanced.
    Extinct {
        /// The unchanged tick counter.
        tick: u64,
    },
}

/// Runs ticks against a shared [`EntityStore`].
///
/// The scheduler keeps no state of its own between ticks: the tick counter
/// lives in the store, so a scheduler over a resumed store continues the
/// numbering.
pub struct TickScheduler {
    store: Arc<EntityStore>,
    pipeline: Pipeline,
    observer: Arc<dyn SimulationObserver>,
    tasks: TaskExecutor,
    solar_income: u64,
    pipeline_timeout: Duration,
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("pipeline", &self.pipeline)
            .field("solar_income", &self.solar_income)
            .field("pipeline_timeout", &self.pipeline_timeout)
            .finish_non_exhaustive()
    }
}

impl TickScheduler {
    /// Create a scheduler.
    pub const fn new(
        store: Arc<EntityStore>,
        pipeline: Pipeline,
        observer: Arc<dyn SimulationObserver>,
        solar_income: u64,
        pipeline_timeout: Duration,
    ) -> Self {
        Self {
            store,
            pipeline,
            observer,
            tasks: TaskExecutor::new("tick"),
            solar_income,
            pipeline_timeout,
        }
    }

    /// Execute one tick.
    pub async fn run_tick(&self) -> TickOutcome {
        let started_at = Utc::now();
        let next_tick = self.store.current_tick().await.saturating_add(1);

        // --- Phase 1: Solar income ---
        let solar_charged = self.phase_solar_income(next_tick, started_at).await;

        // --- Phase 2: Selection ---
        let live = self.store.read(WorldState::live_probe_ids).await;
        if live.is_empty() {
            let tick = self.store.current_tick().await;
            info!(tick, "No probes left to run");
            return TickOutcome::Extinct { tick };
        }

        // --- Phase 3: Fan-out ---
        let tick = self.store.advance_tick().await;
        self.observer.on_tick_started(tick, live.len());
        debug!(tick, probes = live.len(), "Starting pipelines");

        let units = live.iter().map(|&probe_id| {
            let pipeline = self.pipeline.clone();
            let task = format!("pipeline:{probe_id}");
            let name = task.clone();
            let work = async move {
                pipeline
                    .run(probe_id, tick)
                    .await
                    .map_err(|err| TaskError::Failed {
                        task: name,
                        message: err.to_string(),
                    })
            };
            (task, work)
        });

        // --- Phase 4: Fan-in ---
        let outcomes = self.tasks.spawn_all(self.pipeline_timeout, units).await;

        // --- Phase 5: Aggregate ---
        let mut results = BTreeMap::new();
        for (probe_id, outcome) in live.iter().copied().zip(outcomes) {
            let result = match outcome {
                Ok(report) => ProbeTickResult::Completed(report),
                Err(err) => {
                    debug!(
                        tick,
                        probe_id = %probe_id,
                        task = err.task(),
                        error = %err,
                        "Pipeline failed"
                    );
                    ProbeTickResult::Failed {
                        reason: failure_reason(&err),
                    }
                }
            };
            self.observer.on_pipeline_finished(tick, probe_id, &result);
            results.insert(probe_id, result);
        }

        let (probe_states, live_probes) = self.store.read(capture_probe_states).await;

        // --- Phase 6: Persist ---
        let persisted = match self.store.persist().await {
            Ok(()) => true,
            Err(err) => {
                self.observer.on_persistence_failed(tick, &err);
                false
            }
        };

        let report = summarize(TickReport {
            tick,
            started_at,
            finished_at: Utc::now(),
            solar_charged,
            active_probes: live.len(),
            succeeded: 0,
            failed: 0,
            actions_succeeded: 0,
            actions_failed: 0,
            results,
            probe_states,
            live_probes,
            persisted,
        });
        self.observer.on_tick_completed(&report);
        TickOutcome::Completed(report)
    }

    /// Credit solar income to every active probe, one mutation each.
    async fn phase_solar_income(&self, tick: u64, now: DateTime<Utc>) -> usize {
        let active: Vec<ProbeId> = self
            .store
            .read(|state| {
                state
                    .probes
                    .values()
                    .filter(|probe| probe.status == ProbeStatus::Active)
                    .map(|probe| probe.id)
                    .collect()
            })
            .await;

        let mut charged: usize = 0;
        for probe_id in active {
            let income = self.solar_income;
            let credited = self
                .store
                .transact(|state| {
                    let probe = state
                        .probes
                        .get_mut(&probe_id)
                        .ok_or(ActionError::ProbeNotFound(probe_id))?;
                    apply_solar_income(probe, income, tick, now)
                })
                .await;
            match credited {
                Ok(0) => {}
                Ok(energy) => {
                    charged = charged.saturating_add(1);
                    self.observer.on_solar_charge(tick, probe_id, energy);
                }
                Err(err) => {
                    warn!(tick, probe_id = %probe_id, error = %err, "Solar income not applied");
                }
            }
        }
        charged
    }
}

/// Every probe's state, and how many are still live.
///
/// Every pipeline has finished by now, so a probe still in a transient
/// status was left there by a handler.
fn capture_probe_states(state: &WorldState) -> (BTreeMap<ProbeId, ProbeState>, usize) {
    for probe in state.probes.values().filter(|p| p.status.is_transient()) {
        warn!(probe_id = %probe.id, status = %probe.status, "Probe left in a transient status");
    }
    let states = state
        .probes
        .values()
        .map(|probe| {
            (
                probe.id,
                ProbeState {
                    name: probe.name.clone(),
                    status: probe.status,
                    generation: probe.generation,
                    resources: probe.resources,
                },
            )
        })
        .collect();
    (states, state.live_probe_ids().len())
}

/// Fill in the success and failure counters from the per-probe results.
fn summarize(mut report: TickReport) -> TickReport {
    for result in report.results.values() {
        match result {
            ProbeTickResult::Completed(pipeline) => {
                report.succeeded = report.succeeded.saturating_add(1);
                report.actions_succeeded =
                    report.actions_succeeded.saturating_add(pipeline.succeeded());
                report.actions_failed = report.actions_failed.saturating_add(pipeline.failed());
            }
            ProbeTickResult::Failed { .. } => {
                report.failed = report.failed.saturating_add(1);
            }
        }
    }
    report
}

fn failure_reason(err: &TaskError) -> String {
    match err {
        TaskError::TimedOut { timeout_ms, .. } => {
            format!("pipeline timed out after {timeout_ms}ms")
        }
        TaskError::Failed { message, .. } => message.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use replicator_agents::{EconomyConfig, SEED_PROBE_ID};
    use replicator_db::MemorySnapshotStore;
    use replicator_types::{ActionProposal, EventTag, Priority, ProbeAction};
    use replicator_world::DistanceScale;

    use super::*;
    use crate::action_executor::ActionExecutor;
    use crate::config::PipelineConfig;
    use crate::decision::{Decision, ScriptedDecisionProvider};
    use crate::events::NoOpObserver;
    use crate::store::{StoreOptions, seed_state};

    fn scheduler(
        state: WorldState,
        provider: Arc<ScriptedDecisionProvider>,
    ) -> (TickScheduler, Arc<EntityStore>) {
        let economy = EconomyConfig::default();
        let store = Arc::new(EntityStore::new(
            state,
            Arc::new(MemorySnapshotStore::new()),
            StoreOptions::default(),
        ));
        let observer: Arc<dyn SimulationObserver> = Arc::new(NoOpObserver);
        let config = PipelineConfig::default();
        let pipeline = Pipeline::new(
            store.clone(),
            provider,
            observer.clone(),
            ActionExecutor::new(store.clone(), economy.clone(), DistanceScale::AU),
            config.clone(),
            DistanceScale::AU,
        );
        let scheduler = TickScheduler::new(
            store.clone(),
            pipeline,
            observer,
            economy.solar_income,
            config.pipeline_timeout(),
        );
        (scheduler, store)
    }

    #[tokio::test]
    async fn waiting_tick_adds_income_and_records() {
        let state = seed_state(&EconomyConfig::default(), Utc::now());
        let (scheduler, store) = scheduler(state, Arc::new(ScriptedDecisionProvider::new()));

        let TickOutcome::Completed(report) = scheduler.run_tick().await else {
            panic!("expected a completed tick");
        };
        assert_eq!(report.tick, 1);
        assert_eq!(report.solar_charged, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);
        assert!(report.persisted);

        let probe = store.get_probe(SEED_PROBE_ID).await.unwrap();
        assert_eq!(probe.resources.energy, 1020);
        assert_eq!(probe.status, ProbeStatus::Active);
        let events: Vec<EventTag> = probe.memory.experiences.iter().map(|e| e.event).collect();
        assert_eq!(events, vec![EventTag::SolarCharging, EventTag::Waited]);
        assert_eq!(store.current_tick().await, 1);
    }

    #[tokio::test]
    async fn no_live_probes_is_extinction() {
        let mut state = seed_state(&EconomyConfig::default(), Utc::now());
        state.tick = 7;
        for probe in state.probes.values_mut() {
            probe.status = ProbeStatus::Destroyed;
        }
        let (scheduler, store) = scheduler(state, Arc::new(ScriptedDecisionProvider::new()));

        assert_eq!(scheduler.run_tick().await, TickOutcome::Extinct { tick: 7 });
        assert_eq!(store.current_tick().await, 7);
    }

    #[tokio::test]
    async fn manufactured_child_appears_in_probe_states() {
        let state = seed_state(&EconomyConfig::default(), Utc::now());
        let provider = Arc::new(ScriptedDecisionProvider::new());
        provider
            .push(
                SEED_PROBE_ID,
                Decision {
                    strategy: String::from("grow"),
                    priority: Priority::Expansion,
                    actions: vec![ActionProposal::new(
                        ProbeAction::Manufacture {
                            name: String::from("Riker"),
                        },
                        "enough stock",
                    )],
                },
            )
            .await;
        let (scheduler, _store) = scheduler(state, provider);

        let TickOutcome::Completed(report) = scheduler.run_tick().await else {
            panic!("expected a completed tick");
        };
        assert_eq!(report.actions_succeeded, 1);
        assert_eq!(report.probe_states.len(), 2);
        assert_eq!(report.live_probes, 2);
        assert!(
            report
                .probe_states
                .values()
                .any(|p| p.name == "Riker" && p.generation == 1)
        );
    }
}
