//! Simulation control: wiring and the bounded tick loop.
//!
//! [`Simulation`] owns everything one run needs: the entity store opened
//! from its snapshot backend, the decision provider, the observer, and the
//! tick scheduler built over them. Components receive the store by handle;
//! there is no process-wide state.
//!
//! [`Simulation::start`] drives [`TickScheduler::run_tick`] until one of:
//!
//! - **Extinction**: no non-destroyed probe is left, either at tick start
//!   (the tick is not counted) or after a tick completes.
//! - **Tick limit**: `max_ticks` ticks have run in this call (0 means no
//!   limit).
//!
//! Between ticks the loop sleeps for the configured interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use replicator_db::{JsonFileSnapshotStore, SnapshotStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::action_executor::ActionExecutor;
use crate::config::{ConfigError, SimulationConfig};
use crate::decision::DecisionProvider;
use crate::events::SimulationObserver;
use crate::pipeline::Pipeline;
use crate::status::SimulationStatus;
use crate::store::{EntityStore, StoreOptions};
use crate::tick::{TickOutcome, TickReport, TickScheduler};

/// Errors that prevent a simulation from being set up.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration is invalid.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },
}

/// Why the simulation loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// The requested number of ticks ran.
    MaxTicksReached,
    /// No probe is left to act.
    Extinction,
}

/// Result of one [`Simulation::start`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Why the loop stopped.
    pub end_reason: SimulationEndReason,
    /// Ticks run by this call.
    pub total_ticks: u64,
    /// The store's tick counter when the loop stopped.
    pub final_tick: u64,
    /// The last completed tick, if any ran.
    pub final_report: Option<TickReport>,
}

/// One wired-up simulation.
pub struct Simulation {
    config: SimulationConfig,
    store: Arc<EntityStore>,
    scheduler: TickScheduler,
    observer: Arc<dyn SimulationObserver>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Validate `config`, open the store from `backend` and wire the
    /// scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the configuration is invalid. A
    /// missing or unreadable snapshot is not an error; the store starts
    /// from the seed state.
    pub async fn new(
        config: SimulationConfig,
        backend: Arc<dyn SnapshotStore>,
        provider: Arc<dyn DecisionProvider>,
        observer: Arc<dyn SimulationObserver>,
    ) -> Result<Self, RunnerError> {
        config.validate()?;

        let store = Arc::new(
            EntityStore::open(
                backend,
                StoreOptions::from(&config.persistence),
                &config.economy,
            )
            .await,
        );
        let scale = config.world.units_per_au;
        let actions = ActionExecutor::new(store.clone(), config.economy.clone(), scale);
        let pipeline = Pipeline::new(
            store.clone(),
            provider,
            observer.clone(),
            actions,
            config.pipeline.clone(),
            scale,
        );
        let scheduler = TickScheduler::new(
            store.clone(),
            pipeline,
            observer.clone(),
            config.economy.solar_income,
            config.pipeline.pipeline_timeout(),
        );

        Ok(Self {
            config,
            store,
            scheduler,
            observer,
        })
    }

    /// Like [`Simulation::new`], persisting to the configured JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the configuration is invalid.
    pub async fn from_config(
        config: SimulationConfig,
        provider: Arc<dyn DecisionProvider>,
        observer: Arc<dyn SimulationObserver>,
    ) -> Result<Self, RunnerError> {
        let backend = Arc::new(JsonFileSnapshotStore::new(
            config.persistence.snapshot_path.clone(),
        ));
        Self::new(config, backend, provider, observer).await
    }

    /// The entity store.
    pub const fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// The configuration in effect.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run a single tick outside the loop.
    pub async fn run_tick(&self) -> TickOutcome {
        self.scheduler.run_tick().await
    }

    /// Run with the configured bounds.
    pub async fn run(&self) -> SimulationResult {
        self.start(
            self.config.simulation.max_ticks,
            self.config.simulation.tick_interval_ms,
        )
        .await
    }

    /// Run ticks until `max_ticks` have run (0 = no limit) or no probe is
    /// left, sleeping `tick_duration_ms` between ticks.
    pub async fn start(&self, max_ticks: u64, tick_duration_ms: u64) -> SimulationResult {
        let mut total_ticks: u64 = 0;
        let mut final_report: Option<TickReport> = None;

        info!(
            max_ticks,
            tick_duration_ms,
            tick = self.store.current_tick().await,
            "Simulation starting"
        );

        let end_reason = loop {
            let report = match self.scheduler.run_tick().await {
                TickOutcome::Extinct { tick } => {
                    info!(tick, "All probes destroyed -- extinction");
                    break SimulationEndReason::Extinction;
                }
                TickOutcome::Completed(report) => report,
            };
            total_ticks = total_ticks.saturating_add(1);
            let live = report.live_probes;
            let tick = report.tick;
            final_report = Some(report);

            // --- Check extinction (after tick) ---
            if live == 0 {
                info!(tick, "No probes left after tick -- extinction");
                break SimulationEndReason::Extinction;
            }

            // --- Check tick limit ---
            if max_ticks > 0 && total_ticks >= max_ticks {
                info!(tick, max_ticks, "Tick limit reached");
                break SimulationEndReason::MaxTicksReached;
            }

            if tick_duration_ms > 0 {
                tokio::time::sleep(Duration::from_millis(tick_duration_ms)).await;
            }
        };

        if final_report.is_none() {
            warn!("Simulation ended with no ticks executed");
        }

        let result = SimulationResult {
            end_reason,
            total_ticks,
            final_tick: self.store.current_tick().await,
            final_report,
        };
        self.observer.on_simulation_ended(&result);
        result
    }

    /// Current operator status. Never mutates.
    pub async fn status(&self) -> SimulationStatus {
        let degraded = self.store.durability_degraded();
        self.store
            .read(|state| SimulationStatus::from_state(state, degraded, Utc::now()))
            .await
    }
}
