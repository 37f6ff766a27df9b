//! Per-probe pipeline: perceive, decide, act.
//!
//! One [`Pipeline::run`] call is everything a single probe does in a tick:
//!
//! 1. **Perceive** -- build a bounded [`DecisionRequest`] from one read of
//!    the store. The read lock is released before anything is awaited.
//! 2. **Decide** -- ask the [`DecisionProvider`] under the decision
//!    deadline. A failed, timed-out or empty decision is replaced by a
//!    single wait, so the probe always produces an auditable outcome.
//! 3. **Act** -- execute the proposals strictly in order. A refused action
//!    is recorded and the next one still runs; only an [`ActionError`]
//!    stops the pipeline.

use std::sync::Arc;

use replicator_agents::ActionError;
use replicator_types::{ActionProposal, ActionResult, Priority, ProbeId};
use replicator_world::DistanceScale;
use serde::Serialize;
use tracing::{Instrument, debug, info_span, warn};

use crate::action_executor::ActionExecutor;
use crate::config::PipelineConfig;
use crate::decision::{Decision, DecisionError, DecisionProvider};
use crate::events::SimulationObserver;
use crate::executor::{TaskError, TaskExecutor};
use crate::perception::{DecisionRequest, build_request};
use crate::store::EntityStore;

/// Errors that end a pipeline early.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The probe does not exist.
    #[error("probe not found: {0}")]
    ProbeNotFound(ProbeId),

    /// An action could not be applied at all.
    #[error("action error: {source}")]
    Action {
        /// The underlying action error.
        #[from]
        source: ActionError,
    },
}

/// One executed proposal and what came of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutedAction {
    /// The proposal as the provider made it.
    pub proposal: ActionProposal,
    /// The executor's answer.
    pub result: ActionResult,
}

/// What one probe did in one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// The probe.
    pub probe_id: ProbeId,
    /// Name of the provider that was asked.
    pub provider: String,
    /// Strategy summary of the executed decision.
    pub strategy: String,
    /// Declared priority of the executed decision.
    pub priority: Priority,
    /// Whether the decision was replaced by the fallback wait.
    pub fell_back: bool,
    /// Proposals dropped for exceeding the action limit.
    pub dropped: usize,
    /// Executed proposals, in execution order.
    pub actions: Vec<ExecutedAction>,
}

impl PipelineReport {
    /// Number of actions that took effect.
    pub fn succeeded(&self) -> usize {
        self.actions.iter().filter(|a| a.result.ok).count()
    }

    /// Number of actions that were refused.
    pub fn failed(&self) -> usize {
        self.actions.iter().filter(|a| !a.result.ok).count()
    }
}

/// Runs the perceive-decide-act cycle for single probes.
///
/// Cheap to clone; every clone shares the same store, provider and
/// observer, so one clone can be moved into each spawned per-probe task.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<EntityStore>,
    provider: Arc<dyn DecisionProvider>,
    observer: Arc<dyn SimulationObserver>,
    actions: ActionExecutor,
    tasks: TaskExecutor,
    config: PipelineConfig,
    scale: DistanceScale,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Assemble a pipeline.
    pub const fn new(
        store: Arc<EntityStore>,
        provider: Arc<dyn DecisionProvider>,
        observer: Arc<dyn SimulationObserver>,
        actions: ActionExecutor,
        config: PipelineConfig,
        scale: DistanceScale,
    ) -> Self {
        Self {
            store,
            provider,
            observer,
            actions,
            tasks: TaskExecutor::new("pipeline"),
            config,
            scale,
        }
    }

    /// Run one probe's tick.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ProbeNotFound`] if the probe is gone, or
    /// [`PipelineError::Action`] if an action broke an invariant. Actions
    /// executed before the error stay applied.
    pub async fn run(&self, probe_id: ProbeId, tick: u64) -> Result<PipelineReport, PipelineError> {
        let span = info_span!("pipeline", tick, probe_id = %probe_id);
        self.run_inner(probe_id, tick).instrument(span).await
    }

    async fn run_inner(
        &self,
        probe_id: ProbeId,
        tick: u64,
    ) -> Result<PipelineReport, PipelineError> {
        // --- Perceive ---
        let request = self
            .store
            .read(|state| {
                state
                    .probes
                    .get(&probe_id)
                    .map(|probe| build_request(state, probe, tick, &self.config, self.scale))
            })
            .await
            .ok_or(PipelineError::ProbeNotFound(probe_id))?;

        // --- Decide ---
        let (decision, fell_back) = self.decide(&request).await;
        let (proposals, dropped) = truncate(decision.actions, self.config.max_actions);
        if dropped > 0 {
            warn!(
                tick,
                probe_id = %probe_id,
                dropped,
                max_actions = self.config.max_actions,
                "Dropping proposals over the action limit"
            );
        }

        // --- Act ---
        let mut executed = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let result = self.actions.execute(probe_id, &proposal.action, tick).await?;
            self.observer
                .on_action_executed(tick, probe_id, &proposal, &result);
            executed.push(ExecutedAction { proposal, result });
        }

        Ok(PipelineReport {
            probe_id,
            provider: self.provider.name().to_owned(),
            strategy: decision.strategy,
            priority: decision.priority,
            fell_back,
            dropped,
            actions: executed,
        })
    }

    /// Ask the provider, substituting a wait for anything unusable.
    async fn decide(&self, request: &DecisionRequest) -> (Decision, bool) {
        let probe_id = request.probe.id;
        let outcome = self
            .tasks
            .run(
                "decide",
                self.config.decision_timeout(),
                self.provider.decide(request),
            )
            .await
            .map_err(|err| match err {
                TaskError::TimedOut { timeout_ms, .. } => DecisionError::Timeout {
                    probe_id,
                    deadline_ms: timeout_ms,
                },
                TaskError::Failed { message, .. } => DecisionError::Internal { message },
            });

        let reason = match outcome {
            Ok(decision) if !decision.actions.is_empty() => {
                debug!(
                    tick = request.tick,
                    probe_id = %probe_id,
                    priority = decision.priority.as_str(),
                    proposals = decision.actions.len(),
                    "Decision received"
                );
                return (decision, false);
            }
            Ok(_) => String::from("decision contained no actions"),
            Err(err) => err.to_string(),
        };

        warn!(
            tick = request.tick,
            probe_id = %probe_id,
            provider = self.provider.name(),
            reason = reason.as_str(),
            "Decision unavailable, waiting instead"
        );
        self.observer
            .on_decision_fallback(request.tick, probe_id, &reason);
        (Decision::wait(format!("Fallback: {reason}")), true)
    }
}

/// Keep at most `limit` proposals and count the rest.
fn truncate(mut proposals: Vec<ActionProposal>, limit: usize) -> (Vec<ActionProposal>, usize) {
    let dropped = proposals.len().saturating_sub(limit);
    proposals.truncate(limit);
    (proposals, dropped)
}
