//! Structured progress events.
//!
//! The scheduler and the pipelines report what they are doing through a
//! [`SimulationObserver`] instead of writing to a particular sink. Every
//! method has a no-op default, so an observer implements only what it
//! cares about. [`TracingObserver`] forwards everything to `tracing`.
//!
//! Observers are called from concurrently running pipelines and must not
//! block.

use replicator_types::{ActionProposal, ActionResult, ProbeId};
use tracing::{debug, info, warn};

use crate::runner::SimulationResult;
use crate::store::StoreError;
use crate::tick::{ProbeTickResult, TickReport};

/// Receives progress events from a running simulation.
pub trait SimulationObserver: Send + Sync {
    /// A tick is starting with `active` live probes.
    fn on_tick_started(&self, _tick: u64, _active: usize) {}

    /// A probe received passive solar income.
    fn on_solar_charge(&self, _tick: u64, _probe_id: ProbeId, _energy: u64) {}

    /// A probe's decision failed and was replaced by a wait.
    fn on_decision_fallback(&self, _tick: u64, _probe_id: ProbeId, _reason: &str) {}

    /// One proposed action was executed (successfully or not).
    fn on_action_executed(
        &self,
        _tick: u64,
        _probe_id: ProbeId,
        _proposal: &ActionProposal,
        _result: &ActionResult,
    ) {
    }

    /// A probe's pipeline finished, or failed as a whole.
    fn on_pipeline_finished(&self, _tick: u64, _probe_id: ProbeId, _result: &ProbeTickResult) {}

    /// A tick completed.
    fn on_tick_completed(&self, _report: &TickReport) {}

    /// The end-of-tick snapshot could not be written.
    fn on_persistence_failed(&self, _tick: u64, _error: &StoreError) {}

    /// The simulation loop stopped.
    fn on_simulation_ended(&self, _result: &SimulationResult) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl SimulationObserver for NoOpObserver {}

/// Forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SimulationObserver for TracingObserver {
    fn on_tick_started(&self, tick: u64, active: usize) {
        info!(tick, active, "Tick started");
    }

    fn on_solar_charge(&self, tick: u64, probe_id: ProbeId, energy: u64) {
        debug!(tick, probe_id = %probe_id, energy, "Solar charge");
    }

    fn on_decision_fallback(&self, tick: u64, probe_id: ProbeId, reason: &str) {
        warn!(tick, probe_id = %probe_id, reason, "Decision fell back to wait");
    }

    fn on_action_executed(
        &self,
        tick: u64,
        probe_id: ProbeId,
        proposal: &ActionProposal,
        result: &ActionResult,
    ) {
        debug!(
            tick,
            probe_id = %probe_id,
            action = result.kind.as_str(),
            ok = result.ok,
            reason = result.reason_tag(),
            reasoning = proposal.reasoning.as_str(),
            "Action executed"
        );
    }

    fn on_pipeline_finished(&self, tick: u64, probe_id: ProbeId, result: &ProbeTickResult) {
        match result {
            ProbeTickResult::Completed(report) => debug!(
                tick,
                probe_id = %probe_id,
                priority = report.priority.as_str(),
                actions = report.actions.len(),
                "Pipeline finished"
            ),
            ProbeTickResult::Failed { reason } => {
                warn!(tick, probe_id = %probe_id, reason = reason.as_str(), "Pipeline failed");
            }
        }
    }

    fn on_tick_completed(&self, report: &TickReport) {
        info!(
            tick = report.tick,
            active = report.active_probes,
            succeeded = report.succeeded,
            failed = report.failed,
            actions_succeeded = report.actions_succeeded,
            actions_failed = report.actions_failed,
            persisted = report.persisted,
            "Tick completed"
        );
    }

    fn on_persistence_failed(&self, tick: u64, error: &StoreError) {
        warn!(tick, error = %error, "Tick state kept in memory only");
    }

    fn on_simulation_ended(&self, result: &SimulationResult) {
        info!(
            reason = ?result.end_reason,
            total_ticks = result.total_ticks,
            final_tick = result.final_tick,
            "Simulation ended"
        );
    }
}
