//! Validation and execution of probe actions.
//!
//! [`execute_action`] is the single entry point. It runs entirely on a
//! `&mut WorldState` the caller holds exclusively (the entity store's write
//! lock), so validation and mutation are one atomic step: either every
//! precondition holds and all effects are committed together, or nothing
//! but a failure record is written.
//!
//! # Submodules
//!
//! - [`costs`] -- Travel energy and time, harvest yields.
//! - [`validation`] -- Per-kind precondition checks producing an [`ActionPlan`].
//! - [`handlers`] -- Commit an [`ActionPlan`] to the world state.

pub mod costs;
pub mod handlers;
pub mod validation;

use chrono::{DateTime, Utc};
use replicator_types::{ActionResult, FailureReason, ProbeAction, ProbeId, WorldState};
use replicator_world::DistanceScale;
use tracing::debug;

use crate::config::EconomyConfig;
use crate::error::ActionError;
use crate::memory;

pub use validation::ActionPlan;

/// Everything an action needs besides the world state itself.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Economy parameters.
    pub economy: &'a EconomyConfig,
    /// Raw-unit to AU conversion.
    pub scale: DistanceScale,
    /// The tick the action belongs to.
    pub tick: u64,
    /// Wall-clock time stamped on experience records.
    pub now: DateTime<Utc>,
}

/// Validate and apply one action for `probe_id`.
///
/// A failed precondition is not an error: it returns a failed
/// [`ActionResult`] and appends a failure experience to the probe.
///
/// # Errors
///
/// Returns [`ActionError::ProbeNotFound`] if the probe does not exist and
/// [`ActionError::InvariantViolation`] if a validated mutation would still
/// break a resource invariant. In both cases the state is unchanged.
pub fn execute_action(
    state: &mut WorldState,
    probe_id: ProbeId,
    action: &ProbeAction,
    ctx: &ActionContext<'_>,
) -> Result<ActionResult, ActionError> {
    let kind = action.kind();
    let probe = state
        .probes
        .get(&probe_id)
        .ok_or(ActionError::ProbeNotFound(probe_id))?;

    let validated = if probe.status.is_destroyed() {
        Err(FailureReason::ProbeDestroyed)
    } else {
        validation::validate_action(state, probe, action, ctx)
    };

    match validated {
        Err(reason) => {
            debug!(
                probe_id = %probe_id,
                action = kind.as_str(),
                reason = reason.tag(),
                "action refused"
            );
            let probe = state
                .probes
                .get_mut(&probe_id)
                .ok_or(ActionError::ProbeNotFound(probe_id))?;
            memory::record_failure(probe, kind, &reason, ctx.tick, ctx.now);
            Ok(ActionResult::failure(kind, reason))
        }
        Ok(plan) => {
            let outcome = handlers::apply_plan(state, probe_id, plan, ctx)?;
            let probe = state
                .probes
                .get_mut(&probe_id)
                .ok_or(ActionError::ProbeNotFound(probe_id))?;
            memory::record_success(probe, kind, &outcome, ctx.tick, ctx.now);
            debug!(probe_id = %probe_id, action = kind.as_str(), "action applied");
            Ok(ActionResult::success(kind, outcome))
        }
    }
}
