//! Experience records and memory inheritance.
//!
//! Every executed action leaves a trace in the acting probe's memory: a
//! success tag with the outcome as payload, or a failure tag with the
//! reason. The next decision sees these through the recent-experience and
//! recent-failure windows.

use chrono::{DateTime, Utc};
use replicator_types::{
    ActionKind, ActionOutcome, EventTag, Experience, FailureReason, Probe, ProbeMemory,
};
use serde_json::json;
use tracing::warn;

/// Append a success record for `outcome`.
pub fn record_success(
    probe: &mut Probe,
    kind: ActionKind,
    outcome: &ActionOutcome,
    tick: u64,
    now: DateTime<Utc>,
) {
    let payload = serde_json::to_value(outcome).unwrap_or_else(|err| {
        warn!(
            probe_id = %probe.id,
            action = kind.as_str(),
            error = %err,
            "Outcome not serializable, recording without payload"
        );
        serde_json::Value::Null
    });
    probe
        .memory
        .record(Experience::new(now, tick, kind.success_tag(), payload));
}

/// Append a failure record so the next decision can avoid the same action.
pub fn record_failure(
    probe: &mut Probe,
    kind: ActionKind,
    reason: &FailureReason,
    tick: u64,
    now: DateTime<Utc>,
) {
    let payload = json!({
        "action": kind.as_str(),
        "reason": reason.tag(),
        "detail": reason.to_string(),
    });
    probe
        .memory
        .record(Experience::new(now, tick, kind.failure_tag(), payload));
}

/// Append a free-form record with an explicit tag.
pub fn record_event(
    probe: &mut Probe,
    event: EventTag,
    payload: serde_json::Value,
    tick: u64,
    now: DateTime<Utc>,
) {
    probe.memory.record(Experience::new(now, tick, event, payload));
}

/// The memory a child starts with: an independent copy of the parent's,
/// with the parent added to the known probes.
pub fn inherit(parent: &Probe) -> ProbeMemory {
    let mut memory = parent.memory.clone();
    memory.known_probes.insert(parent.id);
    memory
}
