//! Passive solar income applied at the start of every tick.

use chrono::{DateTime, Utc};
use replicator_types::{EventTag, Probe, ProbeStatus, ResourceVector};
use serde_json::json;

use crate::error::ActionError;
use crate::{inventory, memory};

/// Credit `income` energy to an active probe and record the charge.
///
/// Returns the energy credited: `income` for an active probe, zero for
/// any other status (no record is written in that case). Solar charging is
/// not bounded by storage capacity.
///
/// # Errors
///
/// Returns [`ActionError::InvariantViolation`] if the energy field would
/// overflow; the probe is left unchanged.
pub fn apply_solar_income(
    probe: &mut Probe,
    income: u64,
    tick: u64,
    now: DateTime<Utc>,
) -> Result<u64, ActionError> {
    if probe.status != ProbeStatus::Active {
        return Ok(0);
    }
    inventory::deposit(probe, ResourceVector::energy(income))?;
    memory::record_event(
        probe,
        EventTag::SolarCharging,
        json!({ "energy_gained": income, "energy": probe.resources.energy }),
        tick,
        now,
    );
    Ok(income)
}
