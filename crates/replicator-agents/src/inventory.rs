//! Probe inventory operations with storage capacity.
//!
//! A probe's storage capacity bounds the total of all resource fields.
//! Deposits and spends use checked arithmetic; a spend that was not
//! preceded by an affordability check surfaces as an invariant violation
//! instead of going negative.

use replicator_types::{Probe, ResourceVector};

use crate::error::ActionError;

/// Inventory after adding `amount`, if it stays within `capacity`.
///
/// Returns `Err(resulting_total)` when the result would exceed capacity
/// (or overflow, reported as `u64::MAX`).
pub fn fits_in_storage(
    inventory: ResourceVector,
    amount: ResourceVector,
    capacity: u64,
) -> Result<ResourceVector, u64> {
    let Some(next) = inventory.checked_add(amount) else {
        return Err(u64::MAX);
    };
    let total = next.total();
    if total > capacity {
        Err(total)
    } else {
        Ok(next)
    }
}

/// Free storage left in a probe.
pub fn headroom(probe: &Probe) -> u64 {
    probe
        .capabilities
        .storage_capacity
        .saturating_sub(probe.resources.total())
}

/// Deduct `cost` from the probe's inventory.
///
/// # Errors
///
/// Returns [`ActionError::InvariantViolation`] and leaves the inventory
/// unchanged if the probe cannot afford the cost.
pub fn spend(probe: &mut Probe, cost: ResourceVector) -> Result<(), ActionError> {
    probe.resources = probe.resources.checked_sub(cost).ok_or_else(|| {
        ActionError::invariant(format!("probe {} cannot cover {cost:?}", probe.id))
    })?;
    Ok(())
}

/// Add `amount` to the probe's inventory.
///
/// # Errors
///
/// Returns [`ActionError::InvariantViolation`] on overflow.
pub fn deposit(probe: &mut Probe, amount: ResourceVector) -> Result<(), ActionError> {
    probe.resources = probe
        .resources
        .checked_add(amount)
        .ok_or_else(|| {
            ActionError::invariant(format!("inventory overflow on probe {}", probe.id))
        })?;
    Ok(())
}
