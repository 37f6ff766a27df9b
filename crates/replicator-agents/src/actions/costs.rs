//! Travel costs and harvest yields.
//!
//! Distances here are already in AU. Fractional costs round up, so a
//! non-zero trip always costs at least one unit of energy.

use replicator_types::ResourceVector;
use replicator_world::ceil_to_u64;

/// Energy needed to travel `distance_au`: `ceil(distance × coefficient)`.
///
/// Returns `None` if the result is not representable.
pub fn travel_energy(distance_au: f64, energy_per_distance: f64) -> Option<u64> {
    ceil_to_u64(distance_au * energy_per_distance)
}

/// Cycles needed to travel `distance_au` at `max_speed`:
/// `ceil(distance / speed)`.
///
/// Returns `None` for a non-positive speed or an unrepresentable result.
pub fn travel_time(distance_au: f64, max_speed: f64) -> Option<u64> {
    if max_speed > 0.0 {
        ceil_to_u64(distance_au / max_speed)
    } else {
        None
    }
}

/// Amount requested from a body per resource kind: `harvest_rate × duration`.
///
/// Saturates rather than overflowing; the body's stock caps the real yield.
pub fn harvest_request(harvest_rate: u64, duration: u32) -> ResourceVector {
    ResourceVector::splat(harvest_rate.saturating_mul(u64::from(duration)))
}
