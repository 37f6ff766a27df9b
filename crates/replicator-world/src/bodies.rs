//! Celestial body ranking and stock extraction.
//!
//! Harvesting is a transfer: whatever a probe gains, a body loses. The
//! functions here split that into a pure planning step ([`extractable`])
//! and a commit step ([`withdraw`]) so callers can validate the whole
//! action before touching either side.

use replicator_types::{
    BodyId, BodyKind, CelestialBody, Position, ResourceVector, SystemId, WorldState,
};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::geometry::DistanceScale;

/// A body as seen from some vantage point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyBody {
    /// The body's id.
    pub body_id: BodyId,
    /// The system containing it.
    pub system_id: SystemId,
    /// Display name.
    pub name: String,
    /// Category.
    pub kind: BodyKind,
    /// Location in raw units.
    pub position: Position,
    /// Distance from the vantage point in AU.
    pub distance_au: f64,
    /// Current stock.
    pub resources: ResourceVector,
}

/// Every body in the world ranked by ascending distance from `origin`.
///
/// Ties keep system then body order. At most `limit` bodies are returned.
pub fn nearby_bodies(
    state: &WorldState,
    origin: &Position,
    scale: DistanceScale,
    limit: usize,
) -> Vec<NearbyBody> {
    let mut ranked: Vec<NearbyBody> = state
        .systems
        .values()
        .flat_map(|system| {
            system.all_bodies().map(move |body| NearbyBody {
                body_id: body.id,
                system_id: system.id,
                name: body.name.clone(),
                kind: body.kind,
                position: body.position,
                distance_au: scale.distance_au(origin, &body.position),
                resources: body.resources,
            })
        })
        .collect();
    ranked.sort_by(|a, b| a.distance_au.total_cmp(&b.distance_au));
    ranked.truncate(limit);
    ranked
}

/// How much of `requested` a body with `stock` can actually give.
pub fn extractable(stock: ResourceVector, requested: ResourceVector) -> ResourceVector {
    requested.min_each(stock)
}

/// Remove `amount` from a body's stock.
///
/// # Errors
///
/// Returns [`WorldError::InsufficientStock`] and leaves the body unchanged
/// if any field of `amount` exceeds the stock.
pub fn withdraw(body: &mut CelestialBody, amount: ResourceVector) -> Result<(), WorldError> {
    body.resources = body
        .resources
        .checked_sub(amount)
        .ok_or(WorldError::InsufficientStock { body: body.id })?;
    Ok(())
}
