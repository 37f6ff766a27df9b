//! Euclidean geometry with a single distance scale.
//!
//! Positions are stored in raw distance units. Every range comparison,
//! travel cost, and displayed distance goes through one [`DistanceScale`],
//! so the conversion to AU happens in exactly one place.

use replicator_types::Position;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Raw Euclidean distance between two positions.
pub fn euclidean(a: &Position, b: &Position) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
}

/// Conversion factor from raw distance units to AU.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DistanceScale {
    units_per_au: f64,
}

impl DistanceScale {
    /// One raw unit per AU: coordinates are already in AU.
    pub const AU: Self = Self { units_per_au: 1.0 };

    /// Build a scale from a raw-units-per-AU factor.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidScale`] unless the factor is finite and
    /// strictly positive.
    pub fn new(units_per_au: f64) -> Result<Self, WorldError> {
        if units_per_au.is_finite() && units_per_au > 0.0 {
            Ok(Self { units_per_au })
        } else {
            Err(WorldError::InvalidScale { units_per_au })
        }
    }

    /// The raw-units-per-AU factor.
    pub const fn units_per_au(self) -> f64 {
        self.units_per_au
    }

    /// Convert a raw distance to AU.
    pub fn to_au(self, raw: f64) -> f64 {
        raw / self.units_per_au
    }

    /// Distance between two positions in AU.
    pub fn distance_au(self, a: &Position, b: &Position) -> f64 {
        self.to_au(euclidean(a, b))
    }
}

impl Default for DistanceScale {
    fn default() -> Self {
        Self::AU
    }
}

impl TryFrom<f64> for DistanceScale {
    type Error = WorldError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DistanceScale> for f64 {
    fn from(scale: DistanceScale) -> Self {
        scale.units_per_au
    }
}

/// Round a non-negative real up to the next integer.
///
/// Returns `None` for negative, non-finite, or out-of-range input.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn ceil_to_u64(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let rounded = value.ceil();
    // u64::MAX as f64 rounds up to 2^64, which is itself out of range.
    if rounded >= u64::MAX as f64 {
        return None;
    }
    Some(rounded as u64)
}
