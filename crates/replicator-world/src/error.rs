//! Error types for the `replicator-world` crate.

use replicator_types::{BodyId, SystemId};

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A body was not found in any system.
    #[error("body not found: {0}")]
    BodyNotFound(BodyId),

    /// A system was not found.
    #[error("system not found: {0}")]
    SystemNotFound(SystemId),

    /// The distance scale must be a positive finite number.
    #[error("invalid distance scale: {units_per_au} units per AU")]
    InvalidScale {
        /// The rejected factor.
        units_per_au: f64,
    },

    /// A withdrawal asked for more than the body holds.
    #[error("body {body} does not hold the requested stock")]
    InsufficientStock {
        /// The body being drained.
        body: BodyId,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
