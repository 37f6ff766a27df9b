//! Error types for the replicator-agents crate.
//!
//! Precondition failures are not errors: they come back as a
//! [`FailureReason`](replicator_types::FailureReason) inside an
//! [`ActionResult`](replicator_types::ActionResult). The variants here are
//! the conditions no caller can recover from within the same action.

use replicator_types::ProbeId;
use replicator_world::WorldError;

/// Errors that abort a single action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The acting probe does not exist.
    #[error("probe not found: {0}")]
    ProbeNotFound(ProbeId),

    /// A probe id was inserted twice.
    #[error("duplicate probe id: {0}")]
    DuplicateProbe(ProbeId),

    /// A mutation slipped past validation and would break a resource
    /// invariant. The mutation is abandoned.
    #[error("invariant violation: {context}")]
    InvariantViolation {
        /// What was being computed.
        context: String,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

impl ActionError {
    /// Shorthand for an [`ActionError::InvariantViolation`].
    pub fn invariant(context: impl Into<String>) -> Self {
        Self::InvariantViolation {
            context: context.into(),
        }
    }
}
