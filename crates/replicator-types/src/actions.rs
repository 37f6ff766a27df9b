//! Action proposals and the typed result envelope.
//!
//! A decision provider proposes [`ProbeAction`]s; the action executor
//! validates each one against the entity store and answers with an
//! [`ActionResult`]. Precondition failures are values here, not errors: a
//! failed action carries a [`FailureReason`] with a stable tag the next
//! decision can react to.

use serde::{Deserialize, Serialize};

use crate::enums::ActionKind;
use crate::ids::{BodyId, ProbeId};
use crate::resources::ResourceVector;
use crate::structs::Position;

// ---------------------------------------------------------------------------
// Proposed actions
// ---------------------------------------------------------------------------

/// One action a probe can take, with the parameters specific to its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeAction {
    /// Move to `target`, paying energy proportional to distance.
    Travel {
        /// Destination in raw distance units.
        target: Position,
    },
    /// Record a body's current stock into memory.
    Scan {
        /// The body to survey.
        body_id: BodyId,
    },
    /// Extract resources from a nearby body.
    Harvest {
        /// The body to extract from.
        body_id: BodyId,
        /// Number of harvest cycles.
        duration: u32,
    },
    /// Build a child probe.
    Manufacture {
        /// Display name of the child.
        name: String,
    },
    /// Do nothing.
    Wait,
    /// Explore without mechanical effect.
    Explore,
}

impl ProbeAction {
    /// The discriminant of this action.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Travel { .. } => ActionKind::Travel,
            Self::Scan { .. } => ActionKind::Scan,
            Self::Harvest { .. } => ActionKind::Harvest,
            Self::Manufacture { .. } => ActionKind::Manufacture,
            Self::Wait => ActionKind::Wait,
            Self::Explore => ActionKind::Explore,
        }
    }
}

/// A proposed action plus the provider's free-text reasoning for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionProposal {
    /// What to do.
    pub action: ProbeAction,
    /// Why, in the provider's words.
    #[serde(default)]
    pub reasoning: String,
}

impl ActionProposal {
    /// Build a proposal.
    pub fn new(action: ProbeAction, reasoning: impl Into<String>) -> Self {
        Self {
            action,
            reasoning: reasoning.into(),
        }
    }

    /// A single wait proposal with the given reasoning.
    pub fn wait(reasoning: impl Into<String>) -> Self {
        Self::new(ProbeAction::Wait, reasoning)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What a successful action did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The probe moved.
    Traveled {
        /// Where it started.
        from: Position,
        /// Where it arrived.
        to: Position,
        /// Distance covered in AU.
        distance_au: f64,
        /// Energy deducted.
        energy_spent: u64,
        /// Travel time in cycles, for display.
        travel_time: u64,
    },
    /// A body was surveyed.
    Scanned {
        /// The scanned body.
        body_id: BodyId,
        /// Its display name.
        body_name: String,
        /// Distance to it in AU.
        distance_au: f64,
        /// Its stock at the time of the scan.
        resources: ResourceVector,
    },
    /// Resources moved from a body into the probe.
    Harvested {
        /// The source body.
        body_id: BodyId,
        /// Cycles spent.
        duration: u32,
        /// Amount transferred per kind.
        extracted: ResourceVector,
    },
    /// A child probe was built.
    Manufactured {
        /// The child's id.
        child_id: ProbeId,
        /// The child's display name.
        child_name: String,
        /// The child's generation.
        generation: u32,
        /// Resources deducted from the parent.
        cost: ResourceVector,
    },
    /// The probe waited.
    Waited,
    /// The probe explored.
    Explored,
}

// ---------------------------------------------------------------------------
// Failure reasons
// ---------------------------------------------------------------------------

/// Why an action's preconditions did not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// Not enough energy to travel.
    InsufficientEnergy {
        /// Energy the trip costs.
        required: u64,
        /// Energy the probe holds.
        available: u64,
    },
    /// Scan target beyond sensor range.
    OutOfRange {
        /// Distance to the target in AU.
        distance_au: f64,
        /// Sensor range in AU.
        range: f64,
    },
    /// Harvest target beyond the close-proximity threshold.
    TooFar {
        /// Distance to the target in AU.
        distance_au: f64,
        /// Maximum harvest distance in AU.
        proximity: f64,
    },
    /// The harvest would exceed storage capacity.
    StorageFull {
        /// Total inventory after the harvest.
        resulting_total: u64,
        /// The probe's capacity.
        capacity: u64,
    },
    /// The inventory cannot cover a cost vector.
    InsufficientResources {
        /// The cost.
        required: ResourceVector,
        /// The inventory.
        available: ResourceVector,
    },
    /// Harvest duration outside the allowed bounds.
    InvalidDuration {
        /// The requested duration.
        duration: u32,
        /// The allowed maximum.
        max: u32,
    },
    /// A blank child name.
    InvalidName,
    /// The referenced body does not exist.
    BodyNotFound {
        /// The missing id.
        body_id: BodyId,
    },
    /// The acting probe has been retired.
    ProbeDestroyed,
}

impl FailureReason {
    /// Stable snake-case tag of the reason.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::InsufficientEnergy { .. } => "insufficient_energy",
            Self::OutOfRange { .. } => "out_of_range",
            Self::TooFar { .. } => "too_far",
            Self::StorageFull { .. } => "storage_full",
            Self::InsufficientResources { .. } => "insufficient_resources",
            Self::InvalidDuration { .. } => "invalid_duration",
            Self::InvalidName => "invalid_name",
            Self::BodyNotFound { .. } => "body_not_found",
            Self::ProbeDestroyed => "probe_destroyed",
        }
    }
}

impl core::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsufficientEnergy {
                required,
                available,
            } => write!(f, "insufficient energy: need {required}, have {available}"),
            Self::OutOfRange { distance_au, range } => {
                write!(f, "target {distance_au:.2} AU away, sensor range {range:.2} AU")
            }
            Self::TooFar {
                distance_au,
                proximity,
            } => write!(
                f,
                "target {distance_au:.2} AU away, must be within {proximity:.2} AU"
            ),
            Self::StorageFull {
                resulting_total,
                capacity,
            } => write!(f, "storage full: {resulting_total} exceeds {capacity}"),
            Self::InsufficientResources { .. } => f.write_str("insufficient resources"),
            Self::InvalidDuration { duration, max } => {
                write!(f, "duration {duration} outside 1..={max}")
            }
            Self::InvalidName => f.write_str("name must not be blank"),
            Self::BodyNotFound { body_id } => write!(f, "body {body_id} not found"),
            Self::ProbeDestroyed => f.write_str("probe is destroyed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// The typed envelope every action executor returns.
///
/// Exactly one of `data` and `error_reason` is present, matching `ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Which action this answers.
    pub kind: ActionKind,
    /// Whether the action took effect.
    pub ok: bool,
    /// Outcome of a successful action.
    pub data: Option<ActionOutcome>,
    /// Reason a failed action was refused.
    pub error_reason: Option<FailureReason>,
}

impl ActionResult {
    /// A successful result.
    pub const fn success(kind: ActionKind, outcome: ActionOutcome) -> Self {
        Self {
            kind,
            ok: true,
            data: Some(outcome),
            error_reason: None,
        }
    }

    /// A refused action.
    pub const fn failure(kind: ActionKind, reason: FailureReason) -> Self {
        Self {
            kind,
            ok: false,
            data: None,
            error_reason: Some(reason),
        }
    }

    /// The failure tag, if the action was refused.
    pub fn reason_tag(&self) -> Option<&'static str> {
        self.error_reason.as_ref().map(FailureReason::tag)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn action_json_is_tagged_by_kind() {
        let action = ProbeAction::Harvest {
            body_id: BodyId::from_u128(7),
            duration: 5,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["kind"], "harvest");
        assert_eq!(json["duration"], 5);
        let wait: ProbeAction = serde_json::from_str(r#"{"kind":"wait"}"#).unwrap();
        assert_eq!(wait, ProbeAction::Wait);
        assert_eq!(action.kind(), ActionKind::Harvest);
    }

    #[test]
    fn envelope_constructors_are_exclusive() {
        let ok = ActionResult::success(ActionKind::Wait, ActionOutcome::Waited);
        assert!(ok.ok);
        assert!(ok.error_reason.is_none());
        assert_eq!(ok.reason_tag(), None);

        let failed = ActionResult::failure(
            ActionKind::Harvest,
            FailureReason::TooFar {
                distance_au: 3.0,
                proximity: 1.0,
            },
        );
        assert!(!failed.ok);
        assert!(failed.data.is_none());
        assert_eq!(failed.reason_tag(), Some("too_far"));
    }

    #[test]
    fn reason_serde_tag_matches_tag() {
        let reason = FailureReason::StorageFull {
            resulting_total: 11,
            capacity: 10,
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["reason"], reason.tag());
        assert!(reason.to_string().contains("storage full"));
    }
}
