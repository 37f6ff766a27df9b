//! Enumeration types for the Replicator simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Probe status
// ---------------------------------------------------------------------------

/// Lifecycle status of a probe.
///
/// `Active` is the resting state. `Traveling`, `Harvesting`, and
/// `Manufacturing` are transient: an action handler enters them and restores
/// `Active` before the same store mutation completes. `Destroyed` is
/// terminal; destroyed probes stay in the store but never act again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// Idle and able to act.
    Active,
    /// Moving to a new position.
    Traveling,
    /// Extracting resources from a body.
    Harvesting,
    /// Building a child probe.
    Manufacturing,
    /// Reserved for multi-tick replication.
    Replicating,
    /// Reserved for damage mechanics.
    Damaged,
    /// Permanently retired.
    Destroyed,
}

impl ProbeStatus {
    /// Whether the probe has been retired.
    pub const fn is_destroyed(self) -> bool {
        matches!(self, Self::Destroyed)
    }

    /// Whether the probe is in a transient action state.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Traveling | Self::Harvesting | Self::Manufacturing)
    }

    /// Stable snake-case name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Traveling => "traveling",
            Self::Harvesting => "harvesting",
            Self::Manufacturing => "manufacturing",
            Self::Replicating => "replicating",
            Self::Damaged => "damaged",
            Self::Destroyed => "destroyed",
        }
    }
}

impl core::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Celestial body category
// ---------------------------------------------------------------------------

/// Category of a celestial body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// The system's star.
    Star,
    /// A rocky planet.
    Planet,
    /// A single asteroid.
    Asteroid,
    /// A gas giant.
    GasGiant,
    /// A moon.
    Moon,
    /// An asteroid belt.
    Belt,
}

// ---------------------------------------------------------------------------
// Decision priority
// ---------------------------------------------------------------------------

/// Priority category a decision provider declares for a tick's strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Keep the probe alive and operational.
    Survival,
    /// Replicate.
    Expansion,
    /// Survey and move.
    Exploration,
    /// Harvest and stockpile.
    ResourceGathering,
}

impl Priority {
    /// Stable snake-case name of the priority.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Survival => "survival",
            Self::Expansion => "expansion",
            Self::Exploration => "exploration",
            Self::ResourceGathering => "resource_gathering",
        }
    }
}

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// Discriminant of a [`ProbeAction`](crate::actions::ProbeAction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Move to a target position.
    Travel,
    /// Survey a body's stock.
    Scan,
    /// Extract resources from a body.
    Harvest,
    /// Build a child probe.
    Manufacture,
    /// Do nothing this step.
    Wait,
    /// Free-form exploration with no mechanical effect.
    Explore,
}

impl ActionKind {
    /// Stable snake-case name of the action kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Scan => "scan",
            Self::Harvest => "harvest",
            Self::Manufacture => "manufacture",
            Self::Wait => "wait",
            Self::Explore => "explore",
        }
    }

    /// The event tag recorded when this action succeeds.
    pub const fn success_tag(self) -> EventTag {
        match self {
            Self::Travel => EventTag::Traveled,
            Self::Scan => EventTag::Scanned,
            Self::Harvest => EventTag::Harvested,
            Self::Manufacture => EventTag::Manufactured,
            Self::Wait => EventTag::Waited,
            Self::Explore => EventTag::Explored,
        }
    }

    /// The event tag recorded when this action fails a precondition.
    ///
    /// `Wait` and `Explore` have no preconditions; they map to a generic
    /// `action_failed` tag used only when the acting probe is destroyed.
    pub const fn failure_tag(self) -> EventTag {
        match self {
            Self::Travel => EventTag::TravelFailed,
            Self::Scan => EventTag::ScanFailed,
            Self::Harvest => EventTag::HarvestFailed,
            Self::Manufacture => EventTag::ManufactureFailed,
            Self::Wait | Self::Explore => EventTag::ActionFailed,
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Experience event tags
// ---------------------------------------------------------------------------

/// Event tag of an [`Experience`](crate::structs::Experience) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    /// A body was scanned.
    Scanned,
    /// The probe moved.
    Traveled,
    /// Resources were extracted from a body.
    Harvested,
    /// A child probe was built (recorded on parent and child).
    Manufactured,
    /// Passive solar income was received.
    SolarCharging,
    /// The probe waited.
    Waited,
    /// The probe explored.
    Explored,
    /// The probe came into existence.
    Created,
    /// A scan failed a precondition.
    ScanFailed,
    /// A travel failed a precondition.
    TravelFailed,
    /// A harvest failed a precondition.
    HarvestFailed,
    /// A manufacture failed a precondition.
    ManufactureFailed,
    /// Any other action was refused.
    ActionFailed,
}

impl EventTag {
    /// Whether this tag records a failed action.
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::ScanFailed
                | Self::TravelFailed
                | Self::HarvestFailed
                | Self::ManufactureFailed
                | Self::ActionFailed
        )
    }

    /// Stable snake-case name of the tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scanned => "scanned",
            Self::Traveled => "traveled",
            Self::Harvested => "harvested",
            Self::Manufactured => "manufactured",
            Self::SolarCharging => "solar_charging",
            Self::Waited => "waited",
            Self::Explored => "explored",
            Self::Created => "created",
            Self::ScanFailed => "scan_failed",
            Self::TravelFailed => "travel_failed",
            Self::HarvestFailed => "harvest_failed",
            Self::ManufactureFailed => "manufacture_failed",
            Self::ActionFailed => "action_failed",
        }
    }
}

impl core::fmt::Display for EventTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
