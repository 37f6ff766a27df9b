//! Core entity structs for the Replicator simulation.
//!
//! Probes, solar systems, and celestial bodies are plain data. All mutation
//! of live state goes through the entity store in `replicator-core`; the
//! [`WorldState`] defined here is both the store's in-memory contents and
//! the self-describing snapshot document written to durable storage.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{BodyKind, EventTag, ProbeStatus};
use crate::ids::{BodyId, ProbeId, SystemId};
use crate::resources::ResourceVector;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in space, in raw distance units.
///
/// Raw units are converted to AU by the world crate's distance scale before
/// any comparison or cost calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Position {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Build a position from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether every coordinate is a finite number.
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Celestial bodies and systems
// ---------------------------------------------------------------------------

/// A star, planet, moon, asteroid, gas giant, or belt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    /// Unique body identifier.
    pub id: BodyId,
    /// Display name.
    pub name: String,
    /// Body category.
    pub kind: BodyKind,
    /// Location in raw distance units.
    pub position: Position,
    /// Remaining extractable stock.
    pub resources: ResourceVector,
    /// Mass in Earth masses (display only).
    pub mass: f64,
    /// Radius in kilometres (display only).
    pub radius_km: f64,
}

/// Who found a system and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    /// The discovering probe.
    pub discovered_by: ProbeId,
    /// When the discovery happened.
    pub discovered_at: DateTime<Utc>,
}

/// A solar system: one star and an ordered list of other bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarSystem {
    /// Unique system identifier.
    pub id: SystemId,
    /// Display name.
    pub name: String,
    /// Galactic position in raw distance units.
    pub position: Position,
    /// The system's star.
    pub star: CelestialBody,
    /// Non-star bodies in display order.
    pub bodies: Vec<CelestialBody>,
    /// Discovery metadata, absent for the seed system.
    #[serde(default)]
    pub discovery: Option<Discovery>,
}

impl SolarSystem {
    /// Iterate over every body in the system, star first.
    pub fn all_bodies(&self) -> impl Iterator<Item = &CelestialBody> {
        core::iter::once(&self.star).chain(self.bodies.iter())
    }

    /// Look up a body (star included) by id.
    pub fn body(&self, id: BodyId) -> Option<&CelestialBody> {
        self.all_bodies().find(|body| body.id == id)
    }

    /// Look up a body (star included) by id for mutation.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut CelestialBody> {
        if self.star.id == id {
            return Some(&mut self.star);
        }
        self.bodies.iter_mut().find(|body| body.id == id)
    }

    /// Number of bodies including the star.
    pub const fn body_count(&self) -> usize {
        self.bodies.len().saturating_add(1)
    }
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

/// Fixed capabilities of a probe, set at creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Travel speed in AU per cycle.
    pub max_speed: f64,
    /// Units extracted per resource kind per harvest cycle.
    pub harvest_rate: u64,
    /// Scan range in AU.
    pub sensor_range: f64,
    /// Communication range in AU.
    pub communication_range: f64,
    /// Maximum total inventory across all resource kinds.
    pub storage_capacity: u64,
}

/// A timestamped record of something that happened to a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    /// Wall-clock time of the event.
    pub timestamp: DateTime<Utc>,
    /// Simulation tick during which the event happened.
    pub tick: u64,
    /// What happened.
    pub event: EventTag,
    /// Event-specific structured data.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Experience {
    /// Build an experience record.
    pub const fn new(
        timestamp: DateTime<Utc>,
        tick: u64,
        event: EventTag,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            timestamp,
            tick,
            event,
            payload,
        }
    }
}

/// A probe's accumulated knowledge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeMemory {
    /// Append-only experience log, oldest first.
    #[serde(default)]
    pub experiences: Vec<Experience>,
    /// Probes this probe knows about.
    #[serde(default)]
    pub known_probes: BTreeSet<ProbeId>,
    /// Systems this probe has visited or surveyed.
    #[serde(default)]
    pub visited_systems: BTreeSet<SystemId>,
    /// Last observed stock of each scanned body.
    #[serde(default)]
    pub discovered_resources: BTreeMap<BodyId, ResourceVector>,
}

impl ProbeMemory {
    /// Append one experience to the log.
    pub fn record(&mut self, experience: Experience) {
        self.experiences.push(experience);
    }

    /// The last `count` experiences, oldest first.
    pub fn recent(&self, count: usize) -> &[Experience] {
        let start = self.experiences.len().saturating_sub(count);
        self.experiences.get(start..).unwrap_or_default()
    }

    /// The last `count` failure experiences, oldest first.
    pub fn recent_failures(&self, count: usize) -> Vec<Experience> {
        let mut failures: Vec<Experience> = self
            .experiences
            .iter()
            .rev()
            .filter(|experience| experience.event.is_failure())
            .take(count)
            .cloned()
            .collect();
        failures.reverse();
        failures
    }
}

/// An autonomous self-replicating probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    /// Unique probe identifier.
    pub id: ProbeId,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: ProbeStatus,
    /// Location in raw distance units.
    pub position: Position,
    /// The system the probe is in.
    pub system_id: SystemId,
    /// Inventory.
    pub resources: ResourceVector,
    /// Fixed capabilities.
    pub capabilities: Capabilities,
    /// Accumulated knowledge.
    #[serde(default)]
    pub memory: ProbeMemory,
    /// The probe that manufactured this one, if any.
    #[serde(default)]
    pub parent_id: Option<ProbeId>,
    /// Manufacturing steps separating this probe from the seed probe.
    pub generation: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// World state
// ---------------------------------------------------------------------------

/// Everything the entity store owns: the full simulation state.
///
/// This is also the snapshot document persisted after mutations and at
/// the end of every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// When the simulation was first started.
    pub started_at: DateTime<Utc>,
    /// Number of ticks completed so far.
    #[serde(default)]
    pub tick: u64,
    /// All probes, including destroyed ones.
    #[serde(default)]
    pub probes: BTreeMap<ProbeId, Probe>,
    /// All known systems.
    #[serde(default)]
    pub systems: BTreeMap<SystemId, SolarSystem>,
}

impl WorldState {
    /// An empty state starting at `started_at`.
    pub const fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            tick: 0,
            probes: BTreeMap::new(),
            systems: BTreeMap::new(),
        }
    }

    /// Find a body anywhere in the state, returning its system id too.
    pub fn find_body(&self, id: BodyId) -> Option<(SystemId, &CelestialBody)> {
        self.systems
            .values()
            .find_map(|system| system.body(id).map(|body| (system.id, body)))
    }

    /// Find a body anywhere in the state for mutation.
    pub fn find_body_mut(&mut self, id: BodyId) -> Option<&mut CelestialBody> {
        self.systems
            .values_mut()
            .find_map(|system| system.body_mut(id))
    }

    /// Ids of every probe that has not been destroyed.
    pub fn live_probe_ids(&self) -> Vec<ProbeId> {
        self.probes
            .values()
            .filter(|probe| !probe.status.is_destroyed())
            .map(|probe| probe.id)
            .collect()
    }
}
