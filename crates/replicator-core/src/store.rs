//! The entity store: the single owner of all mutable simulation state.
//!
//! [`EntityStore`] wraps the [`WorldState`] in a `tokio` read-write lock.
//! Reads take the read lock and hand back copies; every mutation takes the
//! write lock, runs a synchronous closure, bumps a version counter, clones
//! the result and releases the lock before anything is awaited. The clone
//! is then written to the [`SnapshotStore`] backend.
//!
//! Snapshot writes are serialized by a second mutex that remembers the last
//! version written, so a slow writer holding an older clone can never
//! overwrite a newer snapshot. A failed or timed-out write is logged, sets
//! the degraded-durability flag, and never rolls back memory; the next
//! successful write clears the flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use replicator_agents::{ActionError, EconomyConfig, seed_probe};
use replicator_db::{DbError, SnapshotStore};
use replicator_types::{
    Experience, Position, Probe, ProbeId, ProbeStatus, ResourceVector, SolarSystem,
    SystemId, WorldState,
};
use replicator_world::create_seed_system;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;

/// Errors surfaced by entity store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced probe does not exist.
    #[error("probe not found: {0}")]
    ProbeNotFound(ProbeId),

    /// The referenced system does not exist.
    #[error("system not found: {0}")]
    SystemNotFound(SystemId),

    /// A probe with this id is already stored.
    #[error("duplicate probe id: {0}")]
    DuplicateProbe(ProbeId),

    /// The requested status change is not allowed.
    #[error("probe {probe} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The probe whose status was patched.
        probe: ProbeId,
        /// Its stored status.
        from: ProbeStatus,
        /// The requested status.
        to: ProbeStatus,
    },

    /// A mutation inside the store failed.
    #[error("action error: {source}")]
    Action {
        /// The underlying action error.
        #[from]
        source: ActionError,
    },

    /// The snapshot backend rejected a write.
    #[error("persistence error: {source}")]
    Persistence {
        /// The underlying backend error.
        #[from]
        source: DbError,
    },

    /// The snapshot backend did not answer in time.
    #[error("snapshot write timed out after {timeout_ms}ms")]
    PersistTimeout {
        /// The deadline that passed.
        timeout_ms: u64,
    },
}

/// Partial update merged into an existing probe by
/// [`EntityStore::update_probe`]. `None` fields are left untouched.
///
/// Capabilities are fixed when a probe is built and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbePatch {
    /// New display name.
    pub name: Option<String>,
    /// New lifecycle status.
    pub status: Option<ProbeStatus>,
    /// New position.
    pub position: Option<Position>,
    /// New containing system.
    pub system_id: Option<SystemId>,
    /// New inventory.
    pub resources: Option<ResourceVector>,
}

impl ProbePatch {
    /// Check that the patch is allowed for a probe currently in `from`.
    ///
    /// A destroyed probe stays destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTransition`] when the patch would move a
    /// destroyed probe to any other status.
    pub fn check_transition(&self, probe: ProbeId, from: ProbeStatus) -> Result<(), StoreError> {
        if let Some(to) = self.status
            && from.is_destroyed()
            && to != from
        {
            return Err(StoreError::InvalidTransition { probe, from, to });
        }
        Ok(())
    }

    /// Merge the set fields into `probe`.
    pub fn apply(self, probe: &mut Probe) {
        if let Some(name) = self.name {
            probe.name = name;
        }
        if let Some(status) = self.status {
            probe.status = status;
        }
        if let Some(position) = self.position {
            probe.position = position;
        }
        if let Some(system_id) = self.system_id {
            probe.system_id = system_id;
        }
        if let Some(resources) = self.resources {
            probe.resources = resources;
        }
    }
}

/// Snapshot behaviour of an [`EntityStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Deadline for one snapshot write.
    pub persist_timeout: Duration,
    /// Write a snapshot after every mutation, not only on [`EntityStore::persist`].
    pub persist_every_mutation: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::from(&PersistenceConfig::default())
    }
}

impl From<&PersistenceConfig> for StoreOptions {
    fn from(config: &PersistenceConfig) -> Self {
        Self {
            persist_timeout: config.persist_timeout(),
            persist_every_mutation: config.snapshot_every_mutation,
        }
    }
}

/// The deterministic starting state: the seed system and the seed probe.
pub fn seed_state(economy: &EconomyConfig, started_at: DateTime<Utc>) -> WorldState {
    let mut state = WorldState::empty(started_at);
    let system = create_seed_system();
    state.systems.insert(system.id, system);
    let probe = seed_probe(economy, started_at);
    state.probes.insert(probe.id, probe);
    state
}

/// In-memory state plus its version number.
#[derive(Debug)]
struct Versioned {
    world: WorldState,
    version: u64,
}

/// Linearized, snapshot-backed access to probes and systems.
pub struct EntityStore {
    state: RwLock<Versioned>,
    /// Version of the last snapshot written, `None` before the first write.
    persisted: Mutex<Option<u64>>,
    degraded: AtomicBool,
    backend: Arc<dyn SnapshotStore>,
    options: StoreOptions,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("backend", &self.backend.location())
            .field("options", &self.options)
            .field("degraded", &self.durability_degraded())
            .finish_non_exhaustive()
    }
}

impl EntityStore {
    /// Wrap an existing state.
    pub fn new(state: WorldState, backend: Arc<dyn SnapshotStore>, options: StoreOptions) -> Self {
        Self {
            state: RwLock::new(Versioned {
                world: state,
                version: 0,
            }),
            persisted: Mutex::new(None),
            degraded: AtomicBool::new(false),
            backend,
            options,
        }
    }

    /// Load the last snapshot from `backend`, or start from the seed state.
    ///
    /// A missing snapshot is normal on first start. A corrupt or unreadable
    /// one is logged and replaced by the seed state; an unreadable backend
    /// also marks durability as degraded.
    pub async fn open(
        backend: Arc<dyn SnapshotStore>,
        options: StoreOptions,
        economy: &EconomyConfig,
    ) -> Self {
        let location = backend.location();
        let loaded = tokio::time::timeout(options.persist_timeout, backend.load()).await;

        let (state, degraded) = match loaded {
            Ok(Ok(Some(state))) => {
                info!(
                    location = %location,
                    tick = state.tick,
                    probes = state.probes.len(),
                    systems = state.systems.len(),
                    "Resumed from snapshot"
                );
                (state, false)
            }
            Ok(Ok(None)) => {
                info!(location = %location, "No snapshot found, starting from seed state");
                (seed_state(economy, Utc::now()), false)
            }
            Ok(Err(err @ DbError::Corrupt { .. })) => {
                warn!(
                    location = %location,
                    error = %err,
                    "Snapshot is corrupt, starting from seed state"
                );
                (seed_state(economy, Utc::now()), false)
            }
            Ok(Err(err)) => {
                warn!(
                    location = %location,
                    error = %err,
                    "Snapshot unreadable, starting from seed state"
                );
                (seed_state(economy, Utc::now()), true)
            }
            Err(_elapsed) => {
                warn!(
                    location = %location,
                    timeout_ms = duration_ms(options.persist_timeout),
                    "Snapshot load timed out, starting from seed state"
                );
                (seed_state(economy, Utc::now()), true)
            }
        };

        let store = Self::new(state, backend, options);
        store.degraded.store(degraded, Ordering::SeqCst);
        store
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Run `f` against the current state under the read lock.
    ///
    /// `f` is synchronous, so the lock is never held across a suspension
    /// point.
    pub async fn read<T>(&self, f: impl FnOnce(&WorldState) -> T) -> T {
        let guard = self.state.read().await;
        f(&guard.world)
    }

    /// A copy of one probe.
    pub async fn get_probe(&self, id: ProbeId) -> Option<Probe> {
        self.read(|state| state.probes.get(&id).cloned()).await
    }

    /// A copy of one system.
    pub async fn get_system(&self, id: SystemId) -> Option<SolarSystem> {
        self.read(|state| state.systems.get(&id).cloned()).await
    }

    /// Copies of every probe, destroyed ones included.
    pub async fn all_probes(&self) -> Vec<Probe> {
        self.read(|state| state.probes.values().cloned().collect())
            .await
    }

    /// Copies of every system.
    pub async fn all_systems(&self) -> Vec<SolarSystem> {
        self.read(|state| state.systems.values().cloned().collect())
            .await
    }

    /// A copy of the whole state.
    pub async fn snapshot(&self) -> WorldState {
        self.read(Clone::clone).await
    }

    /// Number of ticks completed.
    pub async fn current_tick(&self) -> u64 {
        self.read(|state| state.tick).await
    }

    /// When the simulation was first started.
    pub async fn started_at(&self) -> DateTime<Utc> {
        self.read(|state| state.started_at).await
    }

    /// Number of committed mutations since the store was opened.
    pub async fn version(&self) -> u64 {
        self.state.read().await.version
    }

    /// Whether the last snapshot write failed.
    pub fn durability_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Apply `f` atomically under the write lock.
    ///
    /// On `Ok` the mutation is committed and, when configured, a snapshot is
    /// written after the lock is released. On `Err` nothing is committed to
    /// durable storage; `f` must leave the state as it found it when it
    /// fails, which every action handler guarantees.
    pub async fn transact<T, E>(
        &self,
        f: impl FnOnce(&mut WorldState) -> Result<T, E>,
    ) -> Result<T, E> {
        let (value, commit) = {
            let mut guard = self.state.write().await;
            let value = f(&mut guard.world)?;
            guard.version = guard.version.saturating_add(1);
            let commit = self
                .options
                .persist_every_mutation
                .then(|| (guard.version, guard.world.clone()));
            (value, commit)
        };

        if let Some((version, world)) = commit
            && let Err(err) = self.write_snapshot(version, &world).await
        {
            debug!(version, error = %err, "Mutation kept in memory only");
        }
        Ok(value)
    }

    /// Merge `patch` into an existing probe and return the updated copy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ProbeNotFound`] for an unknown id and
    /// [`StoreError::InvalidTransition`] when the patch would revive a
    /// destroyed probe. Nothing is changed in either case.
    pub async fn update_probe(&self, id: ProbeId, patch: ProbePatch) -> Result<Probe, StoreError> {
        self.transact(|state| {
            let probe = state
                .probes
                .get_mut(&id)
                .ok_or(StoreError::ProbeNotFound(id))?;
            patch.check_transition(id, probe.status)?;
            patch.apply(probe);
            Ok(probe.clone())
        })
        .await
    }

    /// Modify an existing probe in place and return the updated copy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ProbeNotFound`] for an unknown id.
    pub async fn update_probe_with(
        &self,
        id: ProbeId,
        f: impl FnOnce(&mut Probe),
    ) -> Result<Probe, StoreError> {
        self.transact(|state| {
            let probe = state
                .probes
                .get_mut(&id)
                .ok_or(StoreError::ProbeNotFound(id))?;
            f(probe);
            Ok(probe.clone())
        })
        .await
    }

    /// Insert a new probe.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateProbe`] if the id is taken.
    pub async fn add_probe(&self, probe: Probe) -> Result<(), StoreError> {
        self.transact(|state| {
            if state.probes.contains_key(&probe.id) {
                return Err(StoreError::DuplicateProbe(probe.id));
            }
            state.probes.insert(probe.id, probe);
            Ok(())
        })
        .await
    }

    /// Insert or replace a system. Returns the replaced system, if any.
    pub async fn upsert_system(&self, system: SolarSystem) -> Option<SolarSystem> {
        self.transact(|state| Ok::<_, StoreError>(state.systems.insert(system.id, system)))
            .await
            .unwrap_or_default()
    }

    /// Append one experience to a probe's memory log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ProbeNotFound`] for an unknown id.
    pub async fn append_experience(
        &self,
        probe_id: ProbeId,
        experience: Experience,
    ) -> Result<(), StoreError> {
        self.update_probe_with(probe_id, |probe| probe.memory.record(experience))
            .await
            .map(drop)
    }

    /// Count one more completed tick and return the new tick number.
    pub async fn advance_tick(&self) -> u64 {
        self.transact(|state| {
            state.tick = state.tick.saturating_add(1);
            Ok::<_, StoreError>(state.tick)
        })
        .await
        .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write the current state to the backend unless it is already there.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] or [`StoreError::PersistTimeout`]
    /// if the write failed. Memory is unaffected either way.
    pub async fn persist(&self) -> Result<(), StoreError> {
        let (version, world) = {
            let guard = self.state.read().await;
            (guard.version, guard.world.clone())
        };
        self.write_snapshot(version, &world).await
    }

    async fn write_snapshot(&self, version: u64, world: &WorldState) -> Result<(), StoreError> {
        let mut persisted = self.persisted.lock().await;
        if persisted.is_some_and(|last| last >= version) {
            return Ok(());
        }

        let outcome = match tokio::time::timeout(
            self.options.persist_timeout,
            self.backend.save(world),
        )
        .await
        {
            Ok(result) => result.map_err(StoreError::from),
            Err(_elapsed) => Err(StoreError::PersistTimeout {
                timeout_ms: duration_ms(self.options.persist_timeout),
            }),
        };

        match outcome {
            Ok(()) => {
                *persisted = Some(version);
                if self.degraded.swap(false, Ordering::SeqCst) {
                    info!(version, location = %self.backend.location(), "Durability restored");
                }
                Ok(())
            }
            Err(err) => {
                if !self.degraded.swap(true, Ordering::SeqCst) {
                    warn!(
                        version,
                        location = %self.backend.location(),
                        error = %err,
                        "Snapshot write failed, durability degraded"
                    );
                }
                Err(err)
            }
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use replicator_agents::SEED_PROBE_ID;
    use replicator_db::MemorySnapshotStore;
    use replicator_types::EventTag;
    use replicator_world::SeedIds;

    use super::*;

    fn store_with(backend: Arc<MemorySnapshotStore>) -> EntityStore {
        EntityStore::new(
            seed_state(&EconomyConfig::default(), Utc::now()),
            backend,
            StoreOptions::default(),
        )
    }

    #[tokio::test]
    async fn repeated_reads_are_equal() {
        let store = store_with(Arc::new(MemorySnapshotStore::new()));
        let first = store.get_probe(SEED_PROBE_ID).await;
        let second = store.get_probe(SEED_PROBE_ID).await;
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn update_merges_only_set_fields() {
        let store = store_with(Arc::new(MemorySnapshotStore::new()));
        let before = store.get_probe(SEED_PROBE_ID).await.unwrap();
        let patch = ProbePatch {
            name: Some(String::from("Riker")),
            ..ProbePatch::default()
        };
        let after = store.update_probe(SEED_PROBE_ID, patch).await.unwrap();
        assert_eq!(after.name, "Riker");
        assert_eq!(after.resources, before.resources);
        assert_eq!(after.position, before.position);
    }

    #[tokio::test]
    async fn unknown_probe_update_is_not_found() {
        let backend = Arc::new(MemorySnapshotStore::new());
        let store = store_with(Arc::clone(&backend));
        let missing = ProbeId::from_u128(9);
        let result = store.update_probe(missing, ProbePatch::default()).await;
        assert!(matches!(result, Err(StoreError::ProbeNotFound(id)) if id == missing));
        assert_eq!(store.version().await, 0);
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn destroyed_probe_stays_destroyed() {
        let backend = Arc::new(MemorySnapshotStore::new());
        let store = store_with(Arc::clone(&backend));
        let destroy = ProbePatch {
            status: Some(ProbeStatus::Destroyed),
            ..ProbePatch::default()
        };
        store.update_probe(SEED_PROBE_ID, destroy.clone()).await.unwrap();
        let version = store.version().await;

        let revive = ProbePatch {
            status: Some(ProbeStatus::Active),
            name: Some(String::from("Lazarus")),
            ..ProbePatch::default()
        };
        let result = store.update_probe(SEED_PROBE_ID, revive).await;
        assert!(matches!(
            result,
            Err(StoreError::InvalidTransition {
                from: ProbeStatus::Destroyed,
                to: ProbeStatus::Active,
                ..
            })
        ));
        let probe = store.get_probe(SEED_PROBE_ID).await.unwrap();
        assert_eq!(probe.status, ProbeStatus::Destroyed);
        assert_ne!(probe.name, "Lazarus");
        assert_eq!(store.version().await, version);

        // Re-stating the terminal status is harmless.
        assert!(store.update_probe(SEED_PROBE_ID, destroy).await.is_ok());
    }

    #[tokio::test]
    async fn status_patch_keeps_capabilities() {
        let store = store_with(Arc::new(MemorySnapshotStore::new()));
        let before = store.get_probe(SEED_PROBE_ID).await.unwrap();
        let patch = ProbePatch {
            status: Some(ProbeStatus::Traveling),
            resources: Some(ResourceVector::ZERO),
            ..ProbePatch::default()
        };
        let after = store.update_probe(SEED_PROBE_ID, patch).await.unwrap();
        assert_eq!(after.status, ProbeStatus::Traveling);
        assert_eq!(after.capabilities, before.capabilities);
    }

    #[tokio::test]
    async fn duplicate_probe_is_rejected() {
        let store = store_with(Arc::new(MemorySnapshotStore::new()));
        let probe = store.get_probe(SEED_PROBE_ID).await.unwrap();
        assert!(matches!(
            store.add_probe(probe).await,
            Err(StoreError::DuplicateProbe(_))
        ));
    }

    #[tokio::test]
    async fn append_experience_adds_one_record() {
        let store = store_with(Arc::new(MemorySnapshotStore::new()));
        let before = store.get_probe(SEED_PROBE_ID).await.unwrap();
        let experience = Experience::new(
            Utc::now(),
            3,
            EventTag::Explored,
            serde_json::json!({ "note": "looked around" }),
        );
        store
            .append_experience(SEED_PROBE_ID, experience.clone())
            .await
            .unwrap();
        let after = store.get_probe(SEED_PROBE_ID).await.unwrap();
        assert_eq!(
            after.memory.experiences.len(),
            before.memory.experiences.len().saturating_add(1)
        );
        assert_eq!(after.memory.experiences.last(), Some(&experience));
    }

    #[tokio::test]
    async fn every_mutation_is_persisted() {
        let backend = Arc::new(MemorySnapshotStore::new());
        let store = store_with(Arc::clone(&backend));
        store.advance_tick().await;
        store.advance_tick().await;
        assert_eq!(backend.save_count(), 2);
        let saved = backend.load().await.unwrap().unwrap();
        assert_eq!(saved.tick, 2);
    }

    #[tokio::test]
    async fn persist_skips_already_written_versions() {
        let backend = Arc::new(MemorySnapshotStore::new());
        let store = store_with(Arc::clone(&backend));
        store.persist().await.unwrap();
        store.persist().await.unwrap();
        assert_eq!(backend.save_count(), 1);
    }

    #[tokio::test]
    async fn failed_write_degrades_but_keeps_memory() {
        let backend = Arc::new(MemorySnapshotStore::new());
        let store = store_with(Arc::clone(&backend));
        backend.set_failing(true);

        let tick = store.advance_tick().await;
        assert_eq!(tick, 1);
        assert_eq!(store.current_tick().await, 1);
        assert!(store.durability_degraded());
        assert!(store.persist().await.is_err());

        backend.set_failing(false);
        store.persist().await.unwrap();
        assert!(!store.durability_degraded());
        assert_eq!(backend.load().await.unwrap().unwrap().tick, 1);
    }

    #[tokio::test]
    async fn upsert_replaces_system() {
        let store = store_with(Arc::new(MemorySnapshotStore::new()));
        let mut system = store.get_system(SeedIds::SYSTEM).await.unwrap();
        system.name = String::from("Home");
        let previous = store.upsert_system(system).await;
        assert_eq!(previous.map(|s| s.name), Some(String::from("Sol System")));
        assert_eq!(
            store.get_system(SeedIds::SYSTEM).await.map(|s| s.name),
            Some(String::from("Home"))
        );
        assert_eq!(store.all_systems().await.len(), 1);
    }

    #[tokio::test]
    async fn open_falls_back_to_seed_on_corruption() {
        let backend = Arc::new(MemorySnapshotStore::with_document("{ broken"));
        let store =
            EntityStore::open(backend, StoreOptions::default(), &EconomyConfig::default()).await;
        assert_eq!(store.all_probes().await.len(), 1);
        assert_eq!(store.current_tick().await, 0);
        assert!(!store.durability_degraded());
    }

    #[tokio::test]
    async fn open_resumes_saved_state() {
        let backend = Arc::new(MemorySnapshotStore::new());
        let mut state = seed_state(&EconomyConfig::default(), Utc::now());
        state.tick = 12;
        backend.save(&state).await.unwrap();

        let store =
            EntityStore::open(backend, StoreOptions::default(), &EconomyConfig::default()).await;
        assert_eq!(store.snapshot().await, state);
    }
}
