//! Store-backed action execution.
//!
//! [`ActionExecutor`] is the bridge between a pipeline and the action
//! logic in `replicator-agents`: each call validates the action against
//! the current store state and applies it as one atomic store mutation.
//! A refused action comes back as a failed [`ActionResult`], never as an
//! error.

use std::sync::Arc;

use chrono::Utc;
use replicator_agents::{ActionContext, ActionError, EconomyConfig, execute_action};
use replicator_types::{ActionResult, BodyId, Position, ProbeAction, ProbeId};
use replicator_world::DistanceScale;

use crate::store::EntityStore;

/// Executes probe actions against an [`EntityStore`].
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    store: Arc<EntityStore>,
    economy: EconomyConfig,
    scale: DistanceScale,
}

impl ActionExecutor {
    /// Create an executor over `store`.
    pub const fn new(
        store: Arc<EntityStore>,
        economy: EconomyConfig,
        scale: DistanceScale,
    ) -> Self {
        Self {
            store,
            economy,
            scale,
        }
    }

    /// Validate and apply `action` for `probe_id` as part of `tick`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::ProbeNotFound`] if the probe does not exist,
    /// or [`ActionError::InvariantViolation`] if the mutation would break a
    /// resource invariant. The store is unchanged in both cases.
    pub async fn execute(
        &self,
        probe_id: ProbeId,
        action: &ProbeAction,
        tick: u64,
    ) -> Result<ActionResult, ActionError> {
        let ctx = ActionContext {
            economy: &self.economy,
            scale: self.scale,
            tick,
            now: Utc::now(),
        };
        self.store
            .transact(|state| execute_action(state, probe_id, action, &ctx))
            .await
    }

    /// Move to `target`.
    pub async fn travel(
        &self,
        probe_id: ProbeId,
        target: Position,
        tick: u64,
    ) -> Result<ActionResult, ActionError> {
        self.execute(probe_id, &ProbeAction::Travel { target }, tick)
            .await
    }

    /// Survey `body_id`.
    pub async fn scan(
        &self,
        probe_id: ProbeId,
        body_id: BodyId,
        tick: u64,
    ) -> Result<ActionResult, ActionError> {
        self.execute(probe_id, &ProbeAction::Scan { body_id }, tick)
            .await
    }

    /// Extract from `body_id` for `duration` cycles.
    pub async fn harvest(
        &self,
        probe_id: ProbeId,
        body_id: BodyId,
        duration: u32,
        tick: u64,
    ) -> Result<ActionResult, ActionError> {
        self.execute(probe_id, &ProbeAction::Harvest { body_id, duration }, tick)
            .await
    }

    /// Build a child probe called `name`.
    pub async fn manufacture(
        &self,
        probe_id: ProbeId,
        name: impl Into<String>,
        tick: u64,
    ) -> Result<ActionResult, ActionError> {
        let action = ProbeAction::Manufacture { name: name.into() };
        self.execute(probe_id, &action, tick).await
    }

    /// Do nothing.
    pub async fn wait(&self, probe_id: ProbeId, tick: u64) -> Result<ActionResult, ActionError> {
        self.execute(probe_id, &ProbeAction::Wait, tick).await
    }

    /// Explore.
    pub async fn explore(&self, probe_id: ProbeId, tick: u64) -> Result<ActionResult, ActionError> {
        self.execute(probe_id, &ProbeAction::Explore, tick).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use replicator_agents::SEED_PROBE_ID;
    use replicator_db::MemorySnapshotStore;
    use replicator_types::{ActionOutcome, EventTag, ProbeStatus, ResourceVector};
    use replicator_world::SeedIds;

    use super::*;
    use crate::store::{StoreOptions, seed_state};

    fn executor() -> (ActionExecutor, Arc<EntityStore>, Arc<MemorySnapshotStore>) {
        let economy = EconomyConfig::default();
        let backend = Arc::new(MemorySnapshotStore::new());
        let store = Arc::new(EntityStore::new(
            seed_state(&economy, Utc::now()),
            backend.clone(),
            StoreOptions::default(),
        ));
        (
            ActionExecutor::new(store.clone(), economy, DistanceScale::AU),
            store,
            backend,
        )
    }

    #[tokio::test]
    async fn harvest_moves_stock_and_persists() {
        let (executor, store, backend) = executor();
        let before = store.get_probe(SEED_PROBE_ID).await.unwrap();
        let result = executor
            .harvest(SEED_PROBE_ID, SeedIds::TERRA, 1, 1)
            .await
            .unwrap();
        assert!(result.ok);
        let Some(ActionOutcome::Harvested { extracted, .. }) = result.data else {
            panic!("expected a harvest outcome");
        };
        let after = store.get_probe(SEED_PROBE_ID).await.unwrap();
        assert_eq!(after.resources.checked_sub(extracted), Some(before.resources));
        assert_eq!(after.status, ProbeStatus::Active);
        assert_eq!(backend.save_count(), 1);
    }

    #[tokio::test]
    async fn refused_travel_is_a_value() {
        let (executor, store, _backend) = executor();
        store
            .update_probe_with(SEED_PROBE_ID, |probe| probe.resources = ResourceVector::ZERO)
            .await
            .unwrap();
        let result = executor
            .travel(SEED_PROBE_ID, Position::new(5.0, 0.0, 0.0), 1)
            .await
            .unwrap();
        assert!(!result.ok);
        assert_eq!(result.reason_tag(), Some("insufficient_energy"));
        let probe = store.get_probe(SEED_PROBE_ID).await.unwrap();
        assert_eq!(
            probe.memory.experiences.last().map(|e| e.event),
            Some(EventTag::TravelFailed)
        );
    }

    #[tokio::test]
    async fn unknown_probe_is_an_error() {
        let (executor, store, _backend) = executor();
        let version = store.version().await;
        let missing = ProbeId::from_u128(404);
        assert!(matches!(
            executor.wait(missing, 1).await,
            Err(ActionError::ProbeNotFound(id)) if id == missing
        ));
        assert_eq!(store.version().await, version);
    }
}
