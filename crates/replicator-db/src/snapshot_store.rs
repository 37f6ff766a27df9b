//! Snapshot persistence for the full simulation state.
//!
//! [`SnapshotStore`] is the persistence capability the entity store
//! consumes: load the last snapshot (or learn there is none) and save a new
//! one. Two backends are provided:
//!
//! - [`JsonFileSnapshotStore`] writes a pretty-printed JSON document to a
//!   temporary sibling file and renames it over the target, so a crash
//!   mid-write never leaves a truncated snapshot behind.
//! - [`MemorySnapshotStore`] keeps the serialized document in memory and
//!   can be switched into a failing mode to exercise degraded durability.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::future::BoxFuture;
use replicator_types::WorldState;
use tokio::sync::Mutex;

use crate::error::DbError;

/// Durable storage for whole-state snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Load the most recent snapshot.
    ///
    /// Returns `Ok(None)` when no snapshot has ever been saved and
    /// [`DbError::Corrupt`] when one exists but cannot be parsed.
    fn load(&self) -> BoxFuture<'_, Result<Option<WorldState>, DbError>>;

    /// Replace the stored snapshot with `state`.
    fn save<'a>(&'a self, state: &'a WorldState) -> BoxFuture<'a, Result<(), DbError>>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

// =========================================================================
// JSON file backend
// =========================================================================

/// Snapshots stored as one JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    /// Create a store writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("snapshot"), ToOwned::to_owned);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load_inner(&self) -> Result<Option<WorldState>, DbError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(DbError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let state = serde_json::from_slice(&bytes).map_err(|source| DbError::Corrupt {
            location: self.path.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), "Loaded snapshot");
        Ok(Some(state))
    }

    async fn save_inner(&self, state: &WorldState) -> Result<(), DbError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let temp = self.temp_path();

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DbError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|source| DbError::Io {
                path: temp.clone(),
                source,
            })?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|source| DbError::Io {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            tick = state.tick,
            probes = state.probes.len(),
            bytes = bytes.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> BoxFuture<'_, Result<Option<WorldState>, DbError>> {
        Box::pin(self.load_inner())
    }

    fn save<'a>(&'a self, state: &'a WorldState) -> BoxFuture<'a, Result<(), DbError>> {
        Box::pin(self.save_inner(state))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// =========================================================================
// In-memory backend
// =========================================================================

/// Snapshots kept in memory as serialized JSON.
///
/// Saves still go through serialization, so a load returns exactly what a
/// file backend would.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    document: Mutex<Option<String>>,
    failing: AtomicBool,
    saves: AtomicU64,
}

impl MemorySnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with a raw document, which need not be valid.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
            ..Self::default()
        }
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// The stored document, if any.
    pub async fn document(&self) -> Option<String> {
        self.document.lock().await.clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> BoxFuture<'_, Result<Option<WorldState>, DbError>> {
        Box::pin(async move {
            let guard = self.document.lock().await;
            let Some(document) = guard.as_deref() else {
                return Ok(None);
            };
            serde_json::from_str(document)
                .map(Some)
                .map_err(|source| DbError::Corrupt {
                    location: String::from("memory"),
                    source,
                })
        })
    }

    fn save<'a>(&'a self, state: &'a WorldState) -> BoxFuture<'a, Result<(), DbError>> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(DbError::Unavailable(String::from(
                    "memory store is in failing mode",
                )));
            }
            let document = serde_json::to_string(state)?;
            *self.document.lock().await = Some(document);
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn location(&self) -> String {
        String::from("memory")
    }
}
