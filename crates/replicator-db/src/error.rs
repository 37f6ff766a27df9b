//! Error types for the persistence layer.

use std::path::PathBuf;

/// Errors that can occur while loading or saving snapshots.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The state could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored snapshot exists but is not a valid state document.
    #[error("corrupt snapshot at {location}: {source}")]
    Corrupt {
        /// Where the snapshot was read from.
        location: String,
        /// The parse error.
        source: serde_json::Error,
    },

    /// The backend refused the write.
    #[error("snapshot backend unavailable: {0}")]
    Unavailable(String),
}
