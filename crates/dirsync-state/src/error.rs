//! Error types for the snapshot repositories.

use dirsync_core::model::STATE_SCHEMA_VERSION;
use thiserror::Error;

/// Result type alias using `StateError`.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur loading or storing a snapshot.
#[derive(Debug, Error)]
pub enum StateError {
    /// Bucket or path configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Object storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Local filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot document could not be decoded.
    #[error("snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The stored document was written by an incompatible version.
    #[error("snapshot schema version {found} is not supported (expected {})", STATE_SCHEMA_VERSION)]
    SchemaVersion { found: i64 },
}
