//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Business conflicts (an already-approved hash, an unchanged version) are
/// not errors; they are typed returns on the trait. These variants cover
/// genuine faults only.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Referenced record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid data in storage (corrupt enum token, bad hash width).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Blocking task failed to complete.
    #[error("task error: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
