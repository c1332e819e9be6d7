//! Error types for the local store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the local store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The singleton sync-state row is missing or malformed.
    #[error("sync state record is missing")]
    MissingSyncState,

    /// An operation referenced a table that does not track tombstones.
    #[error("table {0} does not support deletion tracking")]
    DeletionNotSupported(String),
}
