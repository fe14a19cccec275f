//! Record store trait and error types

use crate::storage::Record;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The persisted records cannot be parsed; the crawl must not start
    #[error("Record store {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    /// A record could not be made durable; the crawl must stop
    #[error("Failed to flush record store {path}: {reason}")]
    Flush { path: String, reason: String },

    #[error("A record for {0} is already stored")]
    Duplicate(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Returns true if the store contents could not be parsed at load time
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Returns true if a record could not be persisted
    pub fn is_flush_failure(&self) -> bool {
        matches!(self, Self::Flush { .. })
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable, append-only collection of crawl records
///
/// Records can only be added; there is no way to remove or change one.
/// Implementations must make `append_and_flush` crash-atomic: after a crash at
/// any point, a later `load` sees either every record up to and including the
/// new one, or every record before it, and nothing in between.
pub trait RecordStore: Send {
    /// Reads every persisted record, in the order they were stored
    ///
    /// Fails with [`StorageError::Corrupt`] if the persisted form cannot be
    /// parsed or holds two records for the same location.
    fn load(&mut self) -> StorageResult<Vec<Record>>;

    /// Persists `record` together with everything stored before it
    ///
    /// Returns only once the new state is durable. On error the store is left
    /// as it was before the call.
    fn append_and_flush(&mut self, record: Record) -> StorageResult<()>;

    /// Number of records currently stored
    fn len(&self) -> usize;

    /// Returns true if no records are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable location of the store, for log output
    fn describe(&self) -> String;
}
