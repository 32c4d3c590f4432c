use thiserror::Error;

use super::{HistoryFilter, HistoryRecord};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record already exists: {0}")]
    DuplicateId(String),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Trait for history record storage.
///
/// Implementations keep records newest first by insertion and serialize
/// appends internally.
pub trait HistoryStore: Send + Sync {
    /// Insert a record at the front of the sequence.
    fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError>;

    /// Records matching the filter, newest first.
    fn list(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, HistoryError>;

    /// Look up a single record by id.
    fn find(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError>;

    /// Count records matching the filter (limit and offset are ignored).
    fn count(&self, filter: &HistoryFilter) -> Result<usize, HistoryError>;
}
