use std::sync::Arc;

use tracing::info;

use super::{HistoryError, HistoryFilter, HistoryRecord, HistoryStore, MemoryHistoryStore};
use crate::metrics;

/// Cloneable handle to the shared history of completed conversions.
#[derive(Clone)]
pub struct HistoryLedger {
    store: Arc<dyn HistoryStore>,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// A ledger over a fresh [`MemoryHistoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryHistoryStore::new()))
    }

    /// Add a record at the front of the history.
    pub fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        self.store.append(record)?;
        metrics::HISTORY_APPENDS.inc();
        info!(
            record_id = %record.id,
            original_name = %record.original_name,
            converted_format = %record.converted_format,
            requested_by = %record.requested_by,
            "Conversion recorded"
        );
        Ok(())
    }

    /// Every record, newest first.
    pub fn list(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        self.store.list(&HistoryFilter::new())
    }

    pub fn list_filtered(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, HistoryError> {
        self.store.list(filter)
    }

    pub fn find(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        self.store.find(id)
    }

    pub fn count(&self, filter: &HistoryFilter) -> Result<usize, HistoryError> {
        self.store.count(filter)
    }

    pub fn len(&self) -> Result<usize, HistoryError> {
        self.count(&HistoryFilter::new())
    }

    pub fn is_empty(&self) -> Result<bool, HistoryError> {
        Ok(self.len()? == 0)
    }
}
