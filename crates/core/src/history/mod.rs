//! History ledger of completed conversions.
//!
//! Records are append-only and listed newest first by insertion. The ledger
//! is backed by a [`HistoryStore`]: in memory, or SQLite for persistence.

mod ledger;
mod memory;
mod sqlite;
mod store;
mod types;

use std::sync::Arc;

pub use ledger::HistoryLedger;
pub use memory::MemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;
pub use store::{HistoryError, HistoryStore};
pub use types::{HistoryFilter, HistoryRecord};

use crate::config::{HistoryBackend, HistoryConfig};

/// Opens the store selected by configuration.
pub fn open_store(config: &HistoryConfig) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    match config.backend {
        HistoryBackend::Memory => Ok(Arc::new(MemoryHistoryStore::new())),
        HistoryBackend::Sqlite => Ok(Arc::new(SqliteHistoryStore::new(&config.path)?)),
    }
}
