//! Conversion executor.
//!
//! [`ConversionExecutor::run`] sequences a session through the upload and
//! processing phases, calls the converter, and appends the resulting
//! [`HistoryRecord`](crate::history::HistoryRecord) to the ledger.

mod config;
mod error;
mod runner;

pub use config::ExecutorConfig;
pub use error::ConversionFailure;
pub use runner::{ConversionExecutor, RunOutcome};
