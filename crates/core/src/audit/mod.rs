//! Audit trail of workflow events.
//!
//! Events are emitted through a cloneable [`AuditHandle`] and written by a
//! single background [`AuditWriter`] into an [`AuditStore`].

mod events;
mod handle;
mod sqlite;
mod store;
mod writer;

pub use events::*;
pub use handle::*;
pub use sqlite::*;
pub use store::*;
pub use writer::*;
