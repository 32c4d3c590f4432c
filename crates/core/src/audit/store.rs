use chrono::{DateTime, Utc};
use thiserror::Error;

use super::AuditRecord;

/// Page size used when a filter does not set one.
pub const DEFAULT_AUDIT_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Filter for querying audit events.
///
/// Every field left unset matches all events. `limit` and `offset` only
/// apply to [`AuditStore::query`]; [`AuditStore::count`] ignores them.
#[derive(Debug, Clone)]
pub struct AuditFilter {
    pub session_id: Option<String>,
    pub event_type: Option<String>,
    pub user_id: Option<String>,
    /// Keep only this user's events plus events not tied to any user
    pub visible_to: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            session_id: None,
            event_type: None,
            user_id: None,
            visible_to: None,
            from: None,
            to: None,
            limit: DEFAULT_AUDIT_LIMIT,
            offset: 0,
        }
    }
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Scopes the filter to what `user_id` may see.
    pub fn with_visible_to(mut self, user_id: impl Into<String>) -> Self {
        self.visible_to = Some(user_id.into());
        self
    }

    /// Restricts to events in `[from, to]`; either end may be open.
    pub fn with_time_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Storage for audit records, newest first on query.
pub trait AuditStore: Send + Sync {
    /// Insert an audit record, returns the assigned ID
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError>;

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError>;

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError>;
}
