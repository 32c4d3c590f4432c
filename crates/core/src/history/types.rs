use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Category;

/// One completed conversion. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub original_name: String,
    /// Lower-case extension of the source file, empty when it had none.
    pub original_format: String,
    /// Lower-case target label.
    pub converted_format: String,
    pub category: Category,
    pub requested_by: String,
    pub timestamp: DateTime<Utc>,
    pub download_ref: String,
}

/// Filter for listing history records
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub requested_by: Option<String>,
    /// `None` lists everything past `offset`.
    pub limit: Option<usize>,
    pub offset: usize,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requested_by(mut self, user_id: impl Into<String>) -> Self {
        self.requested_by = Some(user_id.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub(crate) fn matches(&self, record: &HistoryRecord) -> bool {
        self.requested_by
            .as_deref()
            .is_none_or(|user| record.requested_by == user)
    }
}
