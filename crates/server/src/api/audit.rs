//! Audit trail query endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use formatshift_core::{AuditError, AuditFilter, AuditRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{error_response, ErrorResponse};
use super::middleware::AuthUser;
use crate::state::AppState;

const MAX_LIMIT: i64 = 1000;
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for `GET /audit`. Every filter is optional.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQueryParams {
    pub session_id: Option<String>,
    pub event_type: Option<String>,
    pub user_id: Option<String>,
    /// ISO 8601, inclusive
    pub from: Option<DateTime<Utc>>,
    /// ISO 8601, inclusive
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQueryParams {
    /// Limit clamped to `1..=1000`, offset to non-negative.
    fn page(&self) -> (i64, i64) {
        (
            self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            self.offset.unwrap_or(0).max(0),
        )
    }

    /// Filter without paging, as used for the total count. Other users'
    /// events are never visible to `caller`.
    fn filter(&self, caller: &str) -> AuditFilter {
        let mut filter = AuditFilter::new()
            .with_visible_to(caller)
            .with_time_range(self.from, self.to);
        if let Some(ref session_id) = self.session_id {
            filter = filter.with_session_id(session_id);
        }
        if let Some(ref event_type) = self.event_type {
            filter = filter.with_event_type(event_type);
        }
        if let Some(ref user_id) = self.user_id {
            filter = filter.with_user_id(user_id);
        }
        filter
    }
}

#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    pub events: Vec<AuditRecord>,
    /// Matching events across all pages
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Query the caller's audit events and service events, newest first
pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditQueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (limit, offset) = params.page();
    let filter = params.filter(&user_id);
    let store = state.audit_store();

    let total = store.count(&filter).map_err(store_error)?;
    let events = store
        .query(&filter.with_limit(limit).with_offset(offset))
        .map_err(store_error)?;

    Ok(Json(AuditQueryResponse {
        events,
        total,
        limit,
        offset,
    }))
}

fn store_error(e: AuditError) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!(error = %e, "Audit query failed");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to query audit events: {}", e),
    )
}
