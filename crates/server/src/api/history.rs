//! History API handlers.
//!
//! Callers only see the records of their own conversions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use formatshift_core::{HistoryFilter, HistoryRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{error_response, ErrorResponse};
use super::middleware::AuthUser;
use crate::state::AppState;

/// Maximum allowed limit for history queries
const MAX_LIMIT: usize = 1000;

/// Default limit for history queries
const DEFAULT_LIMIT: usize = 100;

/// Query parameters for listing history
#[derive(Debug, Deserialize)]
pub struct ListHistoryParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Response for listing history, newest record first
#[derive(Debug, Serialize)]
pub struct ListHistoryResponse {
    pub records: Vec<HistoryRecord>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// List the caller's completed conversions
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<ListHistoryParams>,
) -> Result<Json<ListHistoryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let base_filter = HistoryFilter::new().with_requested_by(&user_id);
    let page_filter = base_filter
        .clone()
        .with_limit(limit)
        .with_offset(offset);

    let records = state
        .ledger()
        .list_filtered(&page_filter)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let total = state
        .ledger()
        .count(&base_filter)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ListHistoryResponse {
        records,
        total,
        limit,
        offset,
    }))
}

/// Get one of the caller's records by ID
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<HistoryRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.ledger().find(&id) {
        Ok(Some(record)) if record.requested_by == user_id => Ok(Json(record)),
        Ok(_) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("History record not found: {}", id),
        )),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}
