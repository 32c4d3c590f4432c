//! Session API handlers.
//!
//! Each handler maps one workflow event onto the caller's session. Sessions
//! belonging to someone else are reported as not found.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use formatshift_core::{
    single_file, AuditEvent, FileSelection, SessionError, SessionSnapshot, SharedSession,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::handlers::{error_response, ErrorResponse};
use super::middleware::AuthUser;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for choosing a target format
#[derive(Debug, Deserialize)]
pub struct ChooseTargetBody {
    /// Catalog label, matched case-insensitively (e.g. "docx")
    pub format: String,
}

/// Response for the start endpoint
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// False when the session was not runnable and nothing happened
    pub started: bool,
    pub session: SessionSnapshot,
}

// ============================================================================
// Handlers
// ============================================================================

/// Open a new, empty session for the caller
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> (StatusCode, Json<SessionSnapshot>) {
    let (id, session) = state.sessions().create(&user_id).await;
    let snapshot = session.lock().await.snapshot();

    state.audit(AuditEvent::SessionCreated {
        session_id: id,
        user_id,
    });

    (StatusCode::CREATED, Json(snapshot))
}

/// Current snapshot of a session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = find_session(&state, &id, &user_id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// Discard a session. An in-flight run is invalidated first so its result
/// never reaches the history ledger.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session = find_session(&state, &id, &user_id).await?;
    let status = {
        let mut guard = session.lock().await;
        let status = guard.status();
        guard.reset();
        status
    };

    if !state.sessions().remove(&id, &user_id).await {
        return Err(not_found(&id));
    }

    info!(session_id = %id, status = status.as_str(), "Session deleted");
    state.audit(AuditEvent::SessionDeleted {
        session_id: id,
        user_id,
        status: status.as_str().to_string(),
    });

    Ok(StatusCode::NO_CONTENT)
}

/// Select the session's file from a multipart upload.
///
/// Exactly one file part is accepted. Its file name, content type and bytes
/// become the selection; non-file fields are ignored.
pub async fn select_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = find_session(&state, &id, &user_id).await?;

    let mut files = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart body: {}", e),
                ))
            }
        };

        let Some(name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let media_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read file: {}", e),
            )
        })?;
        files.push(FileSelection::new(name, media_type, data.to_vec()));
    }

    let selection =
        single_file(files).map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    let (file, snapshot) = {
        let mut guard = session.lock().await;
        let file = guard.select_file(selection).clone();
        (file, guard.snapshot())
    };

    state.audit(AuditEvent::FileSelected {
        session_id: id,
        user_id,
        file_name: file.name,
        size_bytes: file.size_bytes,
        media_type: file.declared_media_type,
        category: file.category.as_str().to_string(),
    });

    Ok(Json(snapshot))
}

/// Choose the target format for the selected file
pub async fn choose_target(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ChooseTargetBody>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = find_session(&state, &id, &user_id).await?;

    let (target, snapshot) = {
        let mut guard = session.lock().await;
        let target = guard.choose_target(&body.format).map_err(session_error)?;
        (target, guard.snapshot())
    };

    state.audit(AuditEvent::TargetChosen {
        session_id: id,
        user_id,
        target_format: target.to_string(),
    });

    Ok(Json(snapshot))
}

/// Start the conversion.
///
/// A runnable session moves to `uploading` and the run continues in the
/// background; the response is 202. Otherwise nothing changes and the
/// response is 200 with `started: false`.
pub async fn start_conversion(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let session = find_session(&state, &id, &user_id).await?;

    let mut guard = session.lock().await;
    let Some(run) = guard.start() else {
        let snapshot = guard.snapshot();
        return Ok((
            StatusCode::OK,
            Json(StartResponse {
                started: false,
                session: snapshot,
            }),
        ));
    };
    let snapshot = guard.snapshot();
    drop(guard);

    let executor = Arc::clone(state.executor());
    let session = Arc::clone(&session);
    tokio::spawn(async move {
        executor.drive(&session, run).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            started: true,
            session: snapshot,
        }),
    ))
}

/// Clear file and target and return the session to idle
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = find_session(&state, &id, &user_id).await?;

    let (cancelled_run, snapshot) = {
        let mut guard = session.lock().await;
        let cancelled = guard.reset();
        (cancelled, guard.snapshot())
    };

    if cancelled_run {
        info!(session_id = %id, "Reset cancelled an in-flight conversion");
    }
    state.audit(AuditEvent::SessionReset {
        session_id: id,
        user_id,
        cancelled_run,
    });

    Ok(Json(snapshot))
}

// ============================================================================
// Helpers
// ============================================================================

async fn find_session(
    state: &AppState,
    id: &str,
    user_id: &str,
) -> Result<SharedSession, ApiError> {
    state
        .sessions()
        .get(id, user_id)
        .await
        .ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> ApiError {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Session not found: {}", id),
    )
}

fn session_error(e: SessionError) -> ApiError {
    let status = match e {
        SessionError::CatalogMismatch { .. } => StatusCode::BAD_REQUEST,
        SessionError::NoFile | SessionError::NotIdle { .. } => StatusCode::CONFLICT,
    };
    error_response(status, e.to_string())
}
