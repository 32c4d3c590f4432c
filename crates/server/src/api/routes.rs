use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{audit, formats, handlers, history, sessions};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    // Routes behind the identity gate
    let protected = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Format catalog
        .route("/formats", get(formats::list_formats))
        .route("/formats/{category}", get(formats::get_category_formats))
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/{id}/file", post(sessions::select_file))
        .route("/sessions/{id}/target", post(sessions::choose_target))
        .route("/sessions/{id}/start", post(sessions::start_conversion))
        .route("/sessions/{id}/reset", post(sessions::reset_session))
        // History
        .route("/history", get(history::list_history))
        .route("/history/{id}", get(history::get_record))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .nest_service("/downloads", ServeDir::new(state.download_dir()))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
