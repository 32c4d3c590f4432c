//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use formatshift_core::{AuthError, AuthRequest, Identity, ANONYMOUS_USER};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use super::handlers::error_response;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Metrics middleware that tracks HTTP request duration and counts.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Authentication middleware that validates requests using the configured authenticator.
///
/// On success the caller's [`Identity`] is stored in the request extensions.
/// Missing or wrong credentials get a 401 with an error body.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let authenticator = state.authenticator();

    // Skip header parsing with NoneAuthenticator, but still insert anonymous identity
    if authenticator.method_name() == "none" {
        request.extensions_mut().insert(Identity::anonymous());
        return next.run(request).await;
    }

    // Source IP defaults to localhost if not available
    let source_ip = request
        .extensions()
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));

    let headers = request.headers().iter().filter_map(|(name, value)| {
        value
            .to_str()
            .ok()
            .map(|v| (name.as_str(), v.to_string()))
    });
    let auth_request = AuthRequest::new(headers, source_ip);

    match authenticator.authenticate(&auth_request).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) if e.is_rejection() => {
            let (reason, message) = match e {
                AuthError::NotAuthenticated => ("not_authenticated", "Authentication required"),
                _ => ("invalid_credentials", "Invalid credentials"),
            };
            AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
            error_response(StatusCode::UNAUTHORIZED, message).into_response()
        }
        Err(e) => {
            AUTH_FAILURES_TOTAL
                .with_label_values(&["internal_error"])
                .inc();
            tracing::error!(error = %e, "Authenticator failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Extractor for authenticated user ID.
///
/// Falls back to the anonymous user if no identity is present.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .extensions
            .get::<Identity>()
            .map(|id| id.user_id.clone())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());
        std::future::ready(Ok(AuthUser(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        middleware,
        routing::get,
        Router,
    };
    use formatshift_core::{
        create_audit_system, create_authenticator, testing::MockConverter, AuditConfig,
        AuditStore, AuthConfig, AuthMethod, Authenticator, Config, ConversionExecutor, Converter,
        ConverterConfig, ExecutorConfig, HistoryConfig, HistoryLedger, ServerConfig,
        SqliteAuditStore,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    async fn user_handler(AuthUser(user_id): AuthUser) -> String {
        user_id
    }

    fn create_test_state(auth: AuthConfig) -> Arc<AppState> {
        let authenticator: Arc<dyn Authenticator> =
            Arc::from(create_authenticator(&auth).unwrap());
        let config = Config {
            auth,
            server: ServerConfig::default(),
            history: HistoryConfig::default(),
            conversion: ExecutorConfig::default(),
            converter: ConverterConfig::default(),
            audit: AuditConfig::default(),
        };

        let audit_store: Arc<dyn AuditStore> = Arc::new(SqliteAuditStore::in_memory().unwrap());
        let (audit_handle, _writer) = create_audit_system(Arc::clone(&audit_store), 100);
        let converter: Arc<dyn Converter> = Arc::new(MockConverter::new());
        let executor = Arc::new(ConversionExecutor::with_shared_converter(
            ExecutorConfig::default(),
            converter,
            HistoryLedger::in_memory(),
        ));

        Arc::new(AppState::new(
            config,
            authenticator,
            Some(audit_handle),
            audit_store,
            executor,
        ))
    }

    fn api_key_state() -> Arc<AppState> {
        create_test_state(AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some("secret-key".to_string()),
        })
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(dummy_handler))
            .route("/whoami", get(user_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn body_string(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_none_auth_allows_all() {
        let state = create_test_state(AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        });

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_key_auth_valid() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_key_auth_invalid() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer wrong-key")
            .body(Body::empty())
            .unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_api_key_auth_missing() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response)
            .await
            .contains("Authentication required"));
    }

    #[tokio::test]
    async fn test_x_api_key_header() {
        let request = Request::builder()
            .uri("/test")
            .header("X-API-Key", "secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_user_extractor_with_api_key() {
        let request = Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, "Bearer secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user_id = body_string(response).await;
        assert!(user_id.starts_with("key-"));
    }

    #[tokio::test]
    async fn test_auth_user_extractor_with_none_auth() {
        let state = create_test_state(AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        });

        let request = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }
}
