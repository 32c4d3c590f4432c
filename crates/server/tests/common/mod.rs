//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that builds the full router in-process
//! with a [`MockConverter`] injected, so the whole workflow can be driven over
//! HTTP without touching the filesystem converter.

#![allow(dead_code)]

pub mod process;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use formatshift_core::{
    create_audit_system, create_authenticator, testing::MockConverter, AuditConfig, AuditStore,
    AuthConfig, AuthMethod, Authenticator, Config, ConversionExecutor, Converter, ConverterConfig,
    ExecutorConfig, HistoryConfig, HistoryLedger, ServerConfig, SqliteAuditStore,
};
use formatshift_server::state::AppState;

/// Re-export fixtures for test convenience
pub use formatshift_core::testing::fixtures;

const BOUNDARY: &str = "formatshift-test-boundary";

/// Test fixture for E2E testing with a mock converter.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock converter - control results, errors and timing
    pub converter: Arc<MockConverter>,
    /// The state behind the router
    pub state: Arc<AppState>,
    /// Temporary directory for the audit database and download directory
    pub temp_dir: TempDir,
    /// Credentials sent with every request, if any
    api_key: Option<String>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// One part of a multipart upload
pub struct UploadPart<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

impl<'a> UploadPart<'a> {
    pub fn new(file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            file_name,
            content_type,
            data,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Protect the API with this key
    pub api_key: Option<String>,
    /// Override the executor's upload limit
    pub max_upload_bytes: Option<u64>,
    /// Override the idle session TTL
    pub session_ttl_secs: Option<u64>,
}

impl TestConfig {
    pub fn with_api_key(key: &str) -> Self {
        Self {
            api_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    pub fn with_max_upload_bytes(max: u64) -> Self {
        Self {
            max_upload_bytes: Some(max),
            ..Default::default()
        }
    }

    pub fn with_session_ttl_secs(ttl: u64) -> Self {
        Self {
            session_ttl_secs: Some(ttl),
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let auth = match test_config.api_key {
            Some(ref key) => AuthConfig {
                method: AuthMethod::ApiKey,
                api_key: Some(key.clone()),
            },
            None => AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
        };

        let mut conversion = ExecutorConfig::default();
        if let Some(max) = test_config.max_upload_bytes {
            conversion = conversion.with_max_upload_bytes(max);
        }

        let config = Config {
            auth: auth.clone(),
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                session_ttl_secs: test_config.session_ttl_secs.unwrap_or(3600),
                ..ServerConfig::default()
            },
            history: HistoryConfig::default(),
            conversion: conversion.clone(),
            converter: ConverterConfig::default()
                .with_output_dir(temp_dir.path().join("downloads")),
            audit: AuditConfig::default(),
        };

        let authenticator: Arc<dyn Authenticator> =
            Arc::from(create_authenticator(&auth).expect("Failed to create authenticator"));

        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&temp_dir.path().join("audit.db"))
                .expect("Failed to create audit store"),
        );
        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let converter = Arc::new(MockConverter::new());
        let executor = ConversionExecutor::with_shared_converter(
            conversion,
            Arc::clone(&converter) as Arc<dyn Converter>,
            HistoryLedger::in_memory(),
        )
        .with_audit(audit_handle.clone());

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            Some(audit_handle),
            audit_store,
            Arc::new(executor),
        ));

        let router = formatshift_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            converter,
            state,
            temp_dir,
            api_key: test_config.api_key,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request with explicit credentials, ignoring the fixture's own.
    pub async fn get_with_key(&self, path: &str, key: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Upload files as a multipart form, one part per file.
    pub async fn upload(&self, path: &str, parts: &[UploadPart<'_>]) -> TestResponse {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                    part.file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let builder = self.authorized(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                ),
        );
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Create a session and return its id.
    pub async fn create_session(&self) -> String {
        let response = self.post_empty("/api/v1/sessions").await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"]
            .as_str()
            .expect("session id should be a string")
            .to_string()
    }

    /// Poll a session until it reaches `status`, returning the last snapshot.
    pub async fn wait_for_status(&self, session_id: &str, status: &str) -> Value {
        let path = format!("/api/v1/sessions/{}", session_id);
        for _ in 0..200 {
            let response = self.get(&path).await;
            if response.body["status"] == status {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Session {} never reached status {}", session_id, status);
    }

    fn authorized(&self, builder: axum::http::request::Builder) -> axum::http::request::Builder {
        match self.api_key {
            Some(ref key) => builder.header(header::AUTHORIZATION, format!("Bearer {}", key)),
            None => builder,
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = self.authorized(Request::builder().method(method).uri(path));

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
