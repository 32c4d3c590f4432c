mod common;

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::sleep;

use common::process::{get_available_port, RunningServer};

/// Config with sqlite audit and history stores under `dir`
fn config_with_stores(port: u16, dir: &Path) -> String {
    format!(
        r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = {port}

[history]
backend = "sqlite"
path = "{dir}/history.db"

[audit]
path = "{dir}/audit.db"

[converter]
output_dir = "{dir}/downloads"
"#,
        port = port,
        dir = dir.display()
    )
}

async fn start(dir: &Path) -> RunningServer {
    let port = get_available_port();
    let server = RunningServer::start(port, &config_with_stores(port, dir)).await;
    // Let the writer flush service_started
    sleep(Duration::from_millis(100)).await;
    server
}

#[tokio::test]
async fn test_server_creates_database_files() {
    let temp_dir = TempDir::new().unwrap();
    let server = start(temp_dir.path()).await;

    assert!(temp_dir.path().join("audit.db").exists());
    assert!(temp_dir.path().join("history.db").exists());
    assert!(temp_dir.path().join("downloads").is_dir());

    server.stop().await;
}

#[tokio::test]
async fn test_audit_records_service_and_session_events() {
    let temp_dir = TempDir::new().unwrap();
    let server = start(temp_dir.path()).await;

    let created = server.post_json("/sessions").await;
    let session_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "idle");
    sleep(Duration::from_millis(100)).await;

    let json = server.get_json("/audit?event_type=service_started").await;
    let events = json["events"].as_array().expect("events should be an array");
    assert!(!events.is_empty(), "Should have a service_started event");
    assert!(events[0]["data"]["version"].is_string());
    assert!(events[0]["data"]["config_hash"].is_string());

    let json = server
        .get_json(&format!("/audit?session_id={}", session_id))
        .await;
    let events = json["events"].as_array().expect("events should be an array");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "session_created");
    assert_eq!(events[0]["user_id"], "anonymous");

    let json = server.get_json("/audit?event_type=conversion_completed").await;
    assert!(json["events"].as_array().unwrap().is_empty());
    assert_eq!(json["total"], 0);

    server.stop().await;
}

#[tokio::test]
async fn test_audit_query_pagination() {
    let temp_dir = TempDir::new().unwrap();
    let server = start(temp_dir.path()).await;

    let json = server.get_json("/audit?limit=10&offset=0").await;
    assert!(json["total"].is_i64());
    assert_eq!(json["limit"], 10);
    assert_eq!(json["offset"], 0);

    let json = server.get_json("/audit?limit=5000").await;
    assert_eq!(json["limit"], 1000);

    server.stop().await;
}

#[tokio::test]
async fn test_audit_and_history_persist_across_restarts() {
    let temp_dir = TempDir::new().unwrap();

    let first = start(temp_dir.path()).await;
    first.stop().await;
    sleep(Duration::from_millis(100)).await;

    let second = start(temp_dir.path()).await;
    let json = second.get_json("/audit?event_type=service_started").await;
    let events = json["events"].as_array().expect("events should be an array");
    assert!(
        events.len() >= 2,
        "Should have at least 2 service_started events after restart, got {}",
        events.len()
    );

    let history = second.get_json("/history").await;
    assert_eq!(history["total"], 0);

    second.stop().await;
}
