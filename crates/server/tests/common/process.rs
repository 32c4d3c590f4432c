//! Helpers for tests that run the real `formatshift` binary.

use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};

/// Find an available port
pub fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

pub fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn command(config_path: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_formatshift"));
    command
        .env("FORMATSHIFT_CONFIG", config_path)
        .env("RUST_LOG", "error");
    command
}

/// Run the binary to completion; for configs that must be rejected.
pub async fn run_to_exit(config_path: &Path) -> Output {
    timeout(Duration::from_secs(5), command(config_path).output())
        .await
        .expect("Command timed out")
        .expect("Failed to execute command")
}

/// A server process listening on `port`. Killed when dropped.
pub struct RunningServer {
    pub port: u16,
    pub client: Client,
    child: Child,
    _config: NamedTempFile,
}

impl RunningServer {
    /// Start the binary with `config` and wait until `/health` answers.
    pub async fn start(port: u16, config: &str) -> Self {
        let config = write_config(config);
        let child = command(config.path())
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn server");

        let server = Self {
            port,
            client: Client::new(),
            child,
            _config: config,
        };
        assert!(server.wait_ready(40).await, "Server did not start in time");
        server
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}/api/v1{}", self.port, path)
    }

    pub async fn get_json(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON")
    }

    pub async fn post_json(&self, path: &str) -> Value {
        self.client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON")
    }

    pub async fn stop(mut self) {
        self.child.kill().await.ok();
    }

    async fn wait_ready(&self, max_attempts: u32) -> bool {
        for _ in 0..max_attempts {
            if self.client.get(self.url("/health")).send().await.is_ok() {
                return true;
            }
            sleep(Duration::from_millis(50)).await;
        }
        false
    }
}
