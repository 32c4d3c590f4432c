use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::converter::ConverterConfig;
use crate::executor::ExecutorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub conversion: ExecutorConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sessions untouched for this long are evicted along with their payload
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// How often the idle session sweep runs
    #[serde(default = "default_sweep_interval")]
    pub session_sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_secs: default_session_ttl(),
            session_sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_session_ttl() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when `method = "api_key"`
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::ApiKey => "api_key",
        }
    }
}

/// History ledger configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub backend: HistoryBackend,
    /// SQLite database file (only used by the sqlite backend)
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::default(),
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("formatshift.db")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Audit trail configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Channel capacity between handles and the writer
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// SQLite database file; events are kept in memory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            buffer_size: default_buffer_size(),
            path: None,
        }
    }
}

fn default_audit_enabled() -> bool {
    true
}

fn default_buffer_size() -> usize {
    1000
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub history: HistoryConfig,
    pub conversion: ExecutorConfig,
    pub converter: ConverterConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                api_key_configured: config
                    .auth
                    .api_key
                    .as_deref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            history: config.history.clone(),
            conversion: config.conversion.clone(),
            converter: config.converter.clone(),
            audit: config.audit.clone(),
        }
    }
}
