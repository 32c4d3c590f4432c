//! Conversion workflow engine.
//!
//! A user selects one file, the [`catalog`] offers target formats for the
//! file's category, and a [`session`] tracks the file through
//! `Idle -> Uploading -> Processing -> Complete | Error`. The [`executor`]
//! drives runs through a [`converter`] backend and appends each success to
//! the [`history`] ledger.

pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod converter;
pub mod executor;
pub mod history;
pub mod metrics;
pub mod session;
mod sqlite;
pub mod testing;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditEventEnvelope, AuditFilter, AuditHandle,
    AuditRecord, AuditStore, AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator, ANONYMOUS_USER,
};
pub use catalog::{catalog, classify, formats_for, Category, FormatLabel, UnknownCategory};
pub use config::{
    load_config, load_config_from_str, validate_config, AuditConfig, AuthConfig, AuthMethod,
    Config, ConfigError, HistoryBackend, HistoryConfig, SanitizedConfig, ServerConfig,
};
pub use converter::{
    ConversionJob, ConversionOutput, Converter, ConverterConfig, ConverterError, LocalConverter,
};
pub use executor::{ConversionExecutor, ConversionFailure, ExecutorConfig, RunOutcome};
pub use history::{
    open_store, HistoryError, HistoryFilter, HistoryLedger, HistoryRecord, HistoryStore,
    MemoryHistoryStore, SqliteHistoryStore,
};
pub use session::{
    single_file, ConversionRun, ConversionSession, ExpiredSession, FileSelection, RunToken,
    SelectedFile, SelectionError, SessionError, SessionRegistry, SessionSnapshot, SessionStatus,
    SharedSession,
};
