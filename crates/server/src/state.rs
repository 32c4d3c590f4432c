use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use formatshift_core::{
    AuditEvent, AuditHandle, AuditStore, Authenticator, Config, ConversionExecutor, Converter,
    HistoryLedger, SanitizedConfig, SessionRegistry,
};

/// Executor shared between request handlers and spawned runs.
pub type SharedExecutor = Arc<ConversionExecutor<dyn Converter>>;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit: Option<AuditHandle>,
    audit_store: Arc<dyn AuditStore>,
    sessions: SessionRegistry,
    executor: SharedExecutor,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit: Option<AuditHandle>,
        audit_store: Arc<dyn AuditStore>,
        executor: SharedExecutor,
    ) -> Self {
        Self {
            config,
            authenticator,
            audit,
            audit_store,
            sessions: SessionRegistry::new(),
            executor,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn executor(&self) -> &SharedExecutor {
        &self.executor
    }

    pub fn ledger(&self) -> &HistoryLedger {
        self.executor.ledger()
    }

    /// Directory served under `/downloads`.
    pub fn download_dir(&self) -> &Path {
        &self.config.converter.output_dir
    }

    /// Largest accepted upload, as configured for the executor.
    pub fn max_upload_bytes(&self) -> u64 {
        self.config.conversion.max_upload_bytes
    }

    /// Evicts sessions idle for longer than the configured TTL.
    ///
    /// Returns how many were dropped; each one is audited.
    pub async fn expire_idle_sessions(&self) -> usize {
        let ttl = Duration::from_secs(self.config.server.session_ttl_secs);
        let expired = self.sessions.evict_idle(ttl).await;
        for session in &expired {
            self.audit(AuditEvent::SessionExpired {
                session_id: session.id.clone(),
                user_id: session.owner.clone(),
                status: session.status.as_str().to_string(),
                freed_bytes: session.freed_bytes as u64,
            });
        }
        expired.len()
    }

    /// Queues an audit event without waiting. Dropped when auditing is off
    /// or the channel is full.
    pub fn audit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.try_emit(event);
        }
    }
}

/// Runs [`AppState::expire_idle_sessions`] on the configured interval until
/// the returned task is aborted.
pub fn spawn_session_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    let every = Duration::from_secs(state.config.server.session_sweep_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            state.expire_idle_sessions().await;
        }
    })
}
