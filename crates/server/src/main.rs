use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formatshift_core::{
    create_audit_system, create_authenticator, load_config, open_store, validate_config,
    AuditEvent, AuditStore, Authenticator, ConversionExecutor, Converter, HistoryLedger,
    LocalConverter, SqliteAuditStore,
};
use formatshift_server::api::create_router;
use formatshift_server::state::{spawn_session_sweeper, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("FORMATSHIFT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {}", config.auth.method.as_str());
    info!("History backend: {:?}", config.history.backend);

    // Compute config hash for audit
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Create audit store, in memory unless a path is configured
    let audit_store: Arc<dyn AuditStore> = match config.audit.path {
        Some(ref path) => Arc::new(
            SqliteAuditStore::new(path)
                .with_context(|| format!("Failed to open audit store at {:?}", path))?,
        ),
        None => Arc::new(SqliteAuditStore::in_memory().context("Failed to create audit store")?),
    };
    info!("Audit store initialized");

    // Create audit system
    let (audit_handle, writer_handle) = if config.audit.enabled {
        let (handle, writer) =
            create_audit_system(Arc::clone(&audit_store), config.audit.buffer_size);
        (Some(handle), Some(tokio::spawn(writer.run())))
    } else {
        warn!("Audit trail disabled in config");
        (None, None)
    };

    if let Some(ref audit) = audit_handle {
        audit
            .emit(AuditEvent::ServiceStarted {
                version: VERSION.to_string(),
                config_hash: config_hash_short.to_string(),
            })
            .await;
        info!("Emitted ServiceStarted audit event");
    }

    // Create history ledger
    let history_store = open_store(&config.history).context("Failed to open history store")?;
    let ledger = HistoryLedger::new(history_store);
    info!("History ledger initialized ({} records)", ledger.len()?);

    // Create converter
    let converter = LocalConverter::new(config.converter.clone());
    converter
        .validate()
        .await
        .context("Converter validation failed")?;
    info!(
        "Converter '{}' writing to {:?}",
        converter.name(),
        config.converter.output_dir
    );

    let converter: Arc<dyn Converter> = Arc::new(converter);
    let mut executor =
        ConversionExecutor::with_shared_converter(config.conversion.clone(), converter, ledger);
    if let Some(ref audit) = audit_handle {
        executor = executor.with_audit(audit.clone());
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        audit_handle.clone(),
        audit_store,
        Arc::new(executor),
    ));

    let sweeper = spawn_session_sweeper(Arc::clone(&state));
    info!(
        "Idle sessions expire after {}s",
        config.server.session_ttl_secs
    );

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    sweeper.abort();
    if let Some(ref audit) = audit_handle {
        audit
            .emit(AuditEvent::ServiceStopped {
                reason: "graceful_shutdown".to_string(),
            })
            .await;
    }

    // The writer stops once every AuditHandle is gone. Conversions still in
    // flight keep one through the executor until they finish.
    drop(audit_handle);

    if let Some(writer) = writer_handle {
        let _ = writer.await;
        info!("Audit writer stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
