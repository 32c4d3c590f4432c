use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AuditEventEnvelope, AuditHandle, AuditRecord, AuditStore};
use crate::metrics;

/// Background task that receives audit events and writes them to storage
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditEventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Consume events until every [`AuditHandle`] is dropped, then return.
    ///
    /// A failed insert is logged and counted; the event is lost and the
    /// writer keeps going.
    pub async fn run(mut self) {
        tracing::info!("Audit writer started");
        let mut stored = 0u64;

        while let Some(envelope) = self.rx.recv().await {
            let record = AuditRecord::from_envelope(envelope);
            match self.store.insert(&record) {
                Ok(_) => {
                    stored += 1;
                    metrics::AUDIT_WRITES.with_label_values(&["stored"]).inc();
                }
                Err(e) => {
                    metrics::AUDIT_WRITES.with_label_values(&["failed"]).inc();
                    tracing::error!(
                        event_type = %record.event_type,
                        session_id = record.session_id.as_deref().unwrap_or("-"),
                        "Failed to write audit event: {}",
                        e
                    );
                }
            }
        }

        tracing::info!(stored, "Audit writer shutting down");
    }
}

/// Create a complete audit system
///
/// Returns the handle to clone into components and the writer to spawn with
/// `tokio::spawn(writer.run())`. `buffer_size` bounds the channel; `emit`
/// waits when it is full.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = AuditHandle::new(tx);
    let writer = AuditWriter::new(rx, store);
    (handle, writer)
}
