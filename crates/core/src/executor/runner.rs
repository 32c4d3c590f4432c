//! Drives sessions through the converter and into the history ledger.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use crate::audit::{AuditEvent, AuditHandle};
use crate::catalog::FormatLabel;
use crate::converter::{ConversionJob, Converter, ConverterError};
use crate::history::{HistoryLedger, HistoryRecord};
use crate::metrics;
use crate::session::{ConversionRun, RunToken, SelectedFile, SharedSession};

use super::config::ExecutorConfig;
use super::error::ConversionFailure;

/// How a call to [`ConversionExecutor::run`] ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The session was not runnable; nothing happened.
    NotStarted,
    /// The session was reset or got a new file mid-flight; the result was dropped.
    Cancelled,
    Completed(HistoryRecord),
    Failed(ConversionFailure),
}

impl RunOutcome {
    pub fn record(&self) -> Option<&HistoryRecord> {
        match self {
            Self::Completed(record) => Some(record),
            _ => None,
        }
    }
}

/// Executes conversions through a [`Converter`] and records successes.
///
/// `C` may be unsized, so a server can hold a `ConversionExecutor<dyn Converter>`.
pub struct ConversionExecutor<C: Converter + ?Sized> {
    config: ExecutorConfig,
    converter: Arc<C>,
    ledger: HistoryLedger,
    audit: Option<AuditHandle>,
}

impl<C: Converter + ?Sized + 'static> ConversionExecutor<C> {
    pub fn new(config: ExecutorConfig, converter: C, ledger: HistoryLedger) -> Self
    where
        C: Sized,
    {
        Self::with_shared_converter(config, Arc::new(converter), ledger)
    }

    /// Creates an executor around a converter the caller keeps a handle to.
    pub fn with_shared_converter(
        config: ExecutorConfig,
        converter: Arc<C>,
        ledger: HistoryLedger,
    ) -> Self {
        Self {
            config,
            converter,
            ledger,
            audit: None,
        }
    }

    /// Sets the audit handle for logging events.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    /// Converts one file and builds its history record.
    ///
    /// Calls the converter once, without retrying, bounded by the configured
    /// timeout. The ledger is not touched.
    pub async fn execute(
        &self,
        requested_by: &str,
        file: &SelectedFile,
        payload: Vec<u8>,
        target: FormatLabel,
    ) -> Result<HistoryRecord, ConversionFailure> {
        let source_format = file.source_format();
        if !self.converter.supports(&source_format, target) {
            return Err(ConverterError::UnsupportedConversion {
                from: source_format,
                to: target.extension(),
            }
            .into());
        }

        let job_id = uuid::Uuid::new_v4().to_string();
        let job = ConversionJob {
            job_id: job_id.clone(),
            original_name: file.name.clone(),
            source_format: source_format.clone(),
            target_format: target,
            input: payload,
        };

        let started = Instant::now();
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let result = tokio::time::timeout(timeout, self.converter.convert(job)).await;
        metrics::CONVERSION_DURATION
            .with_label_values(&[file.category.as_str()])
            .observe(started.elapsed().as_secs_f64());

        let output = match result {
            Ok(output) => output?,
            Err(_) => {
                return Err(ConversionFailure::TimedOut {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        Ok(HistoryRecord {
            id: job_id,
            original_name: file.name.clone(),
            original_format: source_format,
            converted_format: target.extension(),
            category: file.category,
            requested_by: requested_by.to_string(),
            timestamp: Utc::now(),
            download_ref: output.download_ref,
        })
    }

    /// Runs a session from `start` to `Complete` or `Error`.
    ///
    /// The session lock is released while the converter runs. A run whose
    /// session was reset or given a new file in the meantime is discarded
    /// and leaves no record.
    pub async fn run(&self, session: &SharedSession) -> RunOutcome {
        let run = session.lock().await.start();
        match run {
            Some(run) => self.drive(session, run).await,
            None => RunOutcome::NotStarted,
        }
    }

    /// Continues a run already begun with [`ConversionSession::start`].
    ///
    /// [`ConversionSession::start`]: crate::session::ConversionSession::start
    pub async fn drive(&self, session: &SharedSession, run: ConversionRun) -> RunOutcome {
        let ConversionRun {
            token,
            requested_by,
            file,
            target_format,
            payload,
        } = run;

        let started = Instant::now();
        let category = file.category.as_str();
        info!(
            session_id = %token.session_id,
            file = %file.name,
            target = %target_format,
            size_bytes = payload.len(),
            "Conversion started"
        );
        self.emit(AuditEvent::ConversionStarted {
            session_id: token.session_id.clone(),
            user_id: requested_by.clone(),
            file_name: file.name.clone(),
            source_format: file.source_format(),
            target_format: target_format.to_string(),
            size_bytes: payload.len() as u64,
        })
        .await;
        metrics::PAYLOAD_BYTES
            .with_label_values(&[category])
            .observe(payload.len() as f64);

        // Upload phase
        let size_bytes = payload.len() as u64;
        if size_bytes > self.config.max_upload_bytes {
            let failure = ConversionFailure::PayloadTooLarge {
                size_bytes,
                max_bytes: self.config.max_upload_bytes,
            };
            return self
                .finish_failed(session, &token, &requested_by, category, "upload", failure)
                .await;
        }
        if !session.lock().await.upload_complete(&token) {
            return self.discard(&token, &requested_by, category, "upload").await;
        }

        // Processing phase
        let record = match self
            .execute(&requested_by, &file, payload, target_format)
            .await
        {
            Ok(record) => record,
            Err(failure) => {
                return self
                    .finish_failed(session, &token, &requested_by, category, "processing", failure)
                    .await;
            }
        };

        let appended = {
            let mut guard = session.lock().await;
            if !guard.is_current(&token) {
                None
            } else {
                let result = self.ledger.append(&record);
                match &result {
                    Ok(()) => {
                        guard.complete(&token, record.id.clone());
                    }
                    Err(e) => {
                        guard.fail(&token, e.to_string());
                    }
                }
                Some(result)
            }
        };

        match appended {
            None => {
                self.release_output(&token, &record.download_ref).await;
                self.discard(&token, &requested_by, category, "processing")
                    .await
            }
            Some(Err(e)) => {
                self.release_output(&token, &record.download_ref).await;
                let failure = ConversionFailure::from(e);
                self.report_failure(&token, &requested_by, category, &failure)
                    .await;
                RunOutcome::Failed(failure)
            }
            Some(Ok(())) => {
                metrics::CONVERSIONS_TOTAL
                    .with_label_values(&[category, "completed"])
                    .inc();
                info!(
                    session_id = %token.session_id,
                    record_id = %record.id,
                    download_ref = %record.download_ref,
                    "Conversion completed"
                );
                self.emit(AuditEvent::ConversionCompleted {
                    session_id: token.session_id.clone(),
                    user_id: requested_by,
                    record_id: record.id.clone(),
                    download_ref: record.download_ref.clone(),
                    duration_ms: started.elapsed().as_millis() as u64,
                })
                .await;
                RunOutcome::Completed(record)
            }
        }
    }

    async fn finish_failed(
        &self,
        session: &SharedSession,
        token: &RunToken,
        requested_by: &str,
        category: &str,
        phase: &str,
        failure: ConversionFailure,
    ) -> RunOutcome {
        if !session.lock().await.fail(token, failure.to_string()) {
            return self.discard(token, requested_by, category, phase).await;
        }
        self.report_failure(token, requested_by, category, &failure)
            .await;
        RunOutcome::Failed(failure)
    }

    async fn report_failure(
        &self,
        token: &RunToken,
        requested_by: &str,
        category: &str,
        failure: &ConversionFailure,
    ) {
        metrics::CONVERSIONS_TOTAL
            .with_label_values(&[category, "failed"])
            .inc();
        warn!(
            session_id = %token.session_id,
            kind = failure.kind(),
            error = %failure,
            "Conversion failed"
        );
        self.emit(AuditEvent::ConversionFailed {
            session_id: token.session_id.clone(),
            user_id: requested_by.to_string(),
            kind: failure.kind().to_string(),
            error: failure.to_string(),
            retryable: failure.is_retryable(),
        })
        .await;
    }

    async fn discard(
        &self,
        token: &RunToken,
        requested_by: &str,
        category: &str,
        phase: &str,
    ) -> RunOutcome {
        metrics::CONVERSIONS_TOTAL
            .with_label_values(&[category, "discarded"])
            .inc();
        info!(
            session_id = %token.session_id,
            phase,
            "Discarding result of superseded run"
        );
        self.emit(AuditEvent::ConversionDiscarded {
            session_id: token.session_id.clone(),
            user_id: requested_by.to_string(),
            phase: phase.to_string(),
        })
        .await;
        RunOutcome::Cancelled
    }

    /// Hands a result that never made it into the ledger back to the converter.
    async fn release_output(&self, token: &RunToken, download_ref: &str) {
        if let Err(e) = self.converter.discard(download_ref).await {
            warn!(
                session_id = %token.session_id,
                download_ref,
                error = %e,
                "Failed to discard unrecorded output"
            );
        }
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.emit(event).await;
        }
    }
}
