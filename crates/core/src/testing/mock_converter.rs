//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};

use crate::catalog::FormatLabel;
use crate::converter::{ConversionJob, ConversionOutput, Converter, ConverterError};

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Simulate failure with a one-shot error
/// - Queue download references to hand out
/// - Hold conversions until the test releases them
/// - Track discarded download references
///
/// # Example
///
/// ```rust,ignore
/// use formatshift_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.push_download_ref("ref-1").await;
///
/// let output = converter.convert(job).await?;
/// assert_eq!(output.download_ref, "ref-1");
/// assert_eq!(converter.conversion_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Download references handed out in order; generated when empty.
    download_refs: Arc<RwLock<VecDeque<String>>>,
    /// Download references passed to `discard`.
    discarded: Arc<RwLock<Vec<String>>>,
    /// If set, the next conversion will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    /// (source format, target label) pairs reported as unsupported.
    unsupported: Arc<std::sync::RwLock<Vec<(String, String)>>>,
    /// Whether conversions wait on `gate` before finishing.
    held: Arc<AtomicBool>,
    gate: Arc<Semaphore>,
    /// Whether `validate` reports the backend as available.
    available: Arc<AtomicBool>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            download_refs: Arc::new(RwLock::new(VecDeque::new())),
            discarded: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
            unsupported: Arc::new(std::sync::RwLock::new(Vec::new())),
            held: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(Semaphore::new(0)),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions submitted (finished or not).
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Download references the workflow discarded, in order.
    pub async fn discarded_refs(&self) -> Vec<String> {
        self.discarded.read().await.clone()
    }

    /// Queue a download reference for the next successful conversion.
    pub async fn push_download_ref(&self, download_ref: impl Into<String>) {
        self.download_refs
            .write()
            .await
            .push_back(download_ref.into());
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Report `source_format -> target` as unsupported.
    pub fn set_unsupported(&self, source_format: &str, target: &str) {
        if let Ok(mut pairs) = self.unsupported.write() {
            pairs.push((source_format.to_string(), target.to_ascii_uppercase()));
        }
    }

    /// Make `validate` fail with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make conversions block until [`release_conversions`](Self::release_conversions).
    pub fn hold_conversions(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let `n` held conversions finish.
    pub fn release_conversions(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait until at least `n` conversions have been submitted.
    pub async fn wait_for_conversions(&self, n: usize) {
        while self.conversion_count().await < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn next_download_ref(&self, job: &ConversionJob) -> String {
        self.download_refs
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| {
                format!("mock://{}.{}", job.job_id, job.target_format.extension())
            })
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionOutput, ConverterError> {
        let index = {
            let mut conversions = self.conversions.write().await;
            conversions.push(RecordedConversion {
                job: job.clone(),
                success: false,
            });
            conversions.len() - 1
        };

        if self.held.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let download_ref = self.next_download_ref(&job).await;
        if let Some(recorded) = self.conversions.write().await.get_mut(index) {
            recorded.success = true;
        }

        Ok(ConversionOutput { download_ref })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ConverterError::unavailable("mock converter disabled"))
        }
    }

    async fn discard(&self, download_ref: &str) -> Result<(), ConverterError> {
        self.discarded.write().await.push(download_ref.to_string());
        Ok(())
    }

    fn supports(&self, source_format: &str, target: FormatLabel) -> bool {
        self.unsupported
            .read()
            .map(|pairs| {
                !pairs
                    .iter()
                    .any(|(from, to)| from == source_format && to == target.as_str())
            })
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn job(id: &str) -> ConversionJob {
        ConversionJob {
            job_id: id.to_string(),
            original_name: "a.png".to_string(),
            source_format: "png".to_string(),
            target_format: Category::Image.target("WEBP").unwrap(),
            input: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_records_and_generates_refs() {
        let converter = MockConverter::new();
        converter.push_download_ref("ref-1").await;

        let first = converter.convert(job("j1")).await.unwrap();
        let second = converter.convert(job("j2")).await.unwrap();

        assert_eq!(first.download_ref, "ref-1");
        assert_eq!(second.download_ref, "mock://j2.webp");

        let recorded = converter.recorded_conversions().await;
        assert_eq!(recorded.len(), 2);
        assert!(recorded.iter().all(|r| r.success));
        assert_eq!(recorded[1].job.input, vec![1, 2, 3]);

        converter.discard(&first.download_ref).await.unwrap();
        assert_eq!(converter.discarded_refs().await, vec!["ref-1"]);
    }

    #[tokio::test]
    async fn test_next_error_is_one_shot() {
        let converter = MockConverter::new();
        converter.set_next_error(ConverterError::EmptyInput).await;

        assert!(converter.convert(job("j1")).await.is_err());
        assert!(converter.convert(job("j2")).await.is_ok());
        assert!(!converter.recorded_conversions().await[0].success);
    }

    #[tokio::test]
    async fn test_supports_and_validate() {
        let converter = MockConverter::new();
        let webp = Category::Image.target("WEBP").unwrap();
        assert!(converter.supports("png", webp));

        converter.set_unsupported("png", "webp");
        assert!(!converter.supports("png", webp));
        assert!(converter.supports("jpg", webp));

        assert!(converter.validate().await.is_ok());
        converter.set_available(false);
        assert!(converter.validate().await.is_err());
    }
}
