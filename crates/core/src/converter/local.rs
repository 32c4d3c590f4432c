//! Store-only converter backend.
//!
//! Writes the input bytes unchanged to the output directory under the target
//! extension. It stands in for a real codec backend so the workflow can run
//! end to end; plug a transcoding [`Converter`] in its place for real output.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionJob, ConversionOutput};

/// Converter that stores the input under the requested extension.
pub struct LocalConverter {
    config: ConverterConfig,
}

impl LocalConverter {
    /// Creates a new local converter.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    fn output_path(&self, file_name: &str) -> PathBuf {
        self.config.output_dir.join(file_name)
    }

    fn download_ref(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.config.download_base_url.trim_end_matches('/'),
            file_name
        )
    }

    /// The stored file behind one of our download refs, if it is one.
    fn file_name_for<'a>(&self, download_ref: &'a str) -> Option<&'a str> {
        let base = self.config.download_base_url.trim_end_matches('/');
        let file_name = download_ref.strip_prefix(base)?.strip_prefix('/')?;
        let plain = !file_name.is_empty()
            && !file_name.starts_with('.')
            && !file_name.contains(['/', '\\']);
        plain.then_some(file_name)
    }
}

#[async_trait]
impl Converter for LocalConverter {
    fn name(&self) -> &str {
        "local"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionOutput, ConverterError> {
        if job.input.is_empty() {
            return Err(ConverterError::EmptyInput);
        }

        let file_name = format!("{}.{}", job.job_id, job.target_format.extension());
        let path = self.output_path(&file_name);

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        tokio::fs::write(&path, &job.input).await?;

        debug!(
            job_id = %job.job_id,
            path = %path.display(),
            bytes = job.input.len(),
            "Stored conversion output"
        );

        Ok(ConversionOutput {
            download_ref: self.download_ref(&file_name),
        })
    }

    async fn discard(&self, download_ref: &str) -> Result<(), ConverterError> {
        let file_name = self.file_name_for(download_ref).ok_or_else(|| {
            ConverterError::conversion_failed(format!(
                "not a local download ref: {}",
                download_ref
            ))
        })?;
        let path = self.output_path(file_name);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed discarded output");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| {
                ConverterError::unavailable(format!(
                    "cannot create output dir {}: {}",
                    self.config.output_dir.display(),
                    e
                ))
            })?;
        info!(
            output_dir = %self.config.output_dir.display(),
            "Local converter ready"
        );
        Ok(())
    }
}
