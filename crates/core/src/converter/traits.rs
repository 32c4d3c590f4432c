//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionOutput};
use crate::catalog::FormatLabel;

/// A backend that turns input bytes into the requested target format.
///
/// The workflow calls [`Converter::convert`] exactly once per conversion run
/// and never retries on its own.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts the job's input bytes to its target format.
    async fn convert(&self, job: ConversionJob) -> Result<ConversionOutput, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;

    /// Whether this backend can convert from `source_format` (a lower-case
    /// extension hint, possibly empty) to `target`.
    fn supports(&self, _source_format: &str, _target: FormatLabel) -> bool {
        true
    }

    /// Drops a result that will never be recorded, e.g. when the session
    /// moved on while the conversion ran. Backends that keep nothing
    /// addressable can ignore it.
    async fn discard(&self, _download_ref: &str) -> Result<(), ConverterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    struct UppercaseConverter;

    #[async_trait]
    impl Converter for UppercaseConverter {
        fn name(&self) -> &str {
            "uppercase"
        }

        async fn convert(&self, job: ConversionJob) -> Result<ConversionOutput, ConverterError> {
            if job.source_format != "txt" {
                return Err(ConverterError::UnsupportedConversion {
                    from: job.source_format,
                    to: job.target_format.to_string(),
                });
            }
            let text = String::from_utf8_lossy(&job.input).to_ascii_uppercase();
            Ok(ConversionOutput {
                download_ref: format!("mem://{}/{}", job.job_id, text),
            })
        }

        async fn validate(&self) -> Result<(), ConverterError> {
            Ok(())
        }
    }

    fn job(source_format: &str) -> ConversionJob {
        ConversionJob {
            job_id: "job-1".to_string(),
            original_name: "notes.txt".to_string(),
            source_format: source_format.to_string(),
            target_format: Category::Document.target("RTF").unwrap(),
            input: b"hello".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_custom_converter_convert() {
        let converter = UppercaseConverter;
        let output = converter.convert(job("txt")).await.unwrap();
        assert_eq!(output.download_ref, "mem://job-1/HELLO");
    }

    #[tokio::test]
    async fn test_custom_converter_rejects_source() {
        let converter = UppercaseConverter;
        let err = converter.convert(job("pdf")).await.unwrap_err();
        assert!(matches!(err, ConverterError::UnsupportedConversion { .. }));
    }

    #[tokio::test]
    async fn test_default_hooks() {
        let converter = UppercaseConverter;
        let target = Category::Image.target("PNG").unwrap();
        assert!(converter.supports("", target));
        assert!(converter.discard("mem://job-1/HELLO").await.is_ok());
    }
}
