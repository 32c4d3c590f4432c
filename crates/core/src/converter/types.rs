//! Types for the converter module.

use crate::catalog::FormatLabel;

/// A conversion request handed to a [`Converter`](super::Converter).
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Unique job ID; the history record id of a successful run.
    pub job_id: String,
    /// Name of the file as selected by the user.
    pub original_name: String,
    /// Lower-case source extension hint (empty when the name has none).
    pub source_format: String,
    /// Requested target format.
    pub target_format: FormatLabel,
    /// Input bytes.
    pub input: Vec<u8>,
}

/// Result of a successful conversion. The bytes stay with the backend.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Opaque locator where the result can be downloaded.
    pub download_ref: String,
}
