//! Error types for the converter module.

use thiserror::Error;

/// Errors a converter backend can report.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The backend cannot convert between these formats.
    #[error("Unsupported conversion: {from} -> {to}")]
    UnsupportedConversion { from: String, to: String },

    /// The input was empty.
    #[error("Input is empty")]
    EmptyInput,

    /// Conversion ran and failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed { reason: String },

    /// The backend is not reachable or not ready.
    #[error("Converter unavailable: {reason}")]
    Unavailable { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new conversion failed error.
    pub fn conversion_failed(reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether an outer supervisor may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable { .. })
    }
}
