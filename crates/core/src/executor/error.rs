//! Conversion failure taxonomy.

use thiserror::Error;

use crate::converter::ConverterError;
use crate::history::HistoryError;

/// Why a conversion run ended in the `Error` state.
#[derive(Debug, Error)]
pub enum ConversionFailure {
    /// The upload phase rejected the payload.
    #[error("File is {size_bytes} bytes, the limit is {max_bytes}")]
    PayloadTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error(transparent)]
    Converter(#[from] ConverterError),

    #[error("Conversion timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },

    /// The converter succeeded but the record could not be stored.
    #[error("Failed to record conversion: {0}")]
    History(#[from] HistoryError),
}

impl ConversionFailure {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::PayloadTooLarge { .. } => false,
            Self::Converter(e) => e.is_retryable(),
            Self::TimedOut { .. } | Self::History(_) => true,
        }
    }

    /// Short machine-readable kind, used in audit events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Converter(_) => "converter",
            Self::TimedOut { .. } => "timed_out",
            Self::History(_) => "history",
        }
    }
}
