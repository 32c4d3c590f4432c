//! Error types for session operations.

use thiserror::Error;

use super::types::SessionStatus;
use crate::catalog::Category;

/// Errors returned by rejected session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A target was chosen before any file was selected.
    #[error("No file selected")]
    NoFile,

    /// The requested target is not in the catalog for the file's category.
    #[error("Format {format} is not available for {category} files")]
    CatalogMismatch { format: String, category: Category },

    /// The operation needs the session to be idle.
    #[error("Session is {status}, expected idle")]
    NotIdle { status: &'static str },
}

impl SessionError {
    pub(crate) fn not_idle(status: SessionStatus) -> Self {
        Self::NotIdle {
            status: status.as_str(),
        }
    }
}

/// Errors from turning a raw input event into a single file selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("No file provided")]
    NoFile,

    #[error("Exactly one file is accepted per selection, got {count}")]
    MultipleFiles { count: usize },
}
