//! Testing utilities and mock implementations.
//!
//! Provides a controllable [`MockConverter`] and fixtures so the workflow
//! can be exercised end to end without a real conversion backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use formatshift_core::testing::{fixtures, MockConverter};
//!
//! let converter = MockConverter::new();
//! converter.push_download_ref("ref-1").await;
//!
//! let file = fixtures::selected_file("report.pdf", "application/pdf");
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::catalog::Category;
    use crate::history::HistoryRecord;
    use crate::session::{FileSelection, SelectedFile};

    /// A file selection carrying `size` bytes of filler data.
    pub fn file_selection(name: &str, media_type: &str, size: usize) -> FileSelection {
        FileSelection::new(name, media_type, vec![0x5a; size])
    }

    /// A classified file with a 1 KiB payload size.
    pub fn selected_file(name: &str, media_type: &str) -> SelectedFile {
        SelectedFile::from_selection(&file_selection(name, media_type, 1024))
    }

    /// A PDF to DOCX history record.
    pub fn history_record(id: &str, requested_by: &str) -> HistoryRecord {
        HistoryRecord {
            id: id.to_string(),
            original_name: "report.pdf".to_string(),
            original_format: "pdf".to_string(),
            converted_format: "docx".to_string(),
            category: Category::Document,
            requested_by: requested_by.to_string(),
            timestamp: Utc::now(),
            download_ref: format!("/downloads/{}.docx", id),
        }
    }
}
