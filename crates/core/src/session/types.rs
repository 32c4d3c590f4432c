//! Session data types.

use serde::{Deserialize, Serialize};

use crate::catalog::{classify, Category, FormatLabel};

/// Workflow status of a conversion session.
///
/// `Idle` covers both "nothing selected" and "ready to convert"; readiness is
/// the derived [`ConversionSession::is_runnable`](super::ConversionSession::is_runnable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Uploading,
    Processing,
    Complete,
    Error,
}

impl SessionStatus {
    /// Returns the status as a string (for logs and audit events).
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Uploading => "uploading",
            SessionStatus::Processing => "processing",
            SessionStatus::Complete => "complete",
            SessionStatus::Error => "error",
        }
    }

    /// True while a conversion run is in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SessionStatus::Uploading | SessionStatus::Processing)
    }
}

/// A single file as delivered by a picker or drop event.
#[derive(Debug, Clone)]
pub struct FileSelection {
    pub name: String,
    pub size_bytes: u64,
    pub declared_media_type: String,
    pub data: Vec<u8>,
}

impl FileSelection {
    /// Builds a selection whose size is the length of `data`.
    pub fn new(
        name: impl Into<String>,
        declared_media_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes: data.len() as u64,
            declared_media_type: declared_media_type.into(),
            data,
        }
    }
}

/// The file attached to a session. Its category is fixed at selection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub declared_media_type: String,
    pub category: Category,
}

impl SelectedFile {
    pub(crate) fn from_selection(selection: &FileSelection) -> Self {
        Self {
            name: selection.name.clone(),
            size_bytes: selection.size_bytes,
            declared_media_type: selection.declared_media_type.clone(),
            category: classify(&selection.declared_media_type),
        }
    }

    /// Lower-case extension of the file name, empty when there is none.
    pub fn source_format(&self) -> String {
        source_format(&self.name)
    }
}

/// Extracts the lower-case extension after the last `.` of a file name.
pub fn source_format(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Identifies one started conversion run of a session.
///
/// Selecting a new file or resetting the session invalidates the token, and
/// results reported with an invalidated token are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunToken {
    pub session_id: String,
    pub generation: u64,
}

/// Everything the executor needs for one run, moved out of the session.
#[derive(Debug)]
pub struct ConversionRun {
    pub token: RunToken,
    pub requested_by: String,
    pub file: SelectedFile,
    pub target_format: FormatLabel,
    pub payload: Vec<u8>,
}

/// By-value view of a session for callers and API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub owner: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<SelectedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_format: Option<FormatLabel>,
    pub runnable: bool,
    pub available_formats: Vec<FormatLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_record_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format() {
        assert_eq!(source_format("report.pdf"), "pdf");
        assert_eq!(source_format("archive.tar.GZ"), "gz");
        assert_eq!(source_format("README"), "");
        assert_eq!(source_format("trailing."), "");
        assert_eq!(source_format(""), "");
    }

    #[test]
    fn test_selected_file_classifies_once() {
        let selection = FileSelection::new("clip.mp4", "video/mp4", vec![0; 16]);
        let file = SelectedFile::from_selection(&selection);
        assert_eq!(file.category, Category::Video);
        assert_eq!(file.size_bytes, 16);
        assert_eq!(file.source_format(), "mp4");
    }

    #[test]
    fn test_status_predicates() {
        assert!(SessionStatus::Uploading.is_in_flight());
        assert!(SessionStatus::Processing.is_in_flight());
        assert!(!SessionStatus::Idle.is_in_flight());
        assert!(!SessionStatus::Complete.is_in_flight());
        assert!(!SessionStatus::Error.is_in_flight());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
