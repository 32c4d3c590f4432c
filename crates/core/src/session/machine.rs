//! The conversion session state machine.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::error::SessionError;
use super::types::{
    ConversionRun, FileSelection, RunToken, SelectedFile, SessionSnapshot, SessionStatus,
};
use crate::catalog::FormatLabel;
use crate::metrics;

/// One user's file on its way through select, choose, convert.
///
/// Every method runs to completion without suspending; callers serialize
/// access (the registry wraps each session in a mutex).
#[derive(Debug)]
pub struct ConversionSession {
    id: String,
    owner: String,
    file: Option<SelectedFile>,
    payload: Vec<u8>,
    target_format: Option<FormatLabel>,
    status: SessionStatus,
    generation: u64,
    last_error: Option<String>,
    last_record_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversionSession {
    /// Creates an empty idle session with a fresh id.
    pub fn new(owner: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), owner)
    }

    pub fn with_id(id: impl Into<String>, owner: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner: owner.into(),
            file: None,
            payload: Vec::new(),
            target_format: None,
            status: SessionStatus::Idle,
            generation: 0,
            last_error: None,
            last_record_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn target_format(&self) -> Option<FormatLabel> {
        self.target_format
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_record_id(&self) -> Option<&str> {
        self.last_record_id.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Payload bytes the session holds until `start` moves them out.
    pub fn held_bytes(&self) -> usize {
        self.payload.len()
    }

    /// Whether nothing touched the session during the `ttl` before `now`.
    pub fn is_idle_for(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        (now - self.updated_at)
            .to_std()
            .is_ok_and(|idle| idle >= ttl)
    }

    /// Idle with both a file and a target: `start` would begin a run.
    pub fn is_runnable(&self) -> bool {
        self.status == SessionStatus::Idle && self.file.is_some() && self.target_format.is_some()
    }

    /// Target formats offered for the selected file, empty without a file.
    pub fn available_formats(&self) -> &'static [FormatLabel] {
        self.file
            .as_ref()
            .map(|f| f.category.formats())
            .unwrap_or(&[])
    }

    /// Whether `token` still identifies the latest started run.
    pub fn is_current(&self, token: &RunToken) -> bool {
        token.session_id == self.id && token.generation == self.generation
    }

    /// Replaces the file, clears the target and returns to idle.
    ///
    /// Allowed in every state. An in-flight run is invalidated.
    pub fn select_file(&mut self, selection: FileSelection) -> &SelectedFile {
        let file = SelectedFile::from_selection(&selection);
        debug!(
            session_id = %self.id,
            name = %file.name,
            category = %file.category,
            previous_status = self.status.as_str(),
            "File selected"
        );

        self.generation += 1;
        self.payload = selection.data;
        self.target_format = None;
        self.status = SessionStatus::Idle;
        self.last_error = None;
        self.last_record_id = None;
        self.touch();
        self.file.insert(file)
    }

    /// Sets the target format from a user-supplied label.
    ///
    /// The label must be offered for the selected file's category; a
    /// rejected call leaves the session unchanged.
    pub fn choose_target(&mut self, label: &str) -> Result<FormatLabel, SessionError> {
        if self.status != SessionStatus::Idle {
            return Err(SessionError::not_idle(self.status));
        }
        let file = self.file.as_ref().ok_or(SessionError::NoFile)?;
        let target = file
            .category
            .target(label)
            .ok_or_else(|| SessionError::CatalogMismatch {
                format: label.to_string(),
                category: file.category,
            })?;

        self.target_format = Some(target);
        self.touch();
        Ok(target)
    }

    /// Begins a run if the session is runnable.
    ///
    /// Returns `None` and changes nothing otherwise. On success the session
    /// moves to `Uploading` and the payload moves into the returned run.
    pub fn start(&mut self) -> Option<ConversionRun> {
        if !self.is_runnable() {
            debug!(
                session_id = %self.id,
                status = self.status.as_str(),
                has_file = self.file.is_some(),
                has_target = self.target_format.is_some(),
                "Start ignored, session not runnable"
            );
            metrics::IGNORED_TRANSITIONS
                .with_label_values(&["start"])
                .inc();
            return None;
        }
        let (file, target_format) = match (self.file.clone(), self.target_format) {
            (Some(file), Some(target)) => (file, target),
            _ => return None,
        };

        self.status = SessionStatus::Uploading;
        self.last_error = None;
        self.last_record_id = None;
        self.touch();

        Some(ConversionRun {
            token: self.token(),
            requested_by: self.owner.clone(),
            file,
            target_format,
            payload: std::mem::take(&mut self.payload),
        })
    }

    /// Moves `Uploading` to `Processing` for the current run.
    pub fn upload_complete(&mut self, token: &RunToken) -> bool {
        if !self.accepts(token, "upload_complete", SessionStatus::Uploading) {
            return false;
        }
        self.status = SessionStatus::Processing;
        self.touch();
        true
    }

    /// Marks the current run as completed with the given history record id.
    pub fn complete(&mut self, token: &RunToken, record_id: impl Into<String>) -> bool {
        if !self.accepts(token, "complete", SessionStatus::Processing) {
            return false;
        }
        self.status = SessionStatus::Complete;
        self.last_record_id = Some(record_id.into());
        self.touch();
        true
    }

    /// Marks the current run as failed, from either in-flight state.
    pub fn fail(&mut self, token: &RunToken, reason: impl Into<String>) -> bool {
        if !self.is_current(token) || !self.status.is_in_flight() {
            self.ignore("fail");
            return false;
        }
        self.status = SessionStatus::Error;
        self.last_error = Some(reason.into());
        self.touch();
        true
    }

    /// Clears file and target and returns to idle.
    ///
    /// Returns true when this cancelled an in-flight run.
    pub fn reset(&mut self) -> bool {
        let cancelled = self.status.is_in_flight();
        self.generation += 1;
        self.file = None;
        self.payload = Vec::new();
        self.target_format = None;
        self.status = SessionStatus::Idle;
        self.last_error = None;
        self.last_record_id = None;
        self.touch();
        cancelled
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            owner: self.owner.clone(),
            status: self.status,
            file: self.file.clone(),
            target_format: self.target_format,
            runnable: self.is_runnable(),
            available_formats: self.available_formats().to_vec(),
            last_error: self.last_error.clone(),
            last_record_id: self.last_record_id.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }

    fn token(&self) -> RunToken {
        RunToken {
            session_id: self.id.clone(),
            generation: self.generation,
        }
    }

    fn accepts(&self, token: &RunToken, trigger: &'static str, expected: SessionStatus) -> bool {
        if self.is_current(token) && self.status == expected {
            return true;
        }
        self.ignore(trigger);
        false
    }

    fn ignore(&self, trigger: &'static str) {
        debug!(
            session_id = %self.id,
            trigger,
            status = self.status.as_str(),
            "Ignoring event for stale or finished run"
        );
        metrics::IGNORED_TRANSITIONS
            .with_label_values(&[trigger])
            .inc();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
