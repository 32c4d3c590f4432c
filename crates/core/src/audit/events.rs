use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AuditEventEnvelope;

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Session lifecycle
    SessionCreated {
        session_id: String,
        user_id: String,
    },
    SessionDeleted {
        session_id: String,
        user_id: String,
        /// Status the session was in when it was dropped
        status: String,
    },
    /// Evicted by the idle sweep
    SessionExpired {
        session_id: String,
        user_id: String,
        status: String,
        freed_bytes: u64,
    },
    FileSelected {
        session_id: String,
        user_id: String,
        file_name: String,
        size_bytes: u64,
        media_type: String,
        category: String,
    },
    TargetChosen {
        session_id: String,
        user_id: String,
        target_format: String,
    },
    SessionReset {
        session_id: String,
        user_id: String,
        /// Whether an in-flight conversion was abandoned
        cancelled_run: bool,
    },

    // Conversion events
    ConversionStarted {
        session_id: String,
        user_id: String,
        file_name: String,
        source_format: String,
        target_format: String,
        size_bytes: u64,
    },
    ConversionCompleted {
        session_id: String,
        user_id: String,
        record_id: String,
        download_ref: String,
        duration_ms: u64,
    },
    ConversionFailed {
        session_id: String,
        user_id: String,
        /// Failure kind (e.g. "payload_too_large", "converter", "timed_out")
        kind: String,
        error: String,
        retryable: bool,
    },
    /// A result arrived for a run that was reset or superseded and was dropped.
    ConversionDiscarded {
        session_id: String,
        user_id: String,
        /// Phase the run had reached ("upload", "processing")
        phase: String,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::SessionCreated { .. } => "session_created",
            Self::SessionDeleted { .. } => "session_deleted",
            Self::SessionExpired { .. } => "session_expired",
            Self::FileSelected { .. } => "file_selected",
            Self::TargetChosen { .. } => "target_chosen",
            Self::SessionReset { .. } => "session_reset",
            Self::ConversionStarted { .. } => "conversion_started",
            Self::ConversionCompleted { .. } => "conversion_completed",
            Self::ConversionFailed { .. } => "conversion_failed",
            Self::ConversionDiscarded { .. } => "conversion_discarded",
        }
    }

    /// Extract session_id if this event is session-related
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::SessionCreated { session_id, .. }
            | Self::SessionDeleted { session_id, .. }
            | Self::SessionExpired { session_id, .. }
            | Self::FileSelected { session_id, .. }
            | Self::TargetChosen { session_id, .. }
            | Self::SessionReset { session_id, .. }
            | Self::ConversionStarted { session_id, .. }
            | Self::ConversionCompleted { session_id, .. }
            | Self::ConversionFailed { session_id, .. }
            | Self::ConversionDiscarded { session_id, .. } => Some(session_id),
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }

    /// Extract user_id if this event was triggered on behalf of a user
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::SessionCreated { user_id, .. }
            | Self::SessionDeleted { user_id, .. }
            | Self::SessionExpired { user_id, .. }
            | Self::FileSelected { user_id, .. }
            | Self::TargetChosen { user_id, .. }
            | Self::SessionReset { user_id, .. }
            | Self::ConversionStarted { user_id, .. }
            | Self::ConversionCompleted { user_id, .. }
            | Self::ConversionFailed { user_id, .. }
            | Self::ConversionDiscarded { user_id, .. } => Some(user_id),
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}

impl AuditRecord {
    /// Record for an emitted event; `id` is 0 until the store assigns one.
    pub fn from_envelope(envelope: AuditEventEnvelope) -> Self {
        Self {
            id: 0,
            timestamp: envelope.timestamp,
            event_type: envelope.event.event_type().to_string(),
            session_id: envelope.event.session_id().map(String::from),
            user_id: envelope.event.user_id().map(String::from),
            data: envelope.event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_service_started() {
        let event = AuditEvent::ServiceStarted {
            version: "0.1.0".to_string(),
            config_hash: "abc123".to_string(),
        };
        assert_eq!(event.event_type(), "service_started");
        assert_eq!(event.session_id(), None);
        assert_eq!(event.user_id(), None);
    }

    #[test]
    fn test_event_type_file_selected() {
        let event = AuditEvent::FileSelected {
            session_id: "s-1".to_string(),
            user_id: "alice".to_string(),
            file_name: "report.pdf".to_string(),
            size_bytes: 2048,
            media_type: "application/pdf".to_string(),
            category: "document".to_string(),
        };
        assert_eq!(event.event_type(), "file_selected");
        assert_eq!(event.session_id(), Some("s-1"));
        assert_eq!(event.user_id(), Some("alice"));
    }

    #[test]
    fn test_event_type_session_expired() {
        let event = AuditEvent::SessionExpired {
            session_id: "s-3".to_string(),
            user_id: "carol".to_string(),
            status: "idle".to_string(),
            freed_bytes: 4096,
        };
        assert_eq!(event.event_type(), "session_expired");
        assert_eq!(event.user_id(), Some("carol"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_expired");
        assert_eq!(json["freed_bytes"], 4096);
    }

    #[test]
    fn test_event_type_conversion_discarded() {
        let event = AuditEvent::ConversionDiscarded {
            session_id: "s-2".to_string(),
            user_id: "bob".to_string(),
            phase: "processing".to_string(),
        };
        assert_eq!(event.event_type(), "conversion_discarded");
        assert_eq!(event.session_id(), Some("s-2"));
    }

    #[test]
    fn test_serialize_deserialize_conversion_failed() {
        let event = AuditEvent::ConversionFailed {
            session_id: "s-3".to_string(),
            user_id: "alice".to_string(),
            kind: "converter".to_string(),
            error: "Unsupported conversion from png to svg".to_string(),
            retryable: false,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"conversion_failed\""));

        let parsed: AuditEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            AuditEvent::ConversionFailed {
                kind, retryable, ..
            } => {
                assert_eq!(kind, "converter");
                assert!(!retryable);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_audit_record_serialize() {
        let record = AuditRecord {
            id: 1,
            timestamp: Utc::now(),
            event_type: "session_created".to_string(),
            session_id: Some("s-4".to_string()),
            user_id: Some("alice".to_string()),
            data: AuditEvent::SessionCreated {
                session_id: "s-4".to_string(),
                user_id: "alice".to_string(),
            },
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"event_type\":\"session_created\""));
        assert!(json.contains("\"session_id\":\"s-4\""));
    }
}
