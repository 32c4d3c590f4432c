use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{AuditError, AuditEvent, AuditFilter, AuditRecord, AuditStore};
use crate::sqlite::{Database, DbError, WhereClause};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    event_type TEXT NOT NULL,
    session_id TEXT,
    user_id TEXT,
    data TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_events_timestamp ON audit_events(timestamp);
CREATE INDEX IF NOT EXISTS idx_audit_events_session_id ON audit_events(session_id);
CREATE INDEX IF NOT EXISTS idx_audit_events_event_type ON audit_events(event_type);
CREATE INDEX IF NOT EXISTS idx_audit_events_user_id ON audit_events(user_id);
"#;

impl From<DbError> for AuditError {
    fn from(e: DbError) -> Self {
        AuditError::Database(e.to_string())
    }
}

/// id, timestamp, event_type, session_id, user_id, data
type Row = (i64, String, String, Option<String>, Option<String>, String);

/// SQLite-backed audit store
pub struct SqliteAuditStore {
    db: Database,
}

impl SqliteAuditStore {
    /// Create a new SQLite audit store, creating the database file and tables if needed
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        Ok(Self {
            db: Database::open(Some(path), SCHEMA)?,
        })
    }

    /// Create an in-memory SQLite audit store (useful for testing)
    pub fn in_memory() -> Result<Self, AuditError> {
        Ok(Self {
            db: Database::open(None, SCHEMA)?,
        })
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn into_record(row: Row) -> Result<AuditRecord, AuditError> {
        let (id, timestamp, event_type, session_id, user_id, data) = row;

        let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| AuditError::Database(format!("Invalid timestamp: {}", e)))?
            .into();
        let data: AuditEvent =
            serde_json::from_str(&data).map_err(|e| AuditError::Serialization(e.to_string()))?;

        Ok(AuditRecord {
            id,
            timestamp,
            event_type,
            session_id,
            user_id,
            data,
        })
    }

    fn where_clause(filter: &AuditFilter) -> WhereClause {
        WhereClause::new()
            .and("session_id = ?", filter.session_id.clone())
            .and("event_type = ?", filter.event_type.clone())
            .and("user_id = ?", filter.user_id.clone())
            // Service events carry no user and stay visible to everyone
            .and("(user_id = ? OR user_id IS NULL)", filter.visible_to.clone())
            .and("timestamp >= ?", filter.from.map(|t| t.to_rfc3339()))
            .and("timestamp <= ?", filter.to.map(|t| t.to_rfc3339()))
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let conn = self.db.lock()?;

        let data_json = serde_json::to_string(&record.data)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO audit_events (timestamp, event_type, session_id, user_id, data) VALUES (?, ?, ?, ?, ?)",
            params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.session_id,
                record.user_id,
                data_json,
            ],
        )
        .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let conn = self.db.lock()?;
        let clause = Self::where_clause(filter);

        // id breaks ties between events emitted within the same instant
        let sql = format!(
            "SELECT id, timestamp, event_type, session_id, user_id, data FROM audit_events {} ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
            clause.sql()
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let param_refs = clause.params(&[&filter.limit, &filter.offset]);

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::read_row)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        rows.map(|row| {
            let row = row.map_err(|e| AuditError::Database(e.to_string()))?;
            Self::into_record(row)
        })
        .collect()
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        let conn = self.db.lock()?;
        let clause = Self::where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM audit_events {}", clause.sql());

        conn.query_row(&sql, clause.params(&[]).as_slice(), |row| row.get(0))
            .map_err(|e| AuditError::Database(e.to_string()))
    }
}
