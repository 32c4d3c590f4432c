use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{HistoryError, HistoryFilter, HistoryRecord, HistoryStore};
use crate::catalog::Category;
use crate::sqlite::{Database, DbError, WhereClause};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conversion_history (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    original_name TEXT NOT NULL,
    original_format TEXT NOT NULL,
    converted_format TEXT NOT NULL,
    category TEXT NOT NULL,
    requested_by TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    download_ref TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conversion_history_requested_by ON conversion_history(requested_by);
"#;

const COLUMNS: &str = "id, original_name, original_format, converted_format, category, requested_by, timestamp, download_ref";

type Row = (String, String, String, String, String, String, String, String);

impl From<DbError> for HistoryError {
    fn from(e: DbError) -> Self {
        HistoryError::Database(e.to_string())
    }
}

/// SQLite-backed history store. Order is kept by an insertion sequence column.
pub struct SqliteHistoryStore {
    db: Database,
}

impl SqliteHistoryStore {
    /// Open the database file, creating it and its table if needed
    pub fn new(path: &Path) -> Result<Self, HistoryError> {
        Ok(Self {
            db: Database::open(Some(path), SCHEMA)?,
        })
    }

    /// Create an in-memory SQLite history store (useful for testing)
    pub fn in_memory() -> Result<Self, HistoryError> {
        Ok(Self {
            db: Database::open(None, SCHEMA)?,
        })
    }

    fn where_clause(filter: &HistoryFilter) -> WhereClause {
        WhereClause::new().and("requested_by = ?", filter.requested_by.clone())
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
        ))
    }

    fn into_record(row: Row) -> Result<HistoryRecord, HistoryError> {
        let (
            id,
            original_name,
            original_format,
            converted_format,
            category,
            requested_by,
            timestamp,
            download_ref,
        ) = row;

        let category: Category = category.parse().map_err(|e: crate::catalog::UnknownCategory| {
            HistoryError::Corrupt {
                id: id.clone(),
                reason: e.to_string(),
            }
        })?;

        let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| HistoryError::Corrupt {
                id: id.clone(),
                reason: format!("Invalid timestamp: {}", e),
            })?
            .into();

        Ok(HistoryRecord {
            id,
            original_name,
            original_format,
            converted_format,
            category,
            requested_by,
            timestamp,
            download_ref,
        })
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        let conn = self.db.lock()?;

        let result = conn.execute(
            &format!(
                "INSERT INTO conversion_history ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                COLUMNS
            ),
            params![
                record.id,
                record.original_name,
                record.original_format,
                record.converted_format,
                record.category.as_str(),
                record.requested_by,
                record.timestamp.to_rfc3339(),
                record.download_ref,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(HistoryError::DuplicateId(record.id.clone()))
            }
            Err(e) => Err(HistoryError::Database(e.to_string())),
        }
    }

    fn list(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, HistoryError> {
        let conn = self.db.lock()?;

        let clause = Self::where_clause(filter);

        let sql = format!(
            "SELECT {} FROM conversion_history {} ORDER BY seq DESC LIMIT ? OFFSET ?",
            COLUMNS,
            clause.sql()
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        // SQLite treats a negative LIMIT as no limit
        let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);
        let offset = filter.offset as i64;
        let param_refs = clause.params(&[&limit, &offset]);

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::read_row)
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row_result in rows {
            let row = row_result.map_err(|e| HistoryError::Database(e.to_string()))?;
            records.push(Self::into_record(row)?);
        }

        Ok(records)
    }

    fn find(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        let conn = self.db.lock()?;

        let row = conn
            .query_row(
                &format!("SELECT {} FROM conversion_history WHERE id = ?", COLUMNS),
                params![id],
                Self::read_row,
            )
            .optional()
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        row.map(Self::into_record).transpose()
    }

    fn count(&self, filter: &HistoryFilter) -> Result<usize, HistoryError> {
        let conn = self.db.lock()?;

        let clause = Self::where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM conversion_history {}", clause.sql());

        let count: i64 = conn
            .query_row(&sql, clause.params(&[]).as_slice(), |row| row.get(0))
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use chrono::Duration;

    fn create_test_store() -> SqliteHistoryStore {
        SqliteHistoryStore::in_memory().unwrap()
    }

    #[test]
    fn test_append_and_list() {
        let store = create_test_store();
        let record = fixtures::history_record("rec-1", "alice");
        store.append(&record).unwrap();

        let records = store.list(&HistoryFilter::new()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], record);
    }

    #[test]
    fn test_order_is_by_insertion_not_timestamp() {
        let store = create_test_store();

        // Later insert carries an older timestamp
        let newer = fixtures::history_record("first", "alice");
        let mut older = fixtures::history_record("second", "alice");
        older.timestamp = newer.timestamp - Duration::hours(1);

        store.append(&newer).unwrap();
        store.append(&older).unwrap();

        let ids: Vec<_> = store
            .list(&HistoryFilter::new())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["second", "first"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = create_test_store();
        let record = fixtures::history_record("dup", "alice");
        store.append(&record).unwrap();

        assert!(matches!(
            store.append(&record),
            Err(HistoryError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_filter_and_count() {
        let store = create_test_store();
        store.append(&fixtures::history_record("a1", "alice")).unwrap();
        store.append(&fixtures::history_record("b1", "bob")).unwrap();
        store.append(&fixtures::history_record("a2", "alice")).unwrap();

        let filter = HistoryFilter::new().with_requested_by("alice");
        assert_eq!(store.count(&filter).unwrap(), 2);
        assert_eq!(store.count(&HistoryFilter::new()).unwrap(), 3);

        let records = store.list(&filter.with_limit(1)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a2");
    }

    #[test]
    fn test_find() {
        let store = create_test_store();
        store.append(&fixtures::history_record("rec-9", "alice")).unwrap();

        let found = store.find("rec-9").unwrap().unwrap();
        assert_eq!(found.original_name, "report.pdf");
        assert!(store.find("nope").unwrap().is_none());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = SqliteHistoryStore::new(&path).unwrap();
            store.append(&fixtures::history_record("kept", "alice")).unwrap();
        }

        let store = SqliteHistoryStore::new(&path).unwrap();
        assert_eq!(store.find("kept").unwrap().unwrap().id, "kept");
    }
}
