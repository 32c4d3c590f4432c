//! SQLite plumbing shared by the audit and history stores.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, ToSql};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection lock poisoned")]
    Poisoned,
}

/// One connection behind a mutex; writers take turns.
pub(crate) struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens `path` (in memory when `None`) and applies `schema`.
    pub(crate) fn open(path: Option<&Path>, schema: &str) -> Result<Self, DbError> {
        let conn = match path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        conn.execute_batch(schema)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }
}

/// `WHERE` clause assembled from optional conditions, each with one `?`.
#[derive(Default)]
pub(crate) struct WhereClause {
    conditions: Vec<&'static str>,
    params: Vec<Box<dyn ToSql>>,
}

impl WhereClause {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `condition` when `value` is set.
    pub(crate) fn and<T: ToSql + 'static>(mut self, condition: &'static str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.conditions.push(condition);
            self.params.push(Box::new(value));
        }
        self
    }

    /// Empty when no condition was added.
    pub(crate) fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Condition parameters followed by `trailing` (e.g. LIMIT and OFFSET).
    pub(crate) fn params<'a>(&'a self, trailing: &[&'a dyn ToSql]) -> Vec<&'a dyn ToSql> {
        self.params
            .iter()
            .map(|p| p.as_ref())
            .chain(trailing.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_skips_unset_conditions() {
        let clause = WhereClause::new()
            .and("a = ?", Some("x".to_string()))
            .and::<String>("b = ?", None)
            .and("c >= ?", Some(3i64));

        assert_eq!(clause.sql(), "WHERE a = ? AND c >= ?");
        assert_eq!(clause.params(&[&10i64]).len(), 3);
        assert_eq!(WhereClause::new().sql(), "");
    }

    #[test]
    fn test_database_applies_schema() {
        let db = Database::open(None, "CREATE TABLE t (v INTEGER);").unwrap();
        let conn = db.lock().unwrap();
        conn.execute("INSERT INTO t (v) VALUES (?)", [7]).unwrap();

        let clause = WhereClause::new().and("v = ?", Some(7i64));
        let sql = format!("SELECT COUNT(*) FROM t {}", clause.sql());
        let count: i64 = conn
            .query_row(&sql, clause.params(&[]).as_slice(), |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
