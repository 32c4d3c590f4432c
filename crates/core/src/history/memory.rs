use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::{HistoryError, HistoryFilter, HistoryRecord, HistoryStore};

#[derive(Default)]
struct Records {
    newest_first: VecDeque<HistoryRecord>,
    ids: HashSet<String>,
}

/// In-process history store. Contents are lost on restart.
///
/// Ids are indexed next to the records, so `append` and `find` misses stay
/// constant time however long the history grows.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Records>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, Records>, HistoryError> {
        self.records
            .lock()
            .map_err(|_| HistoryError::Database("history lock poisoned".to_string()))
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        let mut records = self.records()?;
        if !records.ids.insert(record.id.clone()) {
            return Err(HistoryError::DuplicateId(record.id.clone()));
        }
        records.newest_first.push_front(record.clone());
        Ok(())
    }

    fn list(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>, HistoryError> {
        let records = self.records()?;
        Ok(records
            .newest_first
            .iter()
            .filter(|r| filter.matches(r))
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn find(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        let records = self.records()?;
        if !records.ids.contains(id) {
            return Ok(None);
        }
        Ok(records.newest_first.iter().find(|r| r.id == id).cloned())
    }

    fn count(&self, filter: &HistoryFilter) -> Result<usize, HistoryError> {
        let records = self.records()?;
        if filter.requested_by.is_none() {
            return Ok(records.ids.len());
        }
        Ok(records
            .newest_first
            .iter()
            .filter(|r| filter.matches(r))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_append_inserts_at_front() {
        let store = MemoryHistoryStore::new();
        store.append(&fixtures::history_record("first", "alice")).unwrap();
        store.append(&fixtures::history_record("second", "alice")).unwrap();

        let records = store.list(&HistoryFilter::new()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "second");
        assert_eq!(records[1].id, "first");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = MemoryHistoryStore::new();
        let record = fixtures::history_record("same", "alice");
        store.append(&record).unwrap();

        let result = store.append(&record);
        assert!(matches!(result, Err(HistoryError::DuplicateId(_))));
        assert_eq!(store.count(&HistoryFilter::new()).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_rejected_after_many_appends() {
        let store = MemoryHistoryStore::new();
        for i in 0..5_000 {
            store
                .append(&fixtures::history_record(&format!("r{}", i), "alice"))
                .unwrap();
        }

        let oldest = fixtures::history_record("r0", "bob");
        assert!(matches!(
            store.append(&oldest),
            Err(HistoryError::DuplicateId(id)) if id == "r0"
        ));
        assert_eq!(store.count(&HistoryFilter::new()).unwrap(), 5_000);
        assert_eq!(
            store.count(&HistoryFilter::new().with_requested_by("bob")).unwrap(),
            0
        );
        assert_eq!(store.find("r0").unwrap().unwrap().requested_by, "alice");
    }

    #[test]
    fn test_filter_by_user_with_paging() {
        let store = MemoryHistoryStore::new();
        for i in 0..5 {
            store
                .append(&fixtures::history_record(&format!("a{}", i), "alice"))
                .unwrap();
            store
                .append(&fixtures::history_record(&format!("b{}", i), "bob"))
                .unwrap();
        }

        let filter = HistoryFilter::new().with_requested_by("alice");
        assert_eq!(store.count(&filter).unwrap(), 5);

        let page = store.list(&filter.with_offset(1).with_limit(2)).unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a3", "a2"]);
    }

    #[test]
    fn test_find() {
        let store = MemoryHistoryStore::new();
        store.append(&fixtures::history_record("x", "alice")).unwrap();

        assert_eq!(store.find("x").unwrap().unwrap().id, "x");
        assert!(store.find("missing").unwrap().is_none());
    }
}
