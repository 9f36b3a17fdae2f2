//! In-memory store for tests and throwaway sessions.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use super::RecordStore;
use crate::error::StoreError;
use crate::types::StoredRecord;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Vec<StoredRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn read_all(&self, collection: &str) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn append_batch(&self, collection: &str, rows: &[StoredRecord]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(rows);
        Ok(rows.len())
    }

    fn list_names(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.collections.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HighPrice, Record};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn row(coll: &str, t: &str) -> StoredRecord {
        let d = NaiveDate::from_ymd_opt(2024, 8, 16).unwrap();
        let r = Record::new(t, dec!(10), HighPrice::Observed(dec!(12)), d).unwrap();
        StoredRecord::new(coll, r, Utc::now())
    }

    #[test]
    fn collections_are_independent() {
        let store = MemoryStore::new();
        store.append_batch("a", &[row("a", "ACB")]).unwrap();
        store.append_batch("b", &[row("b", "VNM"), row("b", "FPT")]).unwrap();

        assert_eq!(store.read_all("a").unwrap().len(), 1);
        assert_eq!(store.read_all("b").unwrap().len(), 2);
        assert!(store.read_all("missing").unwrap().is_empty());
        let names: Vec<String> = store.list_names().unwrap().into_iter().collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn empty_batch_creates_nothing() {
        let store = MemoryStore::new();
        assert_eq!(store.append_batch("a", &[]).unwrap(), 0);
        assert!(store.list_names().unwrap().is_empty());
    }
}
