//! Session-local working ledger. Duplicates are allowed here; they are
//! filtered when the ledger is reconciled into a collection.

use crate::types::Record;

#[derive(Debug, Default, Clone)]
pub struct WorkingLedger {
    records: Vec<Record>,
}

impl WorkingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn all(&self) -> &[Record] {
        &self.records
    }

    /// Drop one working row (0-based). `None` if out of range.
    pub fn remove(&mut self, index: usize) -> Option<Record> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }

    /// Swap in rows reloaded from storage for editing.
    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
