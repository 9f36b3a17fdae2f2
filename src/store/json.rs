//! Single JSON document holding every collection. A missing file is an empty
//! store. Writes go to a sibling temp file that is renamed into place,
//! so a failed append leaves the previous document intact.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RecordStore;
use crate::error::StoreError;
use crate::types::StoredRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDoc {
    collections: BTreeMap<String, Vec<StoredRecord>>,
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_doc(&self) -> Result<LedgerDoc, StoreError> {
        if !self.path.exists() {
            return Ok(LedgerDoc::default());
        }
        let s = fs::read_to_string(&self.path)?;
        if s.trim().is_empty() {
            return Ok(LedgerDoc::default());
        }
        serde_json::from_str(&s)
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    fn write_doc(&self, doc: &LedgerDoc) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let s = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, s)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!("ledger document written to {}", self.path.display());
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn read_all(&self, collection: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let mut doc = self.read_doc()?;
        Ok(doc.collections.remove(collection).unwrap_or_default())
    }

    fn append_batch(&self, collection: &str, rows: &[StoredRecord]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut doc = self.read_doc()?;
        doc.collections
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(rows);
        self.write_doc(&doc)?;
        Ok(rows.len())
    }

    fn list_names(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.read_doc()?.collections.into_keys().collect())
    }
}
