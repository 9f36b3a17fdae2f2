//! Persistence contract for named collections, with SQLite, JSON-file and
//! in-memory backends.
//!
//! Every backend must make `append_batch` all-or-nothing: either the whole
//! batch lands or none of it does. Reads return rows in write order.

mod json;
mod memory;
mod sqlite;

use std::collections::BTreeSet;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{StoreBackend, StoreCfg};
use crate::error::StoreError;
use crate::types::{Record, StoredRecord};

pub trait RecordStore {
    /// All rows of `collection`, oldest first. Unknown collection is empty.
    fn read_all(&self, collection: &str) -> Result<Vec<StoredRecord>, StoreError>;

    /// Append `rows` to `collection`. Returns the number of rows written.
    fn append_batch(&self, collection: &str, rows: &[StoredRecord]) -> Result<usize, StoreError>;

    fn list_names(&self) -> Result<BTreeSet<String>, StoreError>;
}

/// Canonical collection name: surrounding whitespace dropped, `None` if blank.
pub fn collection_name(name: &str) -> Option<&str> {
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

/// Records of a collection, without storage metadata. A blank name has none.
pub fn load<S: RecordStore + ?Sized>(
    store: &S,
    collection: &str,
) -> Result<Vec<Record>, StoreError> {
    let Some(collection) = collection_name(collection) else {
        return Ok(Vec::new());
    };
    Ok(store
        .read_all(collection)?
        .into_iter()
        .map(|row| row.record)
        .collect())
}

pub fn list_collection_names<S: RecordStore + ?Sized>(
    store: &S,
) -> Result<BTreeSet<String>, StoreError> {
    store.list_names()
}

/// Build the backend named in config.
pub fn open(cfg: &StoreCfg) -> Result<Box<dyn RecordStore>, StoreError> {
    let store: Box<dyn RecordStore> = match cfg.backend {
        StoreBackend::Sqlite => Box::new(SqliteStore::open(cfg.resolved_path("ledger.sqlite3"))?),
        StoreBackend::Json => Box::new(JsonFileStore::new(cfg.resolved_path("ledger.json"))),
        StoreBackend::Memory => Box::new(MemoryStore::new()),
    };
    Ok(store)
}
