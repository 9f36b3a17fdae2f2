//! SQLite backend. A connection is opened per read or per batch and dropped on
//! every exit path. Prices are stored as canonical decimal text so identity
//! comparisons stay exact; profit is stored as a ratio (NULL when undefined).
//!
//! The unique index on the identity triple guards against a second writer
//! reconciling the same collection from a stale read.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use tracing::warn;

use super::RecordStore;
use crate::error::StoreError;
use crate::profit::Profit;
use crate::types::{normalize_price, HighPrice, Record, StoredRecord};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    written_at  TEXT NOT NULL,
    collection  TEXT NOT NULL,
    ticker      TEXT NOT NULL,
    cost_price  TEXT NOT NULL,
    high_price  TEXT,
    profit      TEXT,
    as_of_date  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
CREATE UNIQUE INDEX IF NOT EXISTS ux_records_identity
    ON records(collection, ticker, cost_price, COALESCE(high_price, ''));
"#;

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Create the database file and schema if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self { path };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Connection::open(&self.path)
            .map_err(|e| StoreError::Unreachable(format!("{}: {}", self.path.display(), e)))
    }
}

fn parse_decimal(col: &str, s: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(s).map_err(|e| StoreError::Corrupt(format!("{col}={s}: {e}")))
}

struct RawRow {
    written_at: String,
    collection: String,
    ticker: String,
    cost_price: String,
    high_price: Option<String>,
    profit: Option<String>,
    as_of_date: String,
}

impl RawRow {
    fn decode(self) -> Result<StoredRecord, StoreError> {
        let written_at = DateTime::parse_from_rfc3339(&self.written_at)
            .map_err(|e| StoreError::Corrupt(format!("written_at={}: {}", self.written_at, e)))?
            .with_timezone(&Utc);
        let as_of_date = NaiveDate::parse_from_str(&self.as_of_date, "%Y-%m-%d")
            .map_err(|e| StoreError::Corrupt(format!("as_of_date={}: {}", self.as_of_date, e)))?;
        let high_price = match self.high_price.as_deref() {
            Some(h) => HighPrice::Observed(parse_decimal("high_price", h)?),
            None => HighPrice::Unavailable,
        };
        let profit = match self.profit.as_deref() {
            Some(p) => Profit::Ratio(parse_decimal("profit", p)?),
            None => Profit::Undefined,
        };
        Ok(StoredRecord {
            written_at,
            collection: self.collection,
            record: Record {
                ticker: self.ticker,
                cost_price: parse_decimal("cost_price", &self.cost_price)?,
                high_price,
                as_of_date,
            },
            profit,
        })
    }
}

impl RecordStore for SqliteStore {
    fn read_all(&self, collection: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT written_at, collection, ticker, cost_price, high_price, profit, as_of_date
             FROM records WHERE collection = ?1 ORDER BY id",
        )?;
        let raw = stmt
            .query_map([collection], |row| {
                Ok(RawRow {
                    written_at: row.get(0)?,
                    collection: row.get(1)?,
                    ticker: row.get(2)?,
                    cost_price: row.get(3)?,
                    high_price: row.get(4)?,
                    profit: row.get(5)?,
                    as_of_date: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(RawRow::decode).collect()
    }

    fn append_batch(&self, collection: &str, rows: &[StoredRecord]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO records
                 (written_at, collection, ticker, cost_price, high_price, profit, as_of_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                let r = &row.record;
                let profit = match row.profit {
                    Profit::Ratio(p) => Some(p.to_string()),
                    Profit::Undefined => None,
                };
                written += stmt.execute(params![
                    row.written_at.to_rfc3339(),
                    collection,
                    r.ticker,
                    normalize_price(r.cost_price),
                    r.high_price.value().map(normalize_price),
                    profit,
                    r.as_of_date.format("%Y-%m-%d").to_string(),
                ])?;
            }
        }
        tx.commit()?;
        if written < rows.len() {
            warn!(
                "{} row(s) for '{}' already present at storage level, skipped",
                rows.len() - written,
                collection
            );
        }
        Ok(written)
    }

    fn list_names(&self) -> Result<BTreeSet<String>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT DISTINCT collection FROM records")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(names)
    }
}
