//! Append-only reconciliation of candidate records into a named collection.
//!
//! Only candidates whose identity key is absent from the collection (and not
//! already seen earlier in the same batch) are written. Existing rows are never
//! updated or deleted. The read-then-append is not atomic against a concurrent
//! writer; backends that need that guarantee enforce it themselves.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::ReconcileError;
use crate::store::{collection_name, RecordStore};
use crate::types::{Record, StoredRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Rows actually appended.
    pub written: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

impl ReconcileReport {
    pub fn nothing_new(&self) -> bool {
        self.written == 0
    }
}

pub fn reconcile<S: RecordStore + ?Sized>(
    store: &S,
    collection_name: &str,
    candidates: &[Record],
) -> Result<ReconcileReport, ReconcileError> {
    reconcile_at(store, collection_name, candidates, Utc::now())
}

pub fn reconcile_at<S: RecordStore + ?Sized>(
    store: &S,
    name: &str,
    candidates: &[Record],
    written_at: DateTime<Utc>,
) -> Result<ReconcileReport, ReconcileError> {
    let Some(collection) = collection_name(name) else {
        return Err(ReconcileError::InvalidCollection);
    };

    let persisted = store.read_all(collection)?;
    let mut seen: HashSet<_> = persisted.iter().map(StoredRecord::identity_key).collect();

    let mut report = ReconcileReport::default();
    let mut fresh = Vec::new();
    for cand in candidates {
        if let Err(e) = cand.validate() {
            warn!("rejecting candidate {:?}: {}", cand.ticker, e);
            report.rejected += 1;
            continue;
        }
        if !seen.insert(cand.identity_key()) {
            report.duplicates += 1;
            continue;
        }
        fresh.push(StoredRecord::new(collection, cand.clone(), written_at));
    }

    if !fresh.is_empty() {
        report.written = store.append_batch(collection, &fresh)?;
    }
    info!(
        "reconciled '{}': written={}, duplicates={}, rejected={}",
        collection, report.written, report.duplicates, report.rejected
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{load, MemoryStore, SqliteStore};
    use crate::types::HighPrice;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn rec(t: &str, cost: Decimal, high: Decimal) -> Record {
        let d = NaiveDate::from_ymd_opt(2024, 8, 16).unwrap();
        Record::new(t, cost, HighPrice::Observed(high), d).unwrap()
    }

    fn keys(rows: &[Record]) -> Vec<(String, Decimal)> {
        rows.iter().map(|r| (r.ticker.clone(), r.cost_price)).collect()
    }

    /// Storage that cannot be reached for anything.
    struct Offline;

    impl RecordStore for Offline {
        fn read_all(&self, _: &str) -> Result<Vec<StoredRecord>, StoreError> {
            Err(StoreError::Unreachable("connection refused".into()))
        }
        fn append_batch(&self, _: &str, _: &[StoredRecord]) -> Result<usize, StoreError> {
            Err(StoreError::Unreachable("connection refused".into()))
        }
        fn list_names(&self) -> Result<BTreeSet<String>, StoreError> {
            Err(StoreError::Unreachable("connection refused".into()))
        }
    }

    /// Reads succeed, writes fail.
    struct ReadOnly(MemoryStore);

    impl RecordStore for ReadOnly {
        fn read_all(&self, c: &str) -> Result<Vec<StoredRecord>, StoreError> {
            self.0.read_all(c)
        }
        fn append_batch(&self, _: &str, _: &[StoredRecord]) -> Result<usize, StoreError> {
            Err(StoreError::Unreachable("disk full".into()))
        }
        fn list_names(&self) -> Result<BTreeSet<String>, StoreError> {
            self.0.list_names()
        }
    }

    #[test]
    fn batch_duplicates_collapse_to_first() {
        let store = MemoryStore::new();
        let cands = [rec("ACB", dec!(10), dec!(12)), rec("ACB", dec!(10), dec!(12))];
        let report = reconcile(&store, "picks", &cands).unwrap();
        assert_eq!(report, ReconcileReport { written: 1, duplicates: 1, rejected: 0 });

        let stored = load(&store, "picks").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].identity_key(), cands[0].identity_key());
    }

    #[test]
    fn only_unseen_keys_are_appended() {
        let store = MemoryStore::new();
        reconcile(&store, "picks", &[rec("ACB", dec!(10), dec!(12))]).unwrap();
        let before = store.read_all("picks").unwrap();

        let cands = [rec("ACB", dec!(10), dec!(12)), rec("VNM", dec!(50), dec!(55))];
        let report = reconcile(&store, "picks", &cands).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.duplicates, 1);

        let after = store.read_all("picks").unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1].record.ticker, "VNM");
    }

    #[test]
    fn second_run_writes_nothing() {
        let store = MemoryStore::new();
        let cands = [
            rec("ACB", dec!(10), dec!(12)),
            rec("VNM", dec!(50), dec!(55)),
            rec("FPT", dec!(90), dec!(91)),
        ];
        assert_eq!(reconcile(&store, "picks", &cands).unwrap().written, 3);
        let second = reconcile(&store, "picks", &cands).unwrap();
        assert!(second.nothing_new());
        assert_eq!(second.duplicates, 3);
        assert_eq!(store.read_all("picks").unwrap().len(), 3);
    }

    #[test]
    fn first_occurrence_order_is_kept() {
        let store = MemoryStore::new();
        let cands = [
            rec("VNM", dec!(50), dec!(55)),
            rec("ACB", dec!(10), dec!(12)),
            rec("VNM", dec!(50), dec!(55)),
            rec("HPG", dec!(20), dec!(21)),
            rec("ACB", dec!(10), dec!(12)),
        ];
        reconcile(&store, "picks", &cands).unwrap();
        let stored = load(&store, "picks").unwrap();
        assert_eq!(
            keys(&stored),
            [
                ("VNM".to_string(), dec!(50)),
                ("ACB".to_string(), dec!(10)),
                ("HPG".to_string(), dec!(20)),
            ]
        );
    }

    #[test]
    fn date_is_not_part_of_identity() {
        let store = MemoryStore::new();
        let a = rec("ACB", dec!(10), dec!(12));
        let later = Record {
            as_of_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            ..a.clone()
        };
        reconcile(&store, "picks", &[a]).unwrap();
        assert_eq!(reconcile(&store, "picks", &[later]).unwrap().written, 0);
    }

    #[test]
    fn collections_do_not_share_keys() {
        let store = MemoryStore::new();
        let cands = [rec("ACB", dec!(10), dec!(12))];
        assert_eq!(reconcile(&store, "a", &cands).unwrap().written, 1);
        assert_eq!(reconcile(&store, "b", &cands).unwrap().written, 1);
    }

    #[test]
    fn malformed_candidate_is_skipped_rest_proceed() {
        let store = MemoryStore::new();
        let mut bad = rec("ACB", dec!(10), dec!(12));
        bad.ticker = "   ".into();
        let mut negative = rec("HPG", dec!(10), dec!(12));
        negative.cost_price = dec!(-3);
        let cands = [bad, rec("VNM", dec!(50), dec!(55)), negative];

        let report = reconcile(&store, "picks", &cands).unwrap();
        assert_eq!(report, ReconcileReport { written: 1, duplicates: 0, rejected: 2 });
        assert_eq!(load(&store, "picks").unwrap()[0].ticker, "VNM");
    }

    #[test]
    fn empty_inputs() {
        let store = MemoryStore::new();
        assert!(matches!(
            reconcile(&store, "  ", &[rec("ACB", dec!(1), dec!(2))]),
            Err(ReconcileError::InvalidCollection)
        ));
        let report = reconcile(&store, "picks", &[]).unwrap();
        assert_eq!(report, ReconcileReport::default());
        assert!(store.list_names().unwrap().is_empty());
    }

    #[test]
    fn rows_are_tagged_with_write_time_and_collection() {
        let store = MemoryStore::new();
        let at = DateTime::parse_from_rfc3339("2024-08-16T09:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        reconcile_at(&store, " picks ", &[rec("ACB", dec!(100), dec!(120))], at).unwrap();
        let row = &store.read_all("picks").unwrap()[0];
        assert_eq!(row.written_at, at);
        assert_eq!(row.collection, "picks");
        assert_eq!(row.profit, crate::profit::Profit::Ratio(dec!(0.2)));
    }

    #[test]
    fn unreachable_storage_writes_nothing() {
        let cands = vec![rec("ACB", dec!(10), dec!(12))];
        let err = reconcile(&Offline, "picks", &cands).unwrap_err();
        assert!(matches!(err, ReconcileError::Storage(StoreError::Unreachable(_))));
        assert_eq!(cands.len(), 1);

        let store = ReadOnly(MemoryStore::new());
        assert!(reconcile(&store, "picks", &cands).is_err());
        assert!(store.read_all("picks").unwrap().is_empty());
    }

    #[test]
    fn works_against_sqlite() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("ledger.sqlite3")).unwrap();
        let cands = [rec("ACB", dec!(10), dec!(12)), rec("ACB", dec!(10.0), dec!(12.00))];
        assert_eq!(reconcile(&store, "picks", &cands).unwrap().written, 1);
        assert_eq!(reconcile(&store, "picks", &cands).unwrap().written, 0);
    }

    #[test]
    fn raw_ticker_is_stored_canonical_and_deduped_in_sqlite() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("ledger.sqlite3")).unwrap();
        let raw = Record { ticker: "acb ".into(), ..rec("ACB", dec!(10), dec!(12)) };
        assert_eq!(reconcile(&store, "picks", &[raw.clone()]).unwrap().written, 1);
        assert_eq!(load(&store, "picks").unwrap()[0].ticker, "ACB");

        let report = reconcile(&store, "picks", &[raw, rec("ACB", dec!(10), dec!(12))]).unwrap();
        assert_eq!(report.written, 0);
        assert_eq!(report.duplicates, 2);
        assert_eq!(store.read_all("picks").unwrap().len(), 1);
    }

    #[test]
    fn padded_name_saves_and_loads_same_collection() {
        let store = MemoryStore::new();
        reconcile(&store, " picks ", &[rec("ACB", dec!(10), dec!(12))]).unwrap();
        assert_eq!(load(&store, " picks ").unwrap().len(), 1);
        assert_eq!(load(&store, "picks").unwrap().len(), 1);
        assert!(load(&store, "   ").unwrap().is_empty());
    }
}
