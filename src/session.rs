//! One operator session: the selected exchange plus its working ledger.
//! Switching exchange invalidates the ledger because the ticker universe
//! changes with it.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{ReconcileError, StoreError, ValidationError};
use crate::ledger::WorkingLedger;
use crate::reconcile::{reconcile, ReconcileReport};
use crate::store::{load, RecordStore};
use crate::types::{Exchange, HighPrice, Record};
use crate::utils::sanitize_symbol;

pub struct Session {
    exchange: Exchange,
    ledger: WorkingLedger,
    listings: BTreeMap<Exchange, Vec<String>>,
    started_at: DateTime<Local>,
}

impl Session {
    pub fn create(exchange: Exchange) -> Self {
        Self::with_listings(exchange, BTreeMap::new())
    }

    pub fn with_listings(exchange: Exchange, listings: BTreeMap<Exchange, Vec<String>>) -> Self {
        let listings = listings
            .into_iter()
            .map(|(ex, syms)| (ex, syms.iter().map(|s| sanitize_symbol(s)).collect()))
            .collect();
        info!("session started on {}", exchange);
        Self {
            exchange,
            ledger: WorkingLedger::new(),
            listings,
            started_at: Local::now(),
        }
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn ledger(&self) -> &WorkingLedger {
        &self.ledger
    }

    /// Returns true when the selection changed and the ledger was reset.
    pub fn select_exchange(&mut self, exchange: Exchange) -> bool {
        if exchange == self.exchange {
            return false;
        }
        if !self.ledger.is_empty() {
            warn!(
                "switching {} -> {}: discarding {} working row(s)",
                self.exchange,
                exchange,
                self.ledger.len()
            );
        }
        self.exchange = exchange;
        self.ledger.reset();
        true
    }

    /// Tickers accepted on the active exchange; empty means unrestricted.
    pub fn listing(&self) -> &[String] {
        self.listings
            .get(&self.exchange)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn add(
        &mut self,
        ticker: &str,
        cost_price: Decimal,
        high_price: HighPrice,
        as_of_date: NaiveDate,
    ) -> Result<&Record, ValidationError> {
        let record = Record::new(ticker, cost_price, high_price, as_of_date)?;
        let listing = self.listing();
        if !listing.is_empty() && !listing.contains(&record.ticker) {
            return Err(ValidationError::NotListed {
                ticker: record.ticker,
                exchange: self.exchange.to_string(),
            });
        }
        self.ledger.append(record);
        Ok(&self.ledger.all()[self.ledger.len() - 1])
    }

    /// 1-based, as shown to the operator.
    pub fn remove(&mut self, position: usize) -> Option<Record> {
        position
            .checked_sub(1)
            .and_then(|idx| self.ledger.remove(idx))
    }

    /// Reconcile the working rows into `collection`. The ledger is kept either way.
    pub fn save<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        collection: &str,
    ) -> Result<ReconcileReport, ReconcileError> {
        reconcile(store, collection, self.ledger.all())
    }

    /// Replace the working rows with what `collection` holds. Returns the row count.
    pub fn load_for_edit<S: RecordStore + ?Sized>(
        &mut self,
        store: &S,
        collection: &str,
    ) -> Result<usize, StoreError> {
        let records = load(store, collection)?;
        let n = records.len();
        self.ledger.replace_all(records);
        Ok(n)
    }

    pub fn end(self) {
        let age = Local::now() - self.started_at;
        info!(
            "session on {} ended after {}s with {} working row(s)",
            self.exchange,
            age.num_seconds(),
            self.ledger.len()
        );
    }
}
