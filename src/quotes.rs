//! Day-high lookups. The provider answers `Unavailable` when it has no bar for
//! the date; an `Err` means it could not be reached at all.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::QuoteError;
use crate::types::HighPrice;
use crate::utils::sanitize_symbol;

pub trait MarketData: Send + Sync {
    fn day_high(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<HighPrice, QuoteError>> + Send;
}

/// Daily highs from a JSON file shaped `{ "2024-08-16": { "ACB": 12.5 } }`.
/// Re-read on every lookup so an external feed can keep rewriting it.
pub struct FileQuotes {
    path: PathBuf,
}

impl FileQuotes {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

type DailyHighs = BTreeMap<NaiveDate, BTreeMap<String, Decimal>>;

impl MarketData for FileQuotes {
    async fn day_high(&self, ticker: &str, date: NaiveDate) -> Result<HighPrice, QuoteError> {
        let s = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| QuoteError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        let highs: DailyHighs = serde_json::from_str(&s)
            .map_err(|e| QuoteError::BadData(format!("{}: {}", self.path.display(), e)))?;
        let sym = sanitize_symbol(ticker);
        Ok(highs
            .get(&date)
            .and_then(|day| day.get(&sym))
            .copied()
            .into())
    }
}

#[derive(Default)]
struct Memo {
    day: Option<NaiveDate>,
    entries: HashMap<(String, NaiveDate), (HighPrice, Instant)>,
}

/// Memo over another provider keyed by `(ticker, date)`. Entries expire after
/// `ttl`, and the whole memo is dropped when the local date rolls over.
/// Failed lookups are not cached.
pub struct CachedQuotes<M> {
    inner: M,
    ttl: Duration,
    memo: Mutex<Memo>,
}

impl<M: MarketData> CachedQuotes<M> {
    pub fn new(inner: M, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            memo: Mutex::new(Memo::default()),
        }
    }

    pub fn evict_stale(&self, today: NaiveDate) {
        let mut memo = self.memo.lock();
        if memo.day != Some(today) {
            if !memo.entries.is_empty() {
                debug!("quote cache: new day {}, dropping {} entries", today, memo.entries.len());
            }
            memo.entries.clear();
            memo.day = Some(today);
        }
        let ttl = self.ttl;
        memo.entries.retain(|_, (_, at)| at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.memo.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: MarketData> MarketData for CachedQuotes<M> {
    async fn day_high(&self, ticker: &str, date: NaiveDate) -> Result<HighPrice, QuoteError> {
        self.evict_stale(Local::now().date_naive());
        let key = (sanitize_symbol(ticker), date);
        let cached = self.memo.lock().entries.get(&key).map(|(h, _)| *h);
        if let Some(high) = cached {
            return Ok(high);
        }
        let high = self.inner.day_high(&key.0, date).await?;
        self.memo.lock().entries.insert(key, (high, Instant::now()));
        Ok(high)
    }
}

/// Connectivity failures degrade to `Unavailable`.
pub async fn lookup_high<M: MarketData>(provider: &M, ticker: &str, date: NaiveDate) -> HighPrice {
    match provider.day_high(ticker, date).await {
        Ok(h) => h,
        Err(e) => {
            warn!("high lookup for {} on {} failed: {:#}", ticker, date, e);
            HighPrice::Unavailable
        }
    }
}
