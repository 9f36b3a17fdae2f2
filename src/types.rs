//! Core domain types: exchanges, trade records, identity keys and stored rows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::profit::{profit, Profit};
use crate::utils::sanitize_symbol;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Exchange {
    HSX,
    HNX,
    UPCOM,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::HSX => "HSX",
            Exchange::HNX => "HNX",
            Exchange::UPCOM => "UPCOM",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HSX" | "HOSE" => Ok(Exchange::HSX),
            "HNX" => Ok(Exchange::HNX),
            "UPCOM" => Ok(Exchange::UPCOM),
            other => Err(format!("unknown exchange: {other}")),
        }
    }
}

/// Day-high observed for a ticker, or the provider had nothing for that date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HighPrice {
    Observed(Decimal),
    Unavailable,
}

impl HighPrice {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            HighPrice::Observed(v) => Some(*v),
            HighPrice::Unavailable => None,
        }
    }
}

impl From<Option<Decimal>> for HighPrice {
    fn from(v: Option<Decimal>) -> Self {
        v.map_or(HighPrice::Unavailable, HighPrice::Observed)
    }
}

/// One trade observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub ticker: String,
    pub cost_price: Decimal,
    pub high_price: HighPrice,
    pub as_of_date: NaiveDate,
}

/// `(ticker, cost_price, high_price)` in normalized text form. Two records are
/// the same economic event iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub ticker: String,
    pub cost_price: String,
    pub high_price: Option<String>,
}

/// Canonical text for a price: `10`, `10.0` and `10.00` all become `"10"`.
pub fn normalize_price(p: Decimal) -> String {
    p.normalize().to_string()
}

impl Record {
    pub fn new(
        ticker: &str,
        cost_price: Decimal,
        high_price: HighPrice,
        as_of_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let rec = Self {
            ticker: sanitize_symbol(ticker),
            cost_price,
            high_price,
            as_of_date,
        };
        rec.validate()?;
        Ok(rec)
    }

    /// Record dated today (local calendar).
    pub fn today(
        ticker: &str,
        cost_price: Decimal,
        high_price: HighPrice,
    ) -> Result<Self, ValidationError> {
        Self::new(ticker, cost_price, high_price, Local::now().date_naive())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ticker.trim().is_empty() {
            return Err(ValidationError::EmptyTicker);
        }
        if self.cost_price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice {
                field: "cost_price",
                value: self.cost_price.to_string(),
            });
        }
        if let HighPrice::Observed(h) = self.high_price {
            if h < Decimal::ZERO {
                return Err(ValidationError::NegativePrice {
                    field: "high_price",
                    value: h.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn profit(&self) -> Profit {
        profit(self.cost_price, self.high_price)
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            ticker: sanitize_symbol(&self.ticker),
            cost_price: normalize_price(self.cost_price),
            high_price: self.high_price.value().map(normalize_price),
        }
    }
}

/// Persisted row: write timestamp, collection name, the record and its profit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    pub written_at: DateTime<Utc>,
    pub collection: String,
    #[serde(flatten)]
    pub record: Record,
    pub profit: Profit,
}

impl StoredRecord {
    /// The ticker is stored in its canonical form so the row matches its key.
    pub fn new(collection: &str, mut record: Record, written_at: DateTime<Utc>) -> Self {
        record.ticker = sanitize_symbol(&record.ticker);
        let profit = record.profit();
        Self {
            written_at,
            collection: collection.to_string(),
            record,
            profit,
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        self.record.identity_key()
    }
}
