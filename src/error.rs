//! Typed errors for validation, storage, reconciliation and quote lookups.

use thiserror::Error;

/// Rejected operator input or a malformed record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("{field} must be >= 0, got {value}")]
    NegativePrice { field: &'static str, value: String },

    #[error("ticker {ticker} is not listed on {exchange}")]
    NotListed { ticker: String, exchange: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unreachable: {0}")]
    Unreachable(String),

    #[error("corrupt stored data: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Unreachable(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("collection name must not be empty")]
    InvalidCollection,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Connectivity failure talking to the market-data provider.
/// "No data for that day" is not an error.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("quote source unavailable: {0}")]
    Unavailable(String),

    #[error("quote source returned bad data: {0}")]
    BadData(String),
}
