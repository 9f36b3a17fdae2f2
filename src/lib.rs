//! Record trade recommendations against the day's high and persist them to
//! named collections without duplicating economic records.

pub mod config;
pub mod error;
pub mod ledger;
pub mod parser;
pub mod profit;
pub mod quotes;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;
