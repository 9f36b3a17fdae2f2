//! Small helpers, plus the presentation-side formatting of prices and profit.

use crate::profit::Profit;
use crate::types::{Exchange, HighPrice, Record};

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

pub fn fmt_high(h: &HighPrice) -> String {
    match h {
        HighPrice::Observed(v) => v.normalize().to_string(),
        HighPrice::Unavailable => "n/a".to_string(),
    }
}

pub fn fmt_profit(p: &Profit) -> String {
    match p.as_percent() {
        Some(pct) => format!("{:.2}%", pct),
        None => "n/a".to_string(),
    }
}

pub fn fmt_listing(exchange: Exchange, tickers: &[String]) -> String {
    if tickers.is_empty() {
        format!("no listing configured for {exchange}; any ticker accepted")
    } else {
        format!("tickers on {exchange}: {}", tickers.join(", "))
    }
}

/// Plain-text table of working or stored rows, 1-based index first.
pub fn render_table(records: &[Record]) -> String {
    let mut out = format!(
        "{:>3}  {:<8} {:>12} {:>12} {:>9}  {}\n",
        "#", "Ticker", "Recommend", "Highest", "Profit", "As of"
    );
    for (i, r) in records.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:<8} {:>12} {:>12} {:>9}  {}\n",
            i + 1,
            r.ticker,
            r.cost_price.normalize().to_string(),
            fmt_high(&r.high_price),
            fmt_profit(&r.profit()),
            r.as_of_date
        ));
    }
    out
}
