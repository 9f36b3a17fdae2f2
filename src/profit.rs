//! Profit derivation from cost and day-high prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::HighPrice;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Profit {
    /// (high - cost) / cost
    Ratio(Decimal),
    Undefined,
}

impl Profit {
    /// Percentage rounded to 2 dp. Presentation only. `None` when the ratio
    /// is too large to scale.
    pub fn as_percent(&self) -> Option<Decimal> {
        match self {
            Profit::Ratio(r) => r.checked_mul(Decimal::ONE_HUNDRED).map(|p| p.round_dp(2)),
            Profit::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Profit::Ratio(_))
    }
}

/// Undefined when the high is unavailable or the cost is zero. Never panics.
pub fn profit(cost_price: Decimal, high_price: HighPrice) -> Profit {
    let HighPrice::Observed(high) = high_price else {
        return Profit::Undefined;
    };
    if cost_price.is_zero() {
        return Profit::Undefined;
    }
    match (high - cost_price).checked_div(cost_price) {
        Some(r) => Profit::Ratio(r),
        None => Profit::Undefined,
    }
}
