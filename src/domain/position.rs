//! Position types.
//!
//! A position is the number of shares a user holds in one outcome of one
//! market. Positions are never negative: short selling is not supported.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{MarketId, OutcomeId, UserId};
use super::market::MarketStatus;

/// One `(user, outcome)` row of a market's position book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holding {
    pub user_id: UserId,
    pub outcome_id: OutcomeId,
    pub shares: Decimal,
}

/// One line of a user's portfolio across markets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioLine {
    pub market_id: MarketId,
    pub market_slug: String,
    pub market_title: String,
    pub market_status: MarketStatus,
    pub outcome_id: OutcomeId,
    pub outcome_name: String,
    pub shares: Decimal,
    pub implied_probability: f64,
}

impl PortfolioLine {
    /// Mark-to-market value in GP at the current implied probability.
    #[must_use]
    pub fn estimated_value(&self) -> f64 {
        self.shares.to_f64().unwrap_or(0.0) * self.implied_probability
    }
}
