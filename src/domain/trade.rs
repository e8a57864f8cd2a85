//! Trade request and receipt types.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{LedgerEntryId, MarketId, OutcomeId, UserId};
use super::ledger::LedgerEntry;

/// Direction of a trade against the market maker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(format!("unknown trade action '{other}'")),
        }
    }
}

/// A request to buy or sell shares of one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRequest {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub shares: Decimal,
    pub action: TradeAction,
}

impl TradeRequest {
    /// Build a buy request.
    pub fn buy(
        user_id: impl Into<UserId>,
        market_id: MarketId,
        outcome_id: impl Into<OutcomeId>,
        shares: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            market_id,
            outcome_id: outcome_id.into(),
            shares,
            action: TradeAction::Buy,
        }
    }

    /// Build a sell request.
    pub fn sell(
        user_id: impl Into<UserId>,
        market_id: MarketId,
        outcome_id: impl Into<OutcomeId>,
        shares: Decimal,
    ) -> Self {
        Self {
            action: TradeAction::Sell,
            ..Self::buy(user_id, market_id, outcome_id, shares)
        }
    }
}

/// Durable record of a committed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub action: TradeAction,
    pub shares: Decimal,
    /// The wallet entry written by this trade; carries user and GP delta.
    pub entry: LedgerEntry,
}

/// Result returned to the caller of a successful trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeReceipt {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub action: TradeAction,
    /// Shares bought or sold.
    pub shares: Decimal,
    /// Caller's position in the outcome after the trade.
    pub position_shares: Decimal,
    /// GP paid (buy) or received (sell); always non-negative.
    pub cost_or_proceeds: i64,
    /// Signed wallet movement.
    pub gp_delta: i64,
    pub new_balance_gp: i64,
    pub entry_id: LedgerEntryId,
    /// Implied probability of the traded outcome after the trade.
    pub implied_probability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sell_builder_flips_action_only() {
        let request = TradeRequest::sell("alice", MarketId::from("m1"), "yes", dec!(3));
        assert_eq!(request.action, TradeAction::Sell);
        assert_eq!(request.user_id.as_str(), "alice");
        assert_eq!(request.shares, dec!(3));
    }

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("buy".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert_eq!("SELL".parse::<TradeAction>().unwrap(), TradeAction::Sell);
        assert!("hold".parse::<TradeAction>().is_err());
    }
}
