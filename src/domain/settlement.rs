//! Settlement results.

use serde::Serialize;

use super::id::{MarketId, OutcomeId};
use super::ledger::LedgerEntry;
use super::market::MarketStatus;

/// Outcome of the one-time settlement run of a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub market_id: MarketId,
    /// `Resolved` (payout mode) or `Invalid` (refund mode).
    pub status: MarketStatus,
    pub winning_outcome: Option<OutcomeId>,
    /// Credits written by the run, in user order.
    pub entries: Vec<LedgerEntry>,
    /// Position rows zeroed by the run.
    pub positions_cleared: usize,
}

impl SettlementReport {
    /// Sum of GP credited by the run.
    #[must_use]
    pub fn total_credited_gp(&self) -> i64 {
        self.entries.iter().map(LedgerEntry::amount_gp).sum()
    }

    /// Number of users that received a credit.
    #[must_use]
    pub fn users_credited(&self) -> usize {
        self.entries.len()
    }
}
