//! Ledger and share-state reconciliation.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use super::Engine;
use crate::application::market::MarketCell;
use crate::domain::id::{MarketId, OutcomeId, UserId};

/// A wallet whose cached balance disagrees with its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountMismatch {
    pub user_id: UserId,
    pub balance_gp: i64,
    pub ledger_sum_gp: i128,
}

/// An outcome whose AMM share count differs from the sum of positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareMismatch {
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub share_count: Decimal,
    pub held: Decimal,
}

/// Result of [`Engine::audit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub accounts_checked: usize,
    pub entries_checked: usize,
    pub markets_checked: usize,
    /// Sum of all cached balances.
    pub total_balance_gp: i128,
    pub account_mismatches: Vec<AccountMismatch>,
    pub share_mismatches: Vec<ShareMismatch>,
    /// Markets halted by this audit.
    pub halted_markets: Vec<MarketId>,
}

impl AuditReport {
    /// Returns true if no mismatch was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.account_mismatches.is_empty() && self.share_mismatches.is_empty()
    }
}

impl Engine {
    /// Re-check every wallet and every live market.
    ///
    /// A wallet whose balance differs from the sum of its ledger, or is
    /// negative, halts every market it has entries in. An OPEN or CLOSED
    /// market whose share counts differ from the sum of its positions is
    /// halted too. Terminal markets are skipped: settlement zeroes positions
    /// but leaves the final share vector in place.
    pub fn audit(&self) -> AuditReport {
        let mut report = AuditReport::default();
        let mut to_halt: BTreeMap<MarketId, String> = BTreeMap::new();

        for user_id in self.wallets.users() {
            let Some(handle) = self.wallets.existing(&user_id) else {
                continue;
            };
            let account = handle.lock();
            report.accounts_checked += 1;
            report.entries_checked += account.entries().len();
            report.total_balance_gp += i128::from(account.balance_gp());

            if account.is_consistent() && account.balance_gp() >= 0 {
                continue;
            }
            let mismatch = AccountMismatch {
                user_id: user_id.clone(),
                balance_gp: account.balance_gp(),
                ledger_sum_gp: account.ledger_sum(),
            };
            warn!(
                user_id = %user_id,
                balance = mismatch.balance_gp,
                ledger_sum = %mismatch.ledger_sum_gp,
                "Wallet does not reconcile"
            );
            for market_id in account.markets() {
                to_halt.entry(market_id).or_insert_with(|| {
                    format!(
                        "wallet of {user_id} holds {} GP against a ledger sum of {}",
                        mismatch.balance_gp, mismatch.ledger_sum_gp
                    )
                });
            }
            report.account_mismatches.push(mismatch);
        }

        let mut cells: Vec<Arc<MarketCell>> =
            self.markets.iter().map(|c| Arc::clone(c.value())).collect();
        cells.sort_by_key(|cell| cell.snapshot().id.clone());
        for cell in cells {
            let market = cell.lock();
            report.markets_checked += 1;
            if market.status().is_terminal() {
                continue;
            }
            let totals = self.positions.outcome_totals(market.id());
            for outcome in market.outcomes() {
                let held = totals.get(outcome.id()).copied().unwrap_or(Decimal::ZERO);
                if held == outcome.share_count() {
                    continue;
                }
                warn!(
                    market_id = %market.id(),
                    outcome_id = %outcome.id(),
                    share_count = %outcome.share_count(),
                    held = %held,
                    "Share count does not match positions"
                );
                to_halt.entry(market.id().clone()).or_insert_with(|| {
                    format!(
                        "outcome {} has share count {} but positions sum to {held}",
                        outcome.id(),
                        outcome.share_count()
                    )
                });
                report.share_mismatches.push(ShareMismatch {
                    market_id: market.id().clone(),
                    outcome_id: outcome.id().clone(),
                    share_count: outcome.share_count(),
                    held,
                });
            }
        }

        for (market_id, reason) in to_halt {
            match self.halt_market(&market_id, reason) {
                Ok(_) => report.halted_markets.push(market_id),
                Err(err) => error!(market_id = %market_id, error = %err, "Failed to halt market"),
            }
        }

        if report.is_clean() {
            info!(
                accounts = report.accounts_checked,
                entries = report.entries_checked,
                markets = report.markets_checked,
                "Audit clean"
            );
        } else {
            error!(
                account_mismatches = report.account_mismatches.len(),
                share_mismatches = report.share_mismatches.len(),
                halted = report.halted_markets.len(),
                "Audit found consistency violations"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::domain::id::{OutcomeId, UserId};
    use crate::domain::trade::TradeRequest;
    use crate::testkit::harness::Harness;

    #[test]
    fn traded_engine_audits_clean() {
        let h = Harness::new();
        let market = h.binary_market("rain");
        h.funded_user("alice", 1000);
        h.engine
            .execute_trade(&TradeRequest::buy("alice", market, "yes", dec!(10)))
            .unwrap();

        let report = h.engine.audit();

        assert!(report.is_clean());
        assert_eq!(report.accounts_checked, 1);
        assert_eq!(report.entries_checked, 2);
        assert_eq!(report.markets_checked, 1);
        assert_eq!(report.total_balance_gp, 995);
        assert!(report.halted_markets.is_empty());
    }

    #[test]
    fn drifted_position_halts_the_market() {
        let h = Harness::new();
        let market = h.binary_market("rain");
        h.funded_user("alice", 1000);
        h.engine
            .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(10)))
            .unwrap();
        h.engine.positions.set(
            &market,
            &UserId::from("alice"),
            &OutcomeId::from("yes"),
            dec!(12),
        );

        let report = h.engine.audit();

        assert!(!report.is_clean());
        assert_eq!(report.share_mismatches.len(), 1);
        assert_eq!(report.share_mismatches[0].share_count, dec!(10));
        assert_eq!(report.share_mismatches[0].held, dec!(12));
        assert_eq!(report.halted_markets, vec![market.clone()]);
        assert!(h.engine.snapshot(&market).unwrap().halted.is_some());
        assert_eq!(
            h.engine
                .execute_trade(&TradeRequest::buy("alice", market, "no", dec!(1)))
                .unwrap_err()
                .code(),
            "market_halted"
        );
    }
}
