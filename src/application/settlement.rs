//! Settlement processor.
//!
//! Converts the terminal state of a market into wallet credits, exactly
//! once. Settlement runs in two phases so the engine can journal between
//! them: [`SettlementProcessor::plan`] computes the credits against locked
//! accounts and a point-in-time position view, [`SettlementProcessor::apply`]
//! writes them, zeroes every position row and moves the market to its
//! terminal status.
//!
//! - Payout mode (`RESOLVED`): each positive holding of the winning outcome
//!   is redeemed through the trade policy.
//! - Refund mode (`INVALID`): each holder gets back the net GP they put into
//!   the market through trades, floored at zero.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::position::PositionStore;
use super::wallet::{LockedAccounts, WalletAccount, WalletLedger};
use crate::domain::id::{MarketId, OutcomeId};
use crate::domain::ledger::{EntryKind, LedgerEntry};
use crate::domain::market::Market;
use crate::domain::policy::TradePolicy;
use crate::domain::position::Holding;
use crate::error::{Error, Result};

/// Computes and applies settlement credits for one market.
pub struct SettlementProcessor<'a> {
    wallets: &'a WalletLedger,
    positions: &'a PositionStore,
    policy: &'a dyn TradePolicy,
}

impl<'a> SettlementProcessor<'a> {
    /// Create a processor over the engine's ledger, positions and policy.
    pub fn new(
        wallets: &'a WalletLedger,
        positions: &'a PositionStore,
        policy: &'a dyn TradePolicy,
    ) -> Self {
        Self {
            wallets,
            positions,
            policy,
        }
    }

    /// Compute the credits owed for settling `market`.
    ///
    /// `winner` selects payout mode, `None` selects refund mode. `accounts`
    /// must hold every user with a position row in the market.
    ///
    /// # Errors
    ///
    /// Returns a consistency violation for a negative holding, a payout the
    /// policy cannot express, a holder whose account is not locked, or a
    /// credit that would overflow a balance.
    pub fn plan(
        &self,
        market: &Market,
        winner: Option<&OutcomeId>,
        accounts: &LockedAccounts<'_>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>> {
        let market_id = market.id();
        let holdings = self.positions.positions_for_market(market_id);
        if let Some(short) = holdings.iter().find(|h| h.shares.is_sign_negative()) {
            return Err(Error::consistency(
                Some(market_id.clone()),
                format!(
                    "negative position {} for {} in {}",
                    short.shares, short.user_id, short.outcome_id
                ),
            ));
        }

        match winner {
            Some(winner) => self.plan_payouts(market_id, winner, &holdings, accounts, now),
            None => self.plan_refunds(market_id, &holdings, accounts, now),
        }
    }

    fn plan_payouts(
        &self,
        market_id: &MarketId,
        winner: &OutcomeId,
        holdings: &[Holding],
        accounts: &LockedAccounts<'_>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>> {
        let mut entries = Vec::new();
        for holding in holdings.iter().filter(|h| &h.outcome_id == winner) {
            if holding.shares.is_zero() {
                continue;
            }
            let gp = self.policy.payout_gp(holding.shares).ok_or_else(|| {
                Error::consistency(
                    Some(market_id.clone()),
                    format!("payout for {} shares is not representable", holding.shares),
                )
            })?;
            if gp == 0 {
                debug!(
                    user_id = %holding.user_id,
                    shares = %holding.shares,
                    "Holding redeems for zero GP"
                );
                continue;
            }
            let account = locked(accounts, market_id, holding)?;
            entries.push(self.wallets.draft(
                account,
                &holding.user_id,
                EntryKind::ResolutionPayout,
                gp,
                Some(market_id),
                now,
            )?);
        }
        Ok(entries)
    }

    fn plan_refunds(
        &self,
        market_id: &MarketId,
        holdings: &[Holding],
        accounts: &LockedAccounts<'_>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>> {
        let mut entries = Vec::new();
        let mut last_user = None;
        for holding in holdings {
            // rows are sorted by user
            if last_user == Some(&holding.user_id) {
                continue;
            }
            last_user = Some(&holding.user_id);

            let account = locked(accounts, market_id, holding)?;
            let refund = account.net_trade_spend(market_id).max(0);
            if refund == 0 {
                continue;
            }
            entries.push(self.wallets.draft(
                account,
                &holding.user_id,
                EntryKind::InvalidRefund,
                refund,
                Some(market_id),
                now,
            )?);
        }
        Ok(entries)
    }

    /// Write planned credits, zero every position and settle the market.
    ///
    /// Returns the number of position rows that held shares. Entries whose
    /// user is not in `accounts` are reported as a consistency violation
    /// before anything is written.
    ///
    /// # Errors
    ///
    /// Returns a consistency violation if an entry's account is not locked.
    pub fn apply(
        &self,
        market: &mut Market,
        winner: Option<OutcomeId>,
        entries: &[LedgerEntry],
        accounts: &mut LockedAccounts<'_>,
    ) -> Result<usize> {
        if let Some(missing) = entries.iter().find(|e| accounts.get(e.user_id()).is_none()) {
            return Err(Error::consistency(
                Some(market.id().clone()),
                format!("settlement credit for unlocked account {}", missing.user_id()),
            ));
        }
        for entry in entries {
            if let Some(account) = accounts.get_mut(entry.user_id()) {
                account.apply(entry.clone());
            }
        }
        let cleared = self.positions.clear_market(market.id());
        market.settle(winner);
        Ok(cleared)
    }
}

fn locked<'g>(
    accounts: &'g LockedAccounts<'_>,
    market_id: &MarketId,
    holding: &Holding,
) -> Result<&'g WalletAccount> {
    accounts.get(&holding.user_id).ok_or_else(|| {
        Error::consistency(
            Some(market_id.clone()),
            format!("holder {} was not locked for settlement", holding.user_id),
        )
    })
}
