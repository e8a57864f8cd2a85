//! Journal replay.

use std::sync::Arc;

use tracing::info;

use super::{trade_effect, Engine};
use crate::application::market::MarketCell;
use crate::application::settlement::SettlementProcessor;
use crate::application::wallet::{AccountHandle, LockedAccounts};
use crate::domain::id::UserId;
use crate::error::{Error, Result};
use crate::port::outbound::journal::JournalRecord;

impl Engine {
    /// Rebuild state by applying committed records in order.
    ///
    /// Every record went through validation before it was journaled, so a
    /// record that fails to apply means the journal and the engine disagree.
    pub(super) fn replay(&self, records: Vec<JournalRecord>) -> Result<usize> {
        let count = records.len();
        for (seq, record) in records.into_iter().enumerate() {
            let kind = record.kind();
            self.replay_one(record).map_err(|err| match err {
                violation @ Error::ConsistencyViolation { .. } => violation,
                other => {
                    Error::consistency(None, format!("journal record {seq} ({kind}): {other}"))
                }
            })?;
        }

        for user_id in self.wallets.users() {
            let Some(handle) = self.wallets.existing(&user_id) else {
                continue;
            };
            let account = handle.lock();
            if !account.is_consistent() || account.balance_gp() < 0 {
                return Err(Error::consistency(
                    None,
                    format!(
                        "restored wallet of {user_id} has balance {} and ledger sum {}",
                        account.balance_gp(),
                        account.ledger_sum()
                    ),
                ));
            }
        }

        info!(
            records = count,
            markets = self.markets.len(),
            wallets = self.wallets.users().len(),
            "Engine restored from journal"
        );
        Ok(count)
    }

    fn replay_one(&self, record: JournalRecord) -> Result<()> {
        match record {
            JournalRecord::MarketCreated { market } => {
                let market_id = market.id().clone();
                let slug = market.slug().to_string();
                if self.markets.contains_key(&market_id) || self.slugs.contains_key(&slug) {
                    return Err(Error::consistency(
                        Some(market_id),
                        format!("market or slug '{slug}' registered twice"),
                    ));
                }
                self.markets
                    .insert(market_id.clone(), Arc::new(MarketCell::new(market)));
                self.slugs.insert(slug, market_id);
            }
            JournalRecord::TradeCommitted { trade } => {
                let cell = self.cell(&trade.market_id)?;
                let mut market = cell.lock();
                let user_id = trade.entry.user_id().clone();
                let held = self
                    .positions
                    .get(&trade.market_id, &user_id, &trade.outcome_id);
                let effect =
                    trade_effect(&market, held, &trade.outcome_id, trade.action, trade.shares)?;
                let handle = self.wallets.account(&user_id);
                let mut wallet = handle.lock();
                self.wallets.observe_entry_id(trade.entry.id());
                self.apply_trade(&mut market, &mut wallet, &trade, effect);
                drop(wallet);
                cell.publish(&market);
            }
            JournalRecord::Adjusted { entry, .. } => {
                self.wallets.observe_entry_id(entry.id());
                let handle = self.wallets.account(entry.user_id());
                handle.lock().apply(entry);
            }
            JournalRecord::MarketClosed { market_id, .. } => {
                let cell = self.cell(&market_id)?;
                let mut market = cell.lock();
                market.close();
                cell.publish(&market);
            }
            JournalRecord::MarketSettled {
                market_id,
                status,
                winning_outcome,
                entries,
                ..
            } => {
                let cell = self.cell(&market_id)?;
                let mut market = cell.lock();
                let handles: Vec<(UserId, AccountHandle)> = entries
                    .iter()
                    .map(|e| (e.user_id().clone(), self.wallets.account(e.user_id())))
                    .collect();
                let mut accounts = LockedAccounts::lock(&handles);
                for entry in &entries {
                    self.wallets.observe_entry_id(entry.id());
                }
                SettlementProcessor::new(&self.wallets, &self.positions, self.policy.as_ref())
                    .apply(&mut market, winning_outcome, &entries, &mut accounts)?;
                drop(accounts);
                if market.status() != status {
                    return Err(Error::consistency(
                        Some(market_id),
                        format!("settled as {} but journal says {status}", market.status()),
                    ));
                }
                cell.publish(&market);
            }
            JournalRecord::MarketHalted { market_id, reason } => {
                let cell = self.cell(&market_id)?;
                let mut market = cell.lock();
                market.halt(reason);
                cell.publish(&market);
            }
            JournalRecord::HaltCleared { market_id } => {
                let cell = self.cell(&market_id)?;
                let mut market = cell.lock();
                market.clear_halt();
                cell.publish(&market);
            }
        }
        Ok(())
    }
}
