//! Trading engine.
//!
//! The engine owns every market, the position store and the wallet ledger,
//! and is the only component that mutates them. Each public write is one
//! atomic unit:
//!
//! 1. lock the market (and the affected wallet accounts, in user order)
//! 2. validate and price against the locked state
//! 3. append one [`JournalRecord`], which is the commit point
//! 4. apply the change in memory and publish a new market snapshot
//! 5. release the locks, then notify
//!
//! A rejected or failed step before 3 leaves no trace. Lock order is always
//! market, then wallets, then journal; no unit ever holds two market locks.

mod audit;
mod restore;

pub use audit::{AccountMismatch, AuditReport, ShareMismatch};

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::market::MarketCell;
use super::position::PositionStore;
use super::settlement::SettlementProcessor;
use super::wallet::{AccountHandle, LedgerHistory, LockedAccounts, WalletAccount, WalletLedger};
use crate::domain::error::DomainError;
use crate::domain::id::{MarketId, OutcomeId, UserId};
use crate::domain::ledger::{EntryKind, HistoryCursor, LedgerEntry, LedgerPage};
use crate::domain::market::{Market, MarketFilter, MarketSnapshot, MarketStatus, NewMarket};
use crate::domain::policy::{StandardPolicy, TradePolicy};
use crate::domain::position::{Holding, PortfolioLine};
use crate::domain::pricing::to_f64;
use crate::domain::settlement::SettlementReport;
use crate::domain::trade::{TradeAction, TradeReceipt, TradeRecord, TradeRequest};
use crate::error::{Error, Result, TradeError};
use crate::port::inbound::trading::{Authorization, TradingService};
use crate::port::outbound::clock::{Clock, SystemClock};
use crate::port::outbound::journal::{Journal, JournalRecord};
use crate::port::outbound::notifier::{
    Event, Notifier, NotifierRegistry, ResolutionEvent, TradeEvent,
};

/// Tunables that do not change trading semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Re-sum the affected ledgers after every commit.
    pub verify_on_commit: bool,
    /// Smallest liquidity parameter accepted at market creation.
    pub min_liquidity: Decimal,
    /// Default ledger page size.
    pub history_page_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            verify_on_commit: true,
            min_liquidity: Decimal::ONE,
            history_page_size: 50,
        }
    }
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    journal: Arc<dyn Journal>,
    clock: Arc<dyn Clock>,
    policy: Arc<dyn TradePolicy>,
    notifiers: NotifierRegistry,
    settings: EngineSettings,
}

impl EngineBuilder {
    /// Start from a journal with the system clock and standard policy.
    pub fn new(journal: Arc<dyn Journal>) -> Self {
        Self {
            journal,
            clock: Arc::new(SystemClock),
            policy: Arc::new(StandardPolicy::default()),
            notifiers: NotifierRegistry::new(),
            settings: EngineSettings::default(),
        }
    }

    /// Use a different time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different rounding and payout policy.
    #[must_use]
    pub fn policy(mut self, policy: Arc<dyn TradePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Register an event consumer.
    #[must_use]
    pub fn notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.register(notifier);
        self
    }

    /// Replace all settings.
    #[must_use]
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn verify_on_commit(mut self, enabled: bool) -> Self {
        self.settings.verify_on_commit = enabled;
        self
    }

    #[must_use]
    pub fn min_liquidity(mut self, minimum: Decimal) -> Self {
        self.settings.min_liquidity = minimum;
        self
    }

    #[must_use]
    pub fn history_page_size(mut self, size: usize) -> Self {
        self.settings.history_page_size = size;
        self
    }

    /// Build an empty engine. The journal is expected to be empty.
    #[must_use]
    pub fn build(self) -> Engine {
        Engine {
            markets: DashMap::new(),
            slugs: DashMap::new(),
            wallets: WalletLedger::new(self.settings.history_page_size),
            positions: PositionStore::new(),
            journal: self.journal,
            clock: self.clock,
            policy: self.policy,
            notifiers: self.notifiers,
            settings: self.settings,
        }
    }

    /// Build an engine and rebuild its state from the journal.
    ///
    /// Replay does not emit events.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the journal cannot be read, or a
    /// consistency violation if the records do not replay cleanly.
    pub fn restore(self) -> Result<Engine> {
        let engine = self.build();
        let records = engine.journal.replay()?;
        engine.replay(records)?;
        Ok(engine)
    }
}

/// Effect of a validated trade on the locked market and position.
#[derive(Debug, Clone, Copy)]
struct TradeEffect {
    index: usize,
    share_count: Decimal,
    position: Decimal,
}

/// The market trading and settlement engine.
pub struct Engine {
    markets: DashMap<MarketId, Arc<MarketCell>>,
    slugs: DashMap<String, MarketId>,
    wallets: WalletLedger,
    positions: PositionStore,
    journal: Arc<dyn Journal>,
    clock: Arc<dyn Clock>,
    policy: Arc<dyn TradePolicy>,
    notifiers: NotifierRegistry,
    settings: EngineSettings,
}

impl Engine {
    /// Start building an engine over `journal`.
    pub fn builder(journal: Arc<dyn Journal>) -> EngineBuilder {
        EngineBuilder::new(journal)
    }

    /// Rebuild an engine with default settings from `journal`.
    ///
    /// # Errors
    ///
    /// See [`EngineBuilder::restore`].
    pub fn restore(journal: Arc<dyn Journal>) -> Result<Self> {
        EngineBuilder::new(journal).restore()
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ---------------------------------------------------------------------
    // Catalogue
    // ---------------------------------------------------------------------

    /// Validate and register a new OPEN market.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed draft, `DuplicateSlug` if the
    /// slug is taken, or a storage error if the journal append fails.
    pub fn create_market(&self, draft: NewMarket) -> Result<Arc<MarketSnapshot>> {
        let market = Market::try_new(MarketId::generate(), draft, self.clock.now())?;
        if market.liquidity() < self.settings.min_liquidity {
            return Err(DomainError::LiquidityBelowMinimum {
                liquidity: market.liquidity(),
                minimum: self.settings.min_liquidity,
            }
            .into());
        }

        let snapshot = match self.slugs.entry(market.slug().to_string()) {
            Entry::Occupied(taken) => {
                return Err(TradeError::DuplicateSlug {
                    slug: taken.key().clone(),
                }
                .into());
            }
            Entry::Vacant(slot) => {
                self.journal.append(&JournalRecord::MarketCreated {
                    market: market.clone(),
                })?;
                let cell = Arc::new(MarketCell::new(market));
                let snapshot = cell.snapshot();
                self.markets.insert(snapshot.id.clone(), cell);
                slot.insert(snapshot.id.clone());
                snapshot
            }
        };

        info!(
            market_id = %snapshot.id,
            slug = %snapshot.slug,
            outcomes = snapshot.outcomes.len(),
            liquidity = %snapshot.liquidity,
            close_time = %snapshot.close_time,
            "Market created"
        );
        Ok(snapshot)
    }

    /// Latest committed view of a market.
    ///
    /// # Errors
    ///
    /// Returns `MarketNotFound` for an unknown id.
    pub fn snapshot(&self, market_id: &MarketId) -> Result<Arc<MarketSnapshot>> {
        Ok(self.cell(market_id)?.snapshot())
    }

    /// Look a market up by its slug.
    ///
    /// # Errors
    ///
    /// Returns `MarketNotFound` for an unknown slug.
    pub fn market_by_slug(&self, slug: &str) -> Result<Arc<MarketSnapshot>> {
        let market_id = self
            .slugs
            .get(slug.trim())
            .map(|id| id.value().clone())
            .ok_or_else(|| TradeError::MarketNotFound {
                market: slug.to_string(),
            })?;
        self.snapshot(&market_id)
    }

    /// Look a market up by id, falling back to slug.
    ///
    /// # Errors
    ///
    /// Returns `MarketNotFound` if neither matches.
    pub fn find_market(&self, key: &str) -> Result<Arc<MarketSnapshot>> {
        self.snapshot(&MarketId::from(key))
            .or_else(|_| self.market_by_slug(key))
    }

    /// Markets passing `filter`, newest first.
    #[must_use]
    pub fn list_markets(&self, filter: &MarketFilter) -> Vec<Arc<MarketSnapshot>> {
        let mut markets: Vec<Arc<MarketSnapshot>> = self
            .markets
            .iter()
            .map(|cell| cell.snapshot())
            .filter(|snapshot| filter.matches(snapshot))
            .collect();
        markets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        markets
    }

    /// Stop trading on an OPEN market.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyResolved` for a terminal market, `MarketClosed` for a
    /// market that is already closed, or a storage error.
    pub fn close_market(&self, market_id: &MarketId) -> Result<Arc<MarketSnapshot>> {
        let cell = self.cell(market_id)?;
        let mut events = Vec::new();
        let result = (|| -> Result<Arc<MarketSnapshot>> {
            let mut market = cell.lock();
            let status = market.status();
            if status.is_terminal() {
                return Err(TradeError::AlreadyResolved {
                    market_id: market_id.clone(),
                    status,
                }
                .into());
            }
            if status != MarketStatus::Open {
                return Err(TradeError::MarketClosed {
                    market_id: market_id.clone(),
                    status,
                }
                .into());
            }
            self.close_locked(&cell, &mut market, &mut events)
        })();
        self.emit(events);
        result
    }

    /// Close every OPEN market whose close time has passed.
    ///
    /// Returns the ids of the markets closed by this sweep.
    ///
    /// # Errors
    ///
    /// Stops at the first journal failure; markets closed before it stay
    /// closed.
    pub fn close_expired(&self) -> Result<Vec<MarketId>> {
        let cells: Vec<Arc<MarketCell>> =
            self.markets.iter().map(|c| Arc::clone(c.value())).collect();
        let mut events = Vec::new();
        let mut closed = Vec::new();
        let mut outcome = Ok(());

        for cell in cells {
            let mut market = cell.lock();
            if market.status() != MarketStatus::Open || !market.is_past_close(self.clock.now()) {
                continue;
            }
            match self.close_locked(&cell, &mut market, &mut events) {
                Ok(_) => closed.push(market.id().clone()),
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        self.emit(events);
        if !closed.is_empty() {
            info!(count = closed.len(), "Closed expired markets");
        }
        outcome.map(|()| closed)
    }

    // ---------------------------------------------------------------------
    // Trading
    // ---------------------------------------------------------------------

    /// Buy or sell shares against the market maker.
    ///
    /// The whole step (price, share vector, position, ledger entry, balance)
    /// commits as one unit under the market lock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput`, `MarketNotFound`, `MarketClosed`,
    /// `MarketHalted`, `InsufficientFunds` or `InsufficientShares` with no
    /// state change, or a storage error if the journal append fails.
    ///
    /// A consistency violation found by the post-commit ledger check is the
    /// one error returned after the trade has committed: the trade is
    /// journaled and applied, `TradeExecuted` is still emitted, and the
    /// market is halted.
    pub fn execute_trade(&self, request: &TradeRequest) -> Result<TradeReceipt> {
        if request.shares <= Decimal::ZERO {
            return Err(DomainError::NonPositiveShares {
                shares: request.shares,
            }
            .into());
        }
        let cell = self.cell(&request.market_id)?;
        let mut events = Vec::new();
        let result = self.trade_locked(&cell, request, &mut events);
        match &result {
            Ok(receipt) => events.push(Event::TradeExecuted(TradeEvent::from(receipt))),
            Err(err) => debug!(
                user_id = %request.user_id,
                market_id = %request.market_id,
                action = %request.action,
                code = err.code(),
                error = %err,
                "Trade rejected"
            ),
        }
        self.emit(events);
        result
    }

    fn trade_locked(
        &self,
        cell: &MarketCell,
        request: &TradeRequest,
        events: &mut Vec<Event>,
    ) -> Result<TradeReceipt> {
        let mut market = cell.lock();
        let now = self.clock.now();
        if market.status() == MarketStatus::Open && market.is_past_close(now) {
            self.close_locked(cell, &mut market, events)?;
        }
        ensure_tradeable(&market)?;

        let account = self.wallets.account(&request.user_id);
        let mut wallet = account.lock();
        let held = self
            .positions
            .get(&request.market_id, &request.user_id, &request.outcome_id);
        let effect = trade_effect(
            &market,
            held,
            &request.outcome_id,
            request.action,
            request.shares,
        )?;

        let pricer = market.pricer()?;
        let q = market.share_vector()?;
        let delta = to_f64(request.shares, "trade size")?;
        let (kind, amount_gp) = match request.action {
            TradeAction::Buy => {
                let cost = pricer.cost_to_buy(&q, effect.index, delta)?;
                let gp = self
                    .policy
                    .buy_cost_gp(cost)
                    .ok_or(DomainError::QuantityOutOfRange { context: "buy cost" })?;
                (EntryKind::TradeBuy, -gp)
            }
            TradeAction::Sell => {
                let proceeds = pricer.proceeds_from_sell(&q, effect.index, delta)?;
                let gp = self
                    .policy
                    .sell_proceeds_gp(proceeds)
                    .ok_or(DomainError::QuantityOutOfRange {
                        context: "sell proceeds",
                    })?;
                (EntryKind::TradeSell, gp)
            }
        };

        let entry = self.wallets.draft(
            &wallet,
            &request.user_id,
            kind,
            amount_gp,
            Some(&request.market_id),
            now,
        )?;
        let trade = TradeRecord {
            market_id: request.market_id.clone(),
            outcome_id: request.outcome_id.clone(),
            action: request.action,
            shares: request.shares,
            entry,
        };
        self.journal.append(&JournalRecord::TradeCommitted {
            trade: trade.clone(),
        })?;

        self.apply_trade(&mut market, &mut wallet, &trade, effect);
        let new_balance_gp = wallet.balance_gp();
        let verified = self.verify_account(&wallet, Some(&request.market_id));
        drop(wallet);
        let snapshot = cell.publish(&market);
        let receipt = TradeReceipt {
            user_id: request.user_id.clone(),
            market_id: request.market_id.clone(),
            outcome_id: request.outcome_id.clone(),
            action: request.action,
            shares: request.shares,
            position_shares: effect.position,
            cost_or_proceeds: amount_gp.abs(),
            gp_delta: amount_gp,
            new_balance_gp,
            entry_id: trade.entry.id(),
            implied_probability: snapshot.outcomes[effect.index].implied_probability,
        };
        if let Err(err) = verified {
            // journaled, so the trade stands; consumers still see it
            events.push(Event::TradeExecuted(TradeEvent::from(&receipt)));
            self.halt_locked(cell, &mut market, err.to_string(), events);
            return Err(err);
        }

        info!(
            user_id = %request.user_id,
            market_id = %request.market_id,
            outcome_id = %request.outcome_id,
            action = %request.action,
            shares = %request.shares,
            gp_delta = amount_gp,
            balance = new_balance_gp,
            "Trade committed"
        );
        Ok(receipt)
    }

    fn apply_trade(
        &self,
        market: &mut Market,
        wallet: &mut WalletAccount,
        trade: &TradeRecord,
        effect: TradeEffect,
    ) {
        market.set_share_count(effect.index, effect.share_count);
        self.positions.set(
            &trade.market_id,
            trade.entry.user_id(),
            &trade.outcome_id,
            effect.position,
        );
        wallet.apply(trade.entry.clone());
    }

    // ---------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------

    /// Resolve a market with a winner, or declare it invalid with `None`.
    ///
    /// The terminal transition and the settlement run commit together.
    /// Authorization is the caller's concern; see
    /// [`TradingService::resolve_market`].
    ///
    /// # Errors
    ///
    /// Returns `AlreadyResolved` for a terminal market (no settlement work
    /// is repeated), `MarketHalted`, `InvalidInput` for an unknown winner, a
    /// consistency violation that halts the market, or a storage error.
    pub fn resolve(
        &self,
        market_id: &MarketId,
        winner: Option<OutcomeId>,
    ) -> Result<SettlementReport> {
        let cell = self.cell(market_id)?;
        let mut events = Vec::new();
        let result = self.resolve_locked(&cell, winner, &mut events);
        if let Ok(report) = &result {
            events.push(Event::MarketResolved(ResolutionEvent {
                market_id: report.market_id.clone(),
                outcome: report.winning_outcome.clone(),
                status: report.status,
                total_credited_gp: report.total_credited_gp(),
            }));
        }
        self.emit(events);
        result
    }

    fn resolve_locked(
        &self,
        cell: &MarketCell,
        winner: Option<OutcomeId>,
        events: &mut Vec<Event>,
    ) -> Result<SettlementReport> {
        let mut market = cell.lock();
        let market_id = market.id().clone();
        if market.status().is_terminal() {
            return Err(TradeError::AlreadyResolved {
                market_id,
                status: market.status(),
            }
            .into());
        }
        if let Some(reason) = market.halted() {
            return Err(TradeError::MarketHalted {
                market_id,
                reason: reason.to_string(),
            }
            .into());
        }
        if let Some(outcome_id) = &winner {
            if market.outcome_index(outcome_id).is_none() {
                return Err(DomainError::UnknownOutcome {
                    outcome_id: outcome_id.clone(),
                }
                .into());
            }
        }

        let now = self.clock.now();
        let handles: Vec<(UserId, AccountHandle)> = self
            .positions
            .users_in_market(&market_id)
            .into_iter()
            .map(|user| {
                let handle = self.wallets.account(&user);
                (user, handle)
            })
            .collect();
        let mut accounts = LockedAccounts::lock(&handles);
        let processor =
            SettlementProcessor::new(&self.wallets, &self.positions, self.policy.as_ref());

        let entries = match processor.plan(&market, winner.as_ref(), &accounts, now) {
            Ok(entries) => entries,
            Err(err) => {
                drop(accounts);
                if err.is_consistency_violation() {
                    self.halt_locked(cell, &mut market, err.to_string(), events);
                }
                return Err(err);
            }
        };
        let status = if winner.is_some() {
            MarketStatus::Resolved
        } else {
            MarketStatus::Invalid
        };

        self.journal.append(&JournalRecord::MarketSettled {
            market_id: market_id.clone(),
            status,
            winning_outcome: winner.clone(),
            entries: entries.clone(),
            settled_at: now,
        })?;

        let applied = processor.apply(&mut market, winner.clone(), &entries, &mut accounts);
        let verified = applied.and_then(|cleared| {
            accounts
                .iter()
                .try_for_each(|(_, account)| self.verify_account(account, Some(&market_id)))
                .map(|()| cleared)
        });
        drop(accounts);
        cell.publish(&market);
        let positions_cleared = match verified {
            Ok(cleared) => cleared,
            Err(err) => {
                self.halt_locked(cell, &mut market, err.to_string(), events);
                return Err(err);
            }
        };

        let report = SettlementReport {
            market_id,
            status,
            winning_outcome: winner,
            entries,
            positions_cleared,
        };
        info!(
            market_id = %report.market_id,
            status = %report.status,
            winner = report.winning_outcome.as_ref().map_or("none", |o| o.as_str()),
            credited_gp = report.total_credited_gp(),
            users_credited = report.users_credited(),
            positions_cleared,
            "Market settled"
        );
        Ok(report)
    }

    // ---------------------------------------------------------------------
    // Wallet
    // ---------------------------------------------------------------------

    /// Grant or remove GP outside of trading.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero amount, `InsufficientFunds` if a
    /// negative adjustment would overdraw the wallet, or a storage error.
    pub fn adjust(&self, user_id: &UserId, amount_gp: i64, note: &str) -> Result<LedgerEntry> {
        if amount_gp == 0 {
            return Err(DomainError::ZeroAdjustment.into());
        }
        let handle = self.wallets.account(user_id);
        let mut account = handle.lock();
        let entry = self.wallets.draft(
            &account,
            user_id,
            EntryKind::Adjustment,
            amount_gp,
            None,
            self.clock.now(),
        )?;
        self.journal.append(&JournalRecord::Adjusted {
            entry: entry.clone(),
            note: note.to_string(),
        })?;
        account.apply(entry.clone());

        if let Err(err) = self.verify_account(&account, None) {
            let markets = account.markets();
            drop(account);
            for market_id in markets {
                if let Err(halt_err) = self.halt_market(&market_id, err.to_string()) {
                    warn!(market_id = %market_id, error = %halt_err, "Failed to halt market");
                }
            }
            return Err(err);
        }

        info!(
            user_id = %user_id,
            amount_gp,
            balance = account.balance_gp(),
            note,
            "Wallet adjusted"
        );
        Ok(entry)
    }

    /// Current GP balance; zero for unknown users.
    #[must_use]
    pub fn balance(&self, user_id: &UserId) -> i64 {
        self.wallets.balance(user_id)
    }

    /// One page of ledger history, newest first.
    #[must_use]
    pub fn ledger_page(
        &self,
        user_id: &UserId,
        cursor: Option<HistoryCursor>,
        limit: Option<usize>,
    ) -> LedgerPage {
        self.wallets.page(user_id, cursor, limit)
    }

    /// Lazy walk over a user's full history, newest first.
    #[must_use]
    pub fn history(&self, user_id: &UserId) -> LedgerHistory<'_> {
        self.wallets.history(user_id)
    }

    // ---------------------------------------------------------------------
    // Positions
    // ---------------------------------------------------------------------

    /// Shares a user holds in one outcome.
    #[must_use]
    pub fn position(
        &self,
        market_id: &MarketId,
        user_id: &UserId,
        outcome_id: &OutcomeId,
    ) -> Decimal {
        self.positions.get(market_id, user_id, outcome_id)
    }

    /// Every position row of a market.
    #[must_use]
    pub fn positions_for_market(&self, market_id: &MarketId) -> Vec<Holding> {
        self.positions.positions_for_market(market_id)
    }

    /// A user's non-zero holdings across markets, with current prices.
    #[must_use]
    pub fn portfolio(&self, user_id: &UserId) -> Vec<PortfolioLine> {
        let mut lines: Vec<PortfolioLine> = self
            .positions
            .for_user(user_id)
            .into_iter()
            .filter_map(|(market_id, outcome_id, shares)| {
                let snapshot = self.snapshot(&market_id).ok()?;
                let outcome = snapshot.outcome(&outcome_id)?;
                Some(PortfolioLine {
                    market_id: market_id.clone(),
                    market_slug: snapshot.slug.clone(),
                    market_title: snapshot.title.clone(),
                    market_status: snapshot.status,
                    outcome_id: outcome_id.clone(),
                    outcome_name: outcome.name.clone(),
                    shares,
                    implied_probability: outcome.implied_probability,
                })
            })
            .collect();
        lines.sort_by(|a, b| {
            a.market_slug
                .cmp(&b.market_slug)
                .then_with(|| a.outcome_id.cmp(&b.outcome_id))
        });
        lines
    }

    // ---------------------------------------------------------------------
    // Halts
    // ---------------------------------------------------------------------

    /// Block trading and resolution on a market pending reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `MarketNotFound` for an unknown market.
    pub fn halt_market(
        &self,
        market_id: &MarketId,
        reason: impl Into<String>,
    ) -> Result<Arc<MarketSnapshot>> {
        let cell = self.cell(market_id)?;
        let mut events = Vec::new();
        let snapshot = {
            let mut market = cell.lock();
            self.halt_locked(&cell, &mut market, reason.into(), &mut events);
            cell.snapshot()
        };
        self.emit(events);
        Ok(snapshot)
    }

    /// Lift a halt after an operator reconciled the market.
    ///
    /// A market that is not halted is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `MarketNotFound` or a storage error.
    pub fn clear_halt(&self, market_id: &MarketId) -> Result<Arc<MarketSnapshot>> {
        let cell = self.cell(market_id)?;
        let mut market = cell.lock();
        if market.halted().is_none() {
            return Ok(cell.snapshot());
        }
        self.journal.append(&JournalRecord::HaltCleared {
            market_id: market_id.clone(),
        })?;
        market.clear_halt();
        let snapshot = cell.publish(&market);
        info!(market_id = %market_id, "Market halt cleared");
        Ok(snapshot)
    }

    /// Halt the locked market. The in-memory halt is applied even if the
    /// journal append fails.
    fn halt_locked(
        &self,
        cell: &MarketCell,
        market: &mut Market,
        reason: String,
        events: &mut Vec<Event>,
    ) {
        if market.halted().is_some() {
            return;
        }
        error!(market_id = %market.id(), reason = %reason, "Consistency violation, halting market");
        if let Err(err) = self.journal.append(&JournalRecord::MarketHalted {
            market_id: market.id().clone(),
            reason: reason.clone(),
        }) {
            error!(market_id = %market.id(), error = %err, "Failed to journal market halt");
        }
        market.halt(reason.clone());
        cell.publish(market);
        events.push(Event::MarketHalted {
            market_id: market.id().clone(),
            reason,
        });
    }

    fn close_locked(
        &self,
        cell: &MarketCell,
        market: &mut Market,
        events: &mut Vec<Event>,
    ) -> Result<Arc<MarketSnapshot>> {
        let closed_at = self.clock.now();
        self.journal.append(&JournalRecord::MarketClosed {
            market_id: market.id().clone(),
            closed_at,
        })?;
        market.close();
        let snapshot = cell.publish(market);
        info!(market_id = %market.id(), closed_at = %closed_at, "Market closed");
        events.push(Event::MarketClosed {
            market_id: market.id().clone(),
        });
        Ok(snapshot)
    }

    fn verify_account(&self, account: &WalletAccount, market_id: Option<&MarketId>) -> Result<()> {
        if !self.settings.verify_on_commit || account.is_consistent() {
            return Ok(());
        }
        Err(Error::consistency(
            market_id.cloned(),
            format!(
                "cached balance {} differs from ledger sum {}",
                account.balance_gp(),
                account.ledger_sum()
            ),
        ))
    }

    fn cell(&self, market_id: &MarketId) -> Result<Arc<MarketCell>> {
        self.markets
            .get(market_id)
            .map(|cell| Arc::clone(cell.value()))
            .ok_or_else(|| {
                TradeError::MarketNotFound {
                    market: market_id.to_string(),
                }
                .into()
            })
    }

    fn emit(&self, events: Vec<Event>) {
        for event in events {
            self.notifiers.notify_all(event);
        }
    }
}

fn ensure_tradeable(market: &Market) -> std::result::Result<(), TradeError> {
    if let Some(reason) = market.halted() {
        return Err(TradeError::MarketHalted {
            market_id: market.id().clone(),
            reason: reason.to_string(),
        });
    }
    if market.status() != MarketStatus::Open {
        return Err(TradeError::MarketClosed {
            market_id: market.id().clone(),
            status: market.status(),
        });
    }
    Ok(())
}

/// Validate a trade against the locked market and the caller's holding.
fn trade_effect(
    market: &Market,
    held: Decimal,
    outcome_id: &OutcomeId,
    action: TradeAction,
    shares: Decimal,
) -> Result<TradeEffect> {
    let index = market
        .outcome_index(outcome_id)
        .ok_or_else(|| DomainError::UnknownOutcome {
            outcome_id: outcome_id.clone(),
        })?;
    let share_count = market.outcomes()[index].share_count();
    let out_of_range = || DomainError::QuantityOutOfRange {
        context: "share count",
    };

    let (share_count, position) = match action {
        TradeAction::Buy => (
            share_count.checked_add(shares).ok_or_else(out_of_range)?,
            held.checked_add(shares).ok_or_else(out_of_range)?,
        ),
        TradeAction::Sell => {
            if held < shares {
                return Err(TradeError::InsufficientShares {
                    held,
                    requested: shares,
                }
                .into());
            }
            (
                share_count.checked_sub(shares).ok_or_else(out_of_range)?,
                held - shares,
            )
        }
    };

    Ok(TradeEffect {
        index,
        share_count,
        position,
    })
}

impl TradingService for Engine {
    fn submit_trade(&self, request: TradeRequest) -> Result<TradeReceipt> {
        self.execute_trade(&request)
    }

    fn resolve_market(
        &self,
        auth: &Authorization,
        market_id: &MarketId,
        winning_outcome: Option<OutcomeId>,
    ) -> Result<SettlementReport> {
        if let Err(err) = auth.require_admin() {
            warn!(market_id = %market_id, error = %err, "Resolution refused");
            return Err(err.into());
        }
        self.resolve(market_id, winning_outcome)
    }

    fn market_snapshot(&self, market_id: &MarketId) -> Result<Arc<MarketSnapshot>> {
        self.snapshot(market_id)
    }

    fn wallet_balance(&self, user_id: &UserId) -> i64 {
        self.balance(user_id)
    }

    fn ledger_page(&self, user_id: &UserId, cursor: Option<HistoryCursor>) -> Result<LedgerPage> {
        Ok(self.wallets.page(user_id, cursor, None))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::domain::id::OutcomeId;
    use crate::domain::trade::TradeRequest;
    use crate::port::outbound::notifier::Event;
    use crate::testkit::harness::Harness;

    #[test]
    fn drift_found_after_commit_still_reports_the_trade() {
        let h = Harness::new();
        let market = h.binary_market("rain");
        let alice = h.funded_user("alice", 1000);
        h.engine.wallets.account(&alice).lock().skew_balance(1);
        let journaled = h.journal.len();

        let err = h
            .engine
            .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(10)))
            .unwrap_err();

        assert_eq!(err.code(), "consistency_violation");
        // the trade and the halt
        assert_eq!(h.journal.len(), journaled + 2);
        assert_eq!(
            h.engine.position(&market, &alice, &OutcomeId::from("yes")),
            dec!(10)
        );
        assert!(h.engine.snapshot(&market).unwrap().halted.is_some());
        let events = h.events.events();
        assert!(matches!(
            events.as_slice(),
            [Event::TradeExecuted(trade), Event::MarketHalted { .. }] if trade.gp_delta == -5
        ));
    }
}
