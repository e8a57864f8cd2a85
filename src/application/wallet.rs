//! Wallet ledger.
//!
//! Each user has one [`WalletAccount`] holding the append-only list of
//! their ledger entries and the cached balance projection. The account is
//! the only place a balance is written, and it is only written by
//! appending an entry.
//!
//! Appending is split in two steps so the engine can journal between them:
//! [`WalletLedger::draft`] validates a movement and allocates the entry id,
//! [`WalletAccount::apply`] appends it and moves the balance.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};

use crate::domain::id::{LedgerEntryId, MarketId, UserId};
use crate::domain::ledger::{EntryKind, HistoryCursor, LedgerEntry, LedgerPage};
use crate::error::{Error, Result, TradeError};

/// Largest ledger page a caller may request.
pub const MAX_PAGE_SIZE: usize = 500;

/// One user's ledger and balance projection.
#[derive(Debug, Default)]
pub struct WalletAccount {
    balance_gp: i64,
    /// Ascending by id.
    entries: Vec<LedgerEntry>,
}

impl WalletAccount {
    /// Cached balance.
    #[must_use]
    pub const fn balance_gp(&self) -> i64 {
        self.balance_gp
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Authoritative balance: the sum over every entry.
    #[must_use]
    pub fn ledger_sum(&self) -> i128 {
        self.entries.iter().map(|e| i128::from(e.amount_gp())).sum()
    }

    /// Returns true if the cached balance equals the ledger sum.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.ledger_sum() == i128::from(self.balance_gp)
    }

    /// Net GP this user put into `market_id` through trades.
    ///
    /// Positive when buys exceeded sells.
    #[must_use]
    pub fn net_trade_spend(&self, market_id: &MarketId) -> i64 {
        -self
            .entries
            .iter()
            .filter(|e| e.kind().is_trade() && e.market_id() == Some(market_id))
            .map(LedgerEntry::amount_gp)
            .sum::<i64>()
    }

    /// Distinct markets this account has entries in.
    #[must_use]
    pub fn markets(&self) -> Vec<MarketId> {
        let mut markets: Vec<MarketId> =
            self.entries.iter().filter_map(|e| e.market_id().cloned()).collect();
        markets.sort();
        markets.dedup();
        markets
    }

    /// Append a drafted entry and move the balance by its amount.
    ///
    /// Infallible: the draft already checked funds and overflow against this
    /// account while the same lock was held.
    pub(crate) fn apply(&mut self, entry: LedgerEntry) {
        self.balance_gp += entry.amount_gp();
        self.entries.push(entry);
    }

    /// Move the cached balance without a ledger entry.
    #[cfg(test)]
    pub(crate) fn skew_balance(&mut self, by: i64) {
        self.balance_gp += by;
    }

    fn page(&self, cursor: Option<HistoryCursor>, limit: usize) -> LedgerPage {
        let end = cursor.map_or(self.entries.len(), |c| {
            self.entries.partition_point(|e| e.id() < c.bound())
        });
        let start = end.saturating_sub(limit.max(1));
        let entries: Vec<LedgerEntry> = self.entries[start..end].iter().rev().cloned().collect();
        let next_cursor = (start > 0).then(|| HistoryCursor::before(self.entries[start].id()));
        LedgerPage {
            entries,
            next_cursor,
        }
    }
}

/// Shared handle to one account. Lock it to read or append.
pub type AccountHandle = Arc<Mutex<WalletAccount>>;

/// All wallet accounts plus the global ledger id sequence.
#[derive(Debug)]
pub struct WalletLedger {
    accounts: DashMap<UserId, AccountHandle>,
    next_entry_id: AtomicU64,
    page_size: usize,
}

impl WalletLedger {
    /// Create an empty ledger with the default history page size.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            accounts: DashMap::new(),
            next_entry_id: AtomicU64::new(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Default history page size.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Handle to a user's account, creating an empty one if needed.
    pub fn account(&self, user_id: &UserId) -> AccountHandle {
        Arc::clone(&self.accounts.entry(user_id.clone()).or_default())
    }

    /// Handle to an existing account.
    #[must_use]
    pub fn existing(&self, user_id: &UserId) -> Option<AccountHandle> {
        self.accounts.get(user_id).map(|a| Arc::clone(&a))
    }

    /// Current cached balance; zero for unknown users.
    #[must_use]
    pub fn balance(&self, user_id: &UserId) -> i64 {
        self.existing(user_id).map_or(0, |a| a.lock().balance_gp())
    }

    /// All known users, sorted.
    #[must_use]
    pub fn users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.accounts.iter().map(|a| a.key().clone()).collect();
        users.sort();
        users
    }

    /// Validate a GP movement against `account` and allocate its entry.
    ///
    /// The caller must hold `account`'s lock until the entry is applied.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if a debit would take the balance below
    /// zero, or a consistency violation if the balance would overflow.
    pub fn draft(
        &self,
        account: &WalletAccount,
        user_id: &UserId,
        kind: EntryKind,
        amount_gp: i64,
        market_id: Option<&MarketId>,
        created_at: DateTime<Utc>,
    ) -> Result<LedgerEntry> {
        let balance = account.balance_gp();
        let Some(next) = balance.checked_add(amount_gp) else {
            return Err(Error::consistency(
                market_id.cloned(),
                format!("balance of {user_id} would overflow"),
            ));
        };
        if next < 0 {
            return Err(TradeError::InsufficientFunds {
                required: amount_gp.saturating_neg(),
                available: balance,
            }
            .into());
        }
        Ok(LedgerEntry::new(
            self.allocate_id(),
            user_id.clone(),
            kind,
            amount_gp,
            market_id.cloned(),
            created_at,
        ))
    }

    /// Advance the id sequence past an entry restored from the journal.
    pub fn observe_entry_id(&self, id: LedgerEntryId) {
        self.next_entry_id
            .fetch_max(id.value().saturating_add(1), Ordering::SeqCst);
    }

    /// One page of a user's history, newest first.
    ///
    /// `limit` defaults to the configured page size and is capped at
    /// [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn page(
        &self,
        user_id: &UserId,
        cursor: Option<HistoryCursor>,
        limit: Option<usize>,
    ) -> LedgerPage {
        let limit = limit.unwrap_or(self.page_size).clamp(1, MAX_PAGE_SIZE);
        self.existing(user_id).map_or_else(
            || LedgerPage {
                entries: Vec::new(),
                next_cursor: None,
            },
            |a| a.lock().page(cursor, limit),
        )
    }

    /// Lazy newest-first iterator over a user's full history.
    #[must_use]
    pub fn history(&self, user_id: &UserId) -> LedgerHistory<'_> {
        LedgerHistory::new(self, user_id.clone(), None)
    }

    /// Resume a history walk from a cursor.
    #[must_use]
    pub fn history_from(&self, user_id: &UserId, cursor: HistoryCursor) -> LedgerHistory<'_> {
        LedgerHistory::new(self, user_id.clone(), Some(cursor))
    }

    fn allocate_id(&self) -> LedgerEntryId {
        LedgerEntryId::new(self.next_entry_id.fetch_add(1, Ordering::SeqCst))
    }
}

/// Newest-first walk over a user's ledger, fetched one page at a time.
///
/// Holds no lock between pages. Entries committed after the walk started
/// are not visited.
#[derive(Debug)]
pub struct LedgerHistory<'a> {
    ledger: &'a WalletLedger,
    user_id: UserId,
    buffer: VecDeque<LedgerEntry>,
    cursor: Option<HistoryCursor>,
    started: bool,
}

impl<'a> LedgerHistory<'a> {
    fn new(ledger: &'a WalletLedger, user_id: UserId, cursor: Option<HistoryCursor>) -> Self {
        Self {
            ledger,
            user_id,
            buffer: VecDeque::new(),
            cursor,
            started: false,
        }
    }

    /// Cursor from which the remaining entries can be fetched again.
    #[must_use]
    pub fn cursor(&self) -> Option<HistoryCursor> {
        self.buffer
            .front()
            .map(|e| HistoryCursor::before(LedgerEntryId::new(e.id().value() + 1)))
            .or(self.cursor)
    }
}

impl Iterator for LedgerHistory<'_> {
    type Item = LedgerEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            if self.started && self.cursor.is_none() {
                return None;
            }
            let page = self.ledger.page(&self.user_id, self.cursor, None);
            self.started = true;
            self.cursor = page.next_cursor;
            self.buffer.extend(page.entries);
        }
        self.buffer.pop_front()
    }
}

/// Account guards held together for a multi-user commit.
///
/// Guards are acquired in ascending [`UserId`] order, so two settlements
/// never wait on each other in opposite orders.
pub struct LockedAccounts<'a> {
    guards: Vec<(UserId, MutexGuard<'a, WalletAccount>)>,
}

impl<'a> LockedAccounts<'a> {
    /// Lock every handle in `handles` in user order.
    pub fn lock(handles: &'a [(UserId, AccountHandle)]) -> Self {
        let mut ordered: Vec<&'a (UserId, AccountHandle)> = handles.iter().collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));
        ordered.dedup_by(|a, b| a.0 == b.0);
        let guards = ordered
            .into_iter()
            .map(|(user, handle)| (user.clone(), handle.lock()))
            .collect();
        Self { guards }
    }

    /// Locked account for `user_id`.
    #[must_use]
    pub fn get(&self, user_id: &UserId) -> Option<&WalletAccount> {
        self.position(user_id).map(|i| &*self.guards[i].1)
    }

    /// Mutable locked account for `user_id`.
    pub fn get_mut(&mut self, user_id: &UserId) -> Option<&mut WalletAccount> {
        self.position(user_id).map(|i| &mut *self.guards[i].1)
    }

    /// Iterate `(user, account)` in user order.
    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &WalletAccount)> {
        self.guards.iter().map(|(u, g)| (u, &**g))
    }

    fn position(&self, user_id: &UserId) -> Option<usize> {
        self.guards.binary_search_by(|(u, _)| u.cmp(user_id)).ok()
    }
}
