//! Position store.
//!
//! Holds `(user, market, outcome) -> shares` rows. Rows for one market are
//! only written while that market's lock is held, so a read taken under the
//! same lock is a consistent point-in-time view. Reads without the market
//! lock (portfolios, UI lookups) see the latest committed value.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::id::{MarketId, OutcomeId, UserId};
use crate::domain::position::Holding;

/// Position rows of one market, keyed by user then outcome.
type Book = BTreeMap<UserId, BTreeMap<OutcomeId, Decimal>>;

/// Per-market position books plus a user index for portfolio lookups.
#[derive(Debug, Default)]
pub struct PositionStore {
    books: DashMap<MarketId, Arc<RwLock<Book>>>,
    markets_by_user: DashMap<UserId, BTreeSet<MarketId>>,
}

impl PositionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares held; zero if the row does not exist.
    #[must_use]
    pub fn get(&self, market_id: &MarketId, user_id: &UserId, outcome_id: &OutcomeId) -> Decimal {
        self.book(market_id).map_or(Decimal::ZERO, |book| {
            book.read()
                .get(user_id)
                .and_then(|row| row.get(outcome_id))
                .copied()
                .unwrap_or(Decimal::ZERO)
        })
    }

    /// Write a row, creating it on first use. Rows are never deleted.
    ///
    /// Called by the engine inside a trade's atomic unit with the new,
    /// already validated share count.
    pub(crate) fn set(
        &self,
        market_id: &MarketId,
        user_id: &UserId,
        outcome_id: &OutcomeId,
        shares: Decimal,
    ) {
        let book = Arc::clone(&self.books.entry(market_id.clone()).or_default());
        book.write()
            .entry(user_id.clone())
            .or_default()
            .insert(outcome_id.clone(), shares);
        self.markets_by_user
            .entry(user_id.clone())
            .or_default()
            .insert(market_id.clone());
    }

    /// All rows of a market, ordered by user then outcome.
    #[must_use]
    pub fn positions_for_market(&self, market_id: &MarketId) -> Vec<Holding> {
        self.book(market_id).map_or_else(Vec::new, |book| {
            book.read()
                .iter()
                .flat_map(|(user_id, row)| {
                    row.iter().map(move |(outcome_id, shares)| Holding {
                        user_id: user_id.clone(),
                        outcome_id: outcome_id.clone(),
                        shares: *shares,
                    })
                })
                .collect()
        })
    }

    /// Distinct users with at least one row in the market, sorted.
    #[must_use]
    pub fn users_in_market(&self, market_id: &MarketId) -> Vec<UserId> {
        self.book(market_id)
            .map_or_else(Vec::new, |book| book.read().keys().cloned().collect())
    }

    /// Net shares per outcome across every holder.
    #[must_use]
    pub fn outcome_totals(&self, market_id: &MarketId) -> BTreeMap<OutcomeId, Decimal> {
        let mut totals = BTreeMap::new();
        for holding in self.positions_for_market(market_id) {
            *totals.entry(holding.outcome_id).or_insert(Decimal::ZERO) += holding.shares;
        }
        totals
    }

    /// Zero every row of a market; returns how many rows held shares.
    pub(crate) fn clear_market(&self, market_id: &MarketId) -> usize {
        let Some(book) = self.book(market_id) else {
            return 0;
        };
        let mut book = book.write();
        let mut cleared = 0;
        for shares in book.values_mut().flat_map(BTreeMap::values_mut) {
            if !shares.is_zero() {
                cleared += 1;
            }
            *shares = Decimal::ZERO;
        }
        cleared
    }

    /// Non-zero rows of a user across every market.
    #[must_use]
    pub fn for_user(&self, user_id: &UserId) -> Vec<(MarketId, OutcomeId, Decimal)> {
        let markets: Vec<MarketId> = self
            .markets_by_user
            .get(user_id)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();

        let mut rows = Vec::new();
        for market_id in markets {
            let Some(book) = self.book(&market_id) else {
                continue;
            };
            let book = book.read();
            if let Some(row) = book.get(user_id) {
                rows.extend(
                    row.iter()
                        .filter(|(_, shares)| !shares.is_zero())
                        .map(|(outcome_id, shares)| {
                            (market_id.clone(), outcome_id.clone(), *shares)
                        }),
                );
            }
        }
        rows
    }

    fn book(&self, market_id: &MarketId) -> Option<Arc<RwLock<Book>>> {
        self.books.get(market_id).map(|b| Arc::clone(&b))
    }
}
