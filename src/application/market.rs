//! Per-market state cell.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::domain::market::{Market, MarketSnapshot};

/// One market's exclusive state plus its last published snapshot.
///
/// Every mutation of the market (share vector, its position rows, status,
/// settlement) happens while `state` is locked. After each commit the
/// writer publishes a fresh snapshot so readers never wait on `state`.
#[derive(Debug)]
pub(crate) struct MarketCell {
    state: Mutex<Market>,
    published: RwLock<Arc<MarketSnapshot>>,
}

impl MarketCell {
    pub(crate) fn new(market: Market) -> Self {
        let snapshot = Arc::new(market.snapshot(1));
        Self {
            state: Mutex::new(market),
            published: RwLock::new(snapshot),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Market> {
        self.state.lock()
    }

    pub(crate) fn snapshot(&self) -> Arc<MarketSnapshot> {
        Arc::clone(&self.published.read())
    }

    /// Publish the committed state of `market`.
    ///
    /// Must be called with `state` locked so versions stay ordered.
    pub(crate) fn publish(&self, market: &Market) -> Arc<MarketSnapshot> {
        let version = self.published.read().version + 1;
        let snapshot = Arc::new(market.snapshot(version));
        *self.published.write() = Arc::clone(&snapshot);
        snapshot
    }
}
