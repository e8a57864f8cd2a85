//! Trading service boundary consumed by inbound adapters.
//!
//! This is the whole contract an API or UI layer needs: submit trades,
//! resolve markets, and read snapshots, balances and ledger pages. The
//! shape of the transport on top of it is left to the adapter.

use std::sync::Arc;

use crate::domain::id::{MarketId, OutcomeId, UserId};
use crate::domain::ledger::{HistoryCursor, LedgerPage};
use crate::domain::market::MarketSnapshot;
use crate::domain::settlement::SettlementReport;
use crate::domain::trade::{TradeReceipt, TradeRequest};
use crate::error::{Result, TradeError};

/// Verdict of the external authorization collaborator.
///
/// The engine never authenticates anyone. It only refuses privileged
/// operations when the caller's verdict is not [`Authorization::Admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// The actor may resolve and invalidate markets.
    Admin,
    /// The actor was refused, with the collaborator's reason.
    Denied(String),
}

impl Authorization {
    /// Pass the verdict through as a typed failure.
    ///
    /// # Errors
    ///
    /// Returns `TradeError::Unauthorized` for a denied actor.
    pub fn require_admin(&self) -> std::result::Result<(), TradeError> {
        match self {
            Self::Admin => Ok(()),
            Self::Denied(reason) => Err(TradeError::Unauthorized {
                reason: reason.clone(),
            }),
        }
    }
}

/// Trading use-cases.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Calls on different markets run
/// in parallel; calls on the same market are serialized.
pub trait TradingService: Send + Sync {
    /// Buy or sell shares of one outcome.
    ///
    /// # Errors
    ///
    /// Returns a typed failure and leaves no partial state change.
    fn submit_trade(&self, request: TradeRequest) -> Result<TradeReceipt>;

    /// Resolve a market with a winner, or declare it invalid with `None`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for a denied actor and `AlreadyResolved` for a
    /// market that was settled before.
    fn resolve_market(
        &self,
        auth: &Authorization,
        market_id: &MarketId,
        winning_outcome: Option<OutcomeId>,
    ) -> Result<SettlementReport>;

    /// Latest committed view of a market.
    ///
    /// # Errors
    ///
    /// Returns `MarketNotFound` for an unknown market.
    fn market_snapshot(&self, market_id: &MarketId) -> Result<Arc<MarketSnapshot>>;

    /// Current GP balance; zero for users that never transacted.
    fn wallet_balance(&self, user_id: &UserId) -> i64;

    /// One page of ledger history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying read fails.
    fn ledger_page(&self, user_id: &UserId, cursor: Option<HistoryCursor>) -> Result<LedgerPage>;
}
