//! Journal port for durable commits.
//!
//! Every atomic unit the engine performs (create a market, commit a trade,
//! adjust a wallet, close, settle, halt) is described by exactly one
//! [`JournalRecord`]. The engine appends the record while still holding the
//! locks for that unit and only mutates in-memory state after the append
//! succeeds, so the journal is the commit point. Replaying the records in
//! order rebuilds the full engine state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::{MarketId, OutcomeId};
use crate::domain::ledger::LedgerEntry;
use crate::domain::market::{Market, MarketStatus};
use crate::domain::trade::TradeRecord;
use crate::error::Result;

/// One committed unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalRecord {
    /// A market was registered.
    MarketCreated { market: Market },
    /// A buy or sell was committed.
    TradeCommitted { trade: TradeRecord },
    /// An operator adjustment was applied to a wallet.
    Adjusted {
        entry: LedgerEntry,
        #[serde(default)]
        note: String,
    },
    /// An OPEN market stopped trading.
    MarketClosed {
        market_id: MarketId,
        closed_at: DateTime<Utc>,
    },
    /// A market reached a terminal state and its settlement was applied.
    MarketSettled {
        market_id: MarketId,
        status: MarketStatus,
        winning_outcome: Option<OutcomeId>,
        entries: Vec<LedgerEntry>,
        settled_at: DateTime<Utc>,
    },
    /// Trading was blocked after a consistency violation.
    MarketHalted { market_id: MarketId, reason: String },
    /// An operator cleared a halt after reconciliation.
    HaltCleared { market_id: MarketId },
}

impl JournalRecord {
    /// Stable record kind, used as the storage discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MarketCreated { .. } => "market_created",
            Self::TradeCommitted { .. } => "trade_committed",
            Self::Adjusted { .. } => "adjusted",
            Self::MarketClosed { .. } => "market_closed",
            Self::MarketSettled { .. } => "market_settled",
            Self::MarketHalted { .. } => "market_halted",
            Self::HaltCleared { .. } => "halt_cleared",
        }
    }

    /// The market this record belongs to, if any.
    #[must_use]
    pub fn market_id(&self) -> Option<&MarketId> {
        match self {
            Self::MarketCreated { market } => Some(market.id()),
            Self::TradeCommitted { trade } => Some(&trade.market_id),
            Self::Adjusted { .. } => None,
            Self::MarketClosed { market_id, .. }
            | Self::MarketSettled { market_id, .. }
            | Self::MarketHalted { market_id, .. }
            | Self::HaltCleared { market_id } => Some(market_id),
        }
    }
}

/// Append-only durable log of committed records.
///
/// `append` must be atomic: after it returns `Ok` the record survives a
/// crash, after it returns `Err` the record must not be replayed.
/// Implementations are called while engine locks are held and must not
/// call back into the engine.
pub trait Journal: Send + Sync {
    /// Durably append one record.
    fn append(&self, record: &JournalRecord) -> Result<()>;

    /// All records in commit order.
    fn replay(&self) -> Result<Vec<JournalRecord>>;
}
