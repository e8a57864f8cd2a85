//! Wallet ledger entry types.
//!
//! Ledger entries are immutable once written. A user's balance is always
//! the sum of `amount_gp` over that user's entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{LedgerEntryId, MarketId, UserId};

/// Reason a ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    /// GP paid for shares.
    TradeBuy,
    /// GP received for shares sold back to the market maker.
    TradeSell,
    /// Winning shares redeemed at resolution.
    ResolutionPayout,
    /// Net trading spend returned when a market is voided.
    InvalidRefund,
    /// Operator grant or correction.
    Adjustment,
}

impl EntryKind {
    /// Stable uppercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TradeBuy => "TRADE_BUY",
            Self::TradeSell => "TRADE_SELL",
            Self::ResolutionPayout => "RESOLUTION_PAYOUT",
            Self::InvalidRefund => "INVALID_REFUND",
            Self::Adjustment => "ADJUSTMENT",
        }
    }

    /// Returns true for entries produced by buying or selling shares.
    #[must_use]
    pub const fn is_trade(self) -> bool {
        matches!(self, Self::TradeBuy | Self::TradeSell)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable GP movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: LedgerEntryId,
    user_id: UserId,
    kind: EntryKind,
    amount_gp: i64,
    market_id: Option<MarketId>,
    created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new ledger entry.
    #[must_use]
    pub fn new(
        id: LedgerEntryId,
        user_id: UserId,
        kind: EntryKind,
        amount_gp: i64,
        market_id: Option<MarketId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            kind,
            amount_gp,
            market_id,
            created_at,
        }
    }

    #[must_use]
    pub const fn id(&self) -> LedgerEntryId {
        self.id
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Signed GP amount: negative for debits.
    #[must_use]
    pub const fn amount_gp(&self) -> i64 {
        self.amount_gp
    }

    #[must_use]
    pub fn market_id(&self) -> Option<&MarketId> {
        self.market_id.as_ref()
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Opaque pagination cursor for ledger history.
///
/// A page fetched with a cursor holds only entries older than the cursor,
/// so pagination is stateless and can be restarted from any cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryCursor(LedgerEntryId);

impl HistoryCursor {
    /// Cursor pointing just past `entry` (exclusive).
    #[must_use]
    pub const fn before(entry: LedgerEntryId) -> Self {
        Self(entry)
    }

    /// The exclusive upper bound of the next page.
    #[must_use]
    pub const fn bound(&self) -> LedgerEntryId {
        self.0
    }
}

impl fmt::Display for HistoryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HistoryCursor {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<LedgerEntryId>().map(Self)
    }
}

/// One page of ledger history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    /// Cursor for the next (older) page, `None` when history is exhausted.
    pub next_cursor: Option<HistoryCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_kind_names_are_stable() {
        assert_eq!(EntryKind::TradeBuy.as_str(), "TRADE_BUY");
        assert_eq!(EntryKind::InvalidRefund.to_string(), "INVALID_REFUND");
        assert!(EntryKind::TradeSell.is_trade());
        assert!(!EntryKind::ResolutionPayout.is_trade());
    }

    #[test]
    fn entry_kind_serializes_uppercase() {
        let json = serde_json::to_string(&EntryKind::ResolutionPayout).unwrap();
        assert_eq!(json, "\"RESOLUTION_PAYOUT\"");
    }

    #[test]
    fn cursor_parses_its_display_form() {
        let cursor = HistoryCursor::before(LedgerEntryId::new(12));
        let parsed: HistoryCursor = cursor.to_string().parse().unwrap();
        assert_eq!(parsed, cursor);
        assert_eq!(parsed.bound().value(), 12);
    }
}
