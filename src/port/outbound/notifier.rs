//! Notifier port for event notifications.
//!
//! This module defines the trait for publishing engine events to external
//! collaborators such as achievement, XP and leaderboard systems. Events
//! are emitted after the corresponding commit and outside any market lock.

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::id::{MarketId, OutcomeId, UserId};
use crate::domain::market::MarketStatus;
use crate::domain::trade::{TradeAction, TradeReceipt};

/// Events that can trigger notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A trade was committed.
    TradeExecuted(TradeEvent),
    /// A market reached RESOLVED or INVALID and was settled.
    MarketResolved(ResolutionEvent),
    /// A market stopped accepting trades.
    MarketClosed {
        /// The market that closed.
        market_id: MarketId,
    },
    /// A market was halted after a consistency violation.
    MarketHalted {
        /// The halted market.
        market_id: MarketId,
        /// Why trading was blocked.
        reason: String,
    },
}

/// Trade execution event.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub shares: Decimal,
    pub action: TradeAction,
    /// Signed wallet movement in GP.
    pub gp_delta: i64,
}

impl From<&TradeReceipt> for TradeEvent {
    fn from(receipt: &TradeReceipt) -> Self {
        Self {
            user_id: receipt.user_id.clone(),
            market_id: receipt.market_id.clone(),
            outcome_id: receipt.outcome_id.clone(),
            shares: receipt.shares,
            action: receipt.action,
            gp_delta: receipt.gp_delta,
        }
    }
}

/// Market resolution event.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionEvent {
    pub market_id: MarketId,
    /// Winning outcome, `None` when the market was declared invalid.
    pub outcome: Option<OutcomeId>,
    pub status: MarketStatus,
    /// Total GP credited by the settlement run.
    pub total_credited_gp: i64,
}

/// Trait for notification handlers.
///
/// Notifications are fire-and-forget and delivered at least once.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - The `notify` method should not block or perform slow I/O synchronously
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::TradeExecuted(e) => {
                info!(
                    user_id = %e.user_id,
                    market_id = %e.market_id,
                    outcome_id = %e.outcome_id,
                    action = %e.action,
                    shares = %e.shares,
                    gp_delta = e.gp_delta,
                    "Trade executed"
                );
            }
            Event::MarketResolved(e) => {
                info!(
                    market_id = %e.market_id,
                    status = %e.status,
                    outcome = e.outcome.as_ref().map_or("none", |o| o.as_str()),
                    credited_gp = e.total_credited_gp,
                    "Market resolved"
                );
            }
            Event::MarketClosed { market_id } => {
                info!(market_id = %market_id, "Market closed");
            }
            Event::MarketHalted { market_id, reason } => {
                warn!(market_id = %market_id, reason = %reason, "Market halted");
            }
        }
    }
}
