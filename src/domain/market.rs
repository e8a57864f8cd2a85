//! Market-related domain types.
//!
//! - [`Market`] - A prediction market with N outcomes and its AMM share state
//! - [`Outcome`] - A single tradeable outcome and its share count `q_i`
//! - [`MarketStatus`] - Lifecycle state (OPEN, CLOSED, RESOLVED, INVALID)
//! - [`NewMarket`] - Validated input for market creation
//! - [`MarketSnapshot`] - Read-only view published after every commit

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, OutcomeId};
use super::pricing::{to_f64, Lmsr};

/// Lifecycle state of a market.
///
/// Transitions are monotonic: `Open -> Closed -> Resolved | Invalid`, with
/// `Open -> Resolved | Invalid` allowed as an implicit close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    /// Accepting trades.
    Open,
    /// Trading stopped, awaiting resolution.
    Closed,
    /// Settled with a winning outcome.
    Resolved,
    /// Voided; all participants refunded.
    Invalid,
}

impl MarketStatus {
    /// Returns true for states that accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Invalid)
    }

    /// Stable uppercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Resolved => "RESOLVED",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            "RESOLVED" => Ok(Self::Resolved),
            "INVALID" => Ok(Self::Invalid),
            other => Err(format!("unknown market status '{other}'")),
        }
    }
}

/// A single outcome within a market.
///
/// `share_count` is the AMM's quantity state `q_i`. It equals the aggregate
/// net position in this outcome because trades carry no fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    id: OutcomeId,
    name: String,
    share_count: Decimal,
}

impl Outcome {
    /// Create a new outcome with no outstanding shares.
    pub fn new(id: OutcomeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            share_count: Decimal::ZERO,
        }
    }

    /// Get the outcome ID.
    #[must_use]
    pub const fn id(&self) -> &OutcomeId {
        &self.id
    }

    /// Get the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the AMM share count `q_i`.
    #[must_use]
    pub const fn share_count(&self) -> Decimal {
        self.share_count
    }
}

/// Input for creating a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMarket {
    /// Unique URL slug.
    pub slug: String,
    /// Headline question.
    pub title: String,
    /// Long-form resolution criteria.
    pub description: String,
    /// Browsing category.
    pub category: String,
    /// Liquidity parameter `b`.
    pub liquidity: Decimal,
    /// When trading stops automatically.
    pub close_time: DateTime<Utc>,
    /// Outcomes in display order.
    pub outcomes: Vec<(OutcomeId, String)>,
}

/// A prediction market and its AMM state.
///
/// The market is the only writer of its outcomes' share counts. All
/// mutation goes through crate-internal methods called by the engine while
/// it holds the market's lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    id: MarketId,
    slug: String,
    title: String,
    description: String,
    category: String,
    liquidity: Decimal,
    outcomes: Vec<Outcome>,
    status: MarketStatus,
    created_at: DateTime<Utc>,
    close_time: DateTime<Utc>,
    resolved_outcome: Option<OutcomeId>,
    halted: Option<String>,
}

impl Market {
    /// Create a new OPEN market with domain invariant validation.
    ///
    /// # Domain Invariants
    ///
    /// - slug and title are not blank
    /// - liquidity `b` is strictly positive and convertible for pricing
    /// - at least two outcomes, with unique ids and non-blank names
    /// - `close_time` is strictly after `created_at`
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if any invariant is violated.
    pub fn try_new(
        id: MarketId,
        draft: NewMarket,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if draft.slug.trim().is_empty() {
            return Err(DomainError::EmptyField { field: "slug" });
        }
        if draft.title.trim().is_empty() {
            return Err(DomainError::EmptyField { field: "title" });
        }
        if draft.liquidity <= Decimal::ZERO {
            return Err(DomainError::NonPositiveLiquidity {
                liquidity: draft.liquidity.to_string(),
            });
        }
        Lmsr::new(to_f64(draft.liquidity, "liquidity parameter")?)?;

        if draft.outcomes.len() < 2 {
            return Err(DomainError::TooFewOutcomes {
                count: draft.outcomes.len(),
            });
        }
        let mut outcomes: Vec<Outcome> = Vec::with_capacity(draft.outcomes.len());
        for (outcome_id, name) in draft.outcomes {
            if outcome_id.as_str().trim().is_empty() {
                return Err(DomainError::EmptyField { field: "outcome id" });
            }
            if name.trim().is_empty() {
                return Err(DomainError::EmptyField {
                    field: "outcome name",
                });
            }
            if outcomes.iter().any(|o| o.id == outcome_id) {
                return Err(DomainError::DuplicateOutcome { outcome_id });
            }
            outcomes.push(Outcome::new(outcome_id, name));
        }

        if draft.close_time <= created_at {
            return Err(DomainError::CloseTimeNotAfterCreation {
                created_at,
                close_time: draft.close_time,
            });
        }

        Ok(Self {
            id,
            slug: draft.slug.trim().to_string(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            liquidity: draft.liquidity,
            outcomes,
            status: MarketStatus::Open,
            created_at,
            close_time: draft.close_time,
            resolved_outcome: None,
            halted: None,
        })
    }

    /// Get the market ID.
    #[must_use]
    pub const fn id(&self) -> &MarketId {
        &self.id
    }

    /// Get the URL slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Get the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Get the liquidity parameter `b`.
    #[must_use]
    pub const fn liquidity(&self) -> Decimal {
        self.liquidity
    }

    /// Get all outcomes in display order.
    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Get the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MarketStatus {
        self.status
    }

    /// Get the creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the scheduled close time.
    #[must_use]
    pub const fn close_time(&self) -> DateTime<Utc> {
        self.close_time
    }

    /// Get the winning outcome once resolved.
    #[must_use]
    pub fn resolved_outcome(&self) -> Option<&OutcomeId> {
        self.resolved_outcome.as_ref()
    }

    /// Get the halt reason if trading was blocked by a consistency failure.
    #[must_use]
    pub fn halted(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    /// Position of an outcome in the share vector.
    #[must_use]
    pub fn outcome_index(&self, outcome_id: &OutcomeId) -> Option<usize> {
        self.outcomes.iter().position(|o| &o.id == outcome_id)
    }

    /// Returns true once `now` has reached the scheduled close time.
    #[must_use]
    pub fn is_past_close(&self, now: DateTime<Utc>) -> bool {
        now >= self.close_time
    }

    /// Pricer for this market's liquidity parameter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if `b` cannot be used for pricing.
    pub fn pricer(&self) -> Result<Lmsr, DomainError> {
        Lmsr::new(to_f64(self.liquidity, "liquidity parameter")?)
    }

    /// The share vector `q` in the `f64` domain used by the cost function.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NonFinite` if a share count cannot be converted.
    pub fn share_vector(&self) -> Result<Vec<f64>, DomainError> {
        self.outcomes
            .iter()
            .map(|o| to_f64(o.share_count, "share vector"))
            .collect()
    }

    /// Implied probabilities in outcome order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the share state cannot be priced.
    pub fn implied_probabilities(&self) -> Result<Vec<f64>, DomainError> {
        self.pricer()?.prices(&self.share_vector()?)
    }

    /// Build the read-only view published to readers.
    #[must_use]
    pub fn snapshot(&self, version: u64) -> MarketSnapshot {
        let probabilities = self.implied_probabilities().ok();
        let outcomes = self
            .outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| OutcomeSnapshot {
                id: o.id.clone(),
                name: o.name.clone(),
                share_count: o.share_count,
                implied_probability: probabilities.as_ref().map_or(f64::NAN, |p| p[i]),
            })
            .collect();

        MarketSnapshot {
            id: self.id.clone(),
            slug: self.slug.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            liquidity: self.liquidity,
            status: self.status,
            created_at: self.created_at,
            close_time: self.close_time,
            resolved_outcome: self.resolved_outcome.clone(),
            halted: self.halted.clone(),
            outcomes,
            version,
        }
    }

    pub(crate) fn set_share_count(&mut self, index: usize, share_count: Decimal) {
        self.outcomes[index].share_count = share_count;
    }

    pub(crate) fn close(&mut self) {
        if self.status == MarketStatus::Open {
            self.status = MarketStatus::Closed;
        }
    }

    pub(crate) fn settle(&mut self, winner: Option<OutcomeId>) {
        self.status = if winner.is_some() {
            MarketStatus::Resolved
        } else {
            MarketStatus::Invalid
        };
        self.resolved_outcome = winner;
    }

    pub(crate) fn halt(&mut self, reason: impl Into<String>) {
        self.halted = Some(reason.into());
    }

    pub(crate) fn clear_halt(&mut self) {
        self.halted = None;
    }
}

/// Read-only view of one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeSnapshot {
    pub id: OutcomeId,
    pub name: String,
    pub share_count: Decimal,
    pub implied_probability: f64,
}

/// Read-only view of a market as of its latest commit.
///
/// `version` increases by one with every published commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub id: MarketId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub liquidity: Decimal,
    pub status: MarketStatus,
    pub created_at: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub resolved_outcome: Option<OutcomeId>,
    pub halted: Option<String>,
    pub outcomes: Vec<OutcomeSnapshot>,
    pub version: u64,
}

impl MarketSnapshot {
    /// Find an outcome by ID.
    #[must_use]
    pub fn outcome(&self, outcome_id: &OutcomeId) -> Option<&OutcomeSnapshot> {
        self.outcomes.iter().find(|o| &o.id == outcome_id)
    }
}

/// Catalogue filter for market listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketFilter {
    pub category: Option<String>,
    pub status: Option<MarketStatus>,
}

impl MarketFilter {
    /// Returns true if the snapshot passes every set criterion.
    #[must_use]
    pub fn matches(&self, snapshot: &MarketSnapshot) -> bool {
        let category_ok = self
            .category
            .as_ref()
            .map_or(true, |c| c.eq_ignore_ascii_case(&snapshot.category));
        let status_ok = self.status.map_or(true, |s| s == snapshot.status);
        category_ok && status_ok
    }
}
