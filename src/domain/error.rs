//! Domain validation errors for core domain types.
//!
//! These errors are returned when caller input violates a domain invariant,
//! for example a trade for zero shares or a market with a single outcome.
//! They are the `InvalidInput` class of failures: never retried, and never
//! accompanied by a state change.
//!
//! # Examples
//!
//! ```
//! use gpmarket::domain::error::DomainError;
//! use gpmarket::domain::pricing::Lmsr;
//!
//! let result = Lmsr::new(0.0);
//! assert!(matches!(result, Err(DomainError::NonPositiveLiquidity { .. })));
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use super::id::OutcomeId;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Trade sizes must be strictly positive.
    #[error("shares must be positive, got {shares}")]
    NonPositiveShares {
        /// The invalid share quantity that was provided.
        shares: Decimal,
    },

    /// The outcome does not belong to the market.
    #[error("unknown outcome '{outcome_id}'")]
    UnknownOutcome {
        /// The outcome that was not found.
        outcome_id: OutcomeId,
    },

    /// The liquidity parameter `b` must be strictly positive.
    #[error("liquidity parameter must be positive, got {liquidity}")]
    NonPositiveLiquidity {
        /// The invalid liquidity parameter.
        liquidity: String,
    },

    /// The liquidity parameter is below the configured floor.
    #[error("liquidity parameter {liquidity} is below the minimum {minimum}")]
    LiquidityBelowMinimum {
        /// The requested liquidity parameter.
        liquidity: Decimal,
        /// The configured minimum.
        minimum: Decimal,
    },

    /// Markets need at least two outcomes.
    #[error("markets need at least 2 outcomes, got {count}")]
    TooFewOutcomes {
        /// Number of outcomes supplied.
        count: usize,
    },

    /// Outcome ids must be unique within a market.
    #[error("duplicate outcome '{outcome_id}'")]
    DuplicateOutcome {
        /// The repeated outcome id.
        outcome_id: OutcomeId,
    },

    /// The close time must be strictly after creation.
    #[error("close time {close_time} must be after creation time {created_at}")]
    CloseTimeNotAfterCreation {
        /// When the market was created.
        created_at: DateTime<Utc>,
        /// The requested close time.
        close_time: DateTime<Utc>,
    },

    /// A required text field was blank.
    #[error("{field} cannot be empty")]
    EmptyField {
        /// Name of the blank field.
        field: &'static str,
    },

    /// A numeric input or intermediate was NaN or infinite.
    #[error("non-finite value in {context}")]
    NonFinite {
        /// Where the value appeared.
        context: &'static str,
    },

    /// A quantity exceeded the representable range.
    #[error("quantity out of range in {context}")]
    QuantityOutOfRange {
        /// Where the overflow occurred.
        context: &'static str,
    },

    /// A pricing delta was negative or non-finite.
    #[error("pricing delta must be a finite non-negative quantity, got {delta}")]
    InvalidDelta {
        /// The rejected delta.
        delta: String,
    },

    /// An outcome index does not address the share vector.
    #[error("outcome index {index} out of range for {count} outcomes")]
    OutcomeIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the share vector.
        count: usize,
    },

    /// Adjustments must move a non-zero amount of GP.
    #[error("adjustment amount cannot be zero")]
    ZeroAdjustment,
}
