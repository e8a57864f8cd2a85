use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::id::MarketId;
use crate::domain::market::MarketStatus;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Business-rule rejections.
///
/// Each variant requires a different corrective action from the user, so
/// they are kept distinct all the way to the presentation layer. None of
/// them is retried automatically and none leaves a partial state change.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("market '{market}' not found")]
    MarketNotFound { market: String },

    #[error("market '{market_id}' is {status}, trading requires OPEN")]
    MarketClosed {
        market_id: MarketId,
        status: MarketStatus,
    },

    #[error("market '{market_id}' is halted pending reconciliation: {reason}")]
    MarketHalted { market_id: MarketId, reason: String },

    #[error("insufficient funds: need {required} GP, have {available} GP")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("insufficient shares: hold {held}, tried to sell {requested}")]
    InsufficientShares { held: Decimal, requested: Decimal },

    #[error("market '{market_id}' is already {status}")]
    AlreadyResolved {
        market_id: MarketId,
        status: MarketStatus,
    },

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("slug '{slug}' is already taken")]
    DuplicateSlug { slug: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error("consistency violation{}: {detail}", market_suffix(.market_id))]
    ConsistencyViolation {
        market_id: Option<MarketId>,
        detail: String,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn market_suffix(market_id: &Option<MarketId>) -> String {
    market_id
        .as_ref()
        .map(|m| format!(" in market {m}"))
        .unwrap_or_default()
}

impl Error {
    /// Build a consistency violation.
    pub fn consistency(market_id: Option<MarketId>, detail: impl Into<String>) -> Self {
        Self::ConsistencyViolation {
            market_id,
            detail: detail.into(),
        }
    }

    /// Returns true for internal invariant failures.
    #[must_use]
    pub const fn is_consistency_violation(&self) -> bool {
        matches!(self, Self::ConsistencyViolation { .. })
    }

    /// Stable machine-readable code for presentation layers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Domain(_) => "invalid_input",
            Self::Trade(trade) => match trade {
                TradeError::MarketNotFound { .. } => "market_not_found",
                TradeError::MarketClosed { .. } => "market_closed",
                TradeError::MarketHalted { .. } => "market_halted",
                TradeError::InsufficientFunds { .. } => "insufficient_funds",
                TradeError::InsufficientShares { .. } => "insufficient_shares",
                TradeError::AlreadyResolved { .. } => "already_resolved",
                TradeError::Unauthorized { .. } => "unauthorized",
                TradeError::DuplicateSlug { .. } => "duplicate_slug",
            },
            Self::ConsistencyViolation { .. } => "consistency_violation",
            Self::Json(_) | Self::Io(_) | Self::Connection(_) | Self::Database(_) => "storage",
        }
    }

    /// The business-rule rejection, if this is one.
    #[must_use]
    pub const fn as_trade(&self) -> Option<&TradeError> {
        match self {
            Self::Trade(trade) => Some(trade),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn funds_and_closed_have_distinct_codes() {
        let funds: Error = TradeError::InsufficientFunds {
            required: 10,
            available: 3,
        }
        .into();
        let closed: Error = TradeError::MarketClosed {
            market_id: MarketId::from("m1"),
            status: MarketStatus::Closed,
        }
        .into();
        assert_eq!(funds.code(), "insufficient_funds");
        assert_eq!(closed.code(), "market_closed");
        assert_eq!(
            funds.to_string(),
            "insufficient funds: need 10 GP, have 3 GP"
        );
    }

    #[test]
    fn domain_errors_are_invalid_input() {
        let err: Error = DomainError::NonPositiveShares { shares: dec!(0) }.into();
        assert_eq!(err.code(), "invalid_input");
        assert!(err.to_string().starts_with("invalid input"));
    }

    #[test]
    fn consistency_message_names_market() {
        let err = Error::consistency(Some(MarketId::from("m9")), "ledger sum mismatch");
        assert!(err.is_consistency_violation());
        assert_eq!(
            err.to_string(),
            "consistency violation in market m9: ledger sum mismatch"
        );
        let err = Error::consistency(None, "bad");
        assert_eq!(err.to_string(), "consistency violation: bad");
    }
}
