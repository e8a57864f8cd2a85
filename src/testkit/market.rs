//! Builders for market drafts.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::id::OutcomeId;
use crate::domain::market::NewMarket;

/// Fluent builder for [`NewMarket`].
///
/// Defaults: two outcomes `yes`/`no`, liquidity 100, category `general`,
/// closing seven days after the `opened_at` instant.
#[derive(Debug, Clone)]
pub struct MarketDraft {
    draft: NewMarket,
}

impl MarketDraft {
    /// A YES/NO market opened at `opened_at`.
    pub fn binary(slug: &str, opened_at: DateTime<Utc>) -> Self {
        Self {
            draft: NewMarket {
                slug: slug.to_string(),
                title: format!("Will {slug} happen?"),
                description: String::new(),
                category: "general".to_string(),
                liquidity: Decimal::from(100),
                close_time: opened_at + Duration::days(7),
                outcomes: vec![
                    (OutcomeId::from("yes"), "Yes".to_string()),
                    (OutcomeId::from("no"), "No".to_string()),
                ],
            },
        }
    }

    /// A market with one outcome per id, named after the id.
    pub fn with_outcomes(slug: &str, opened_at: DateTime<Utc>, ids: &[&str]) -> Self {
        let mut builder = Self::binary(slug, opened_at);
        builder.draft.outcomes = ids
            .iter()
            .map(|id| (OutcomeId::from(*id), (*id).to_string()))
            .collect();
        builder
    }

    pub fn liquidity(mut self, liquidity: Decimal) -> Self {
        self.draft.liquidity = liquidity;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.draft.category = category.to_string();
        self
    }

    pub fn close_time(mut self, close_time: DateTime<Utc>) -> Self {
        self.draft.close_time = close_time;
        self
    }

    pub fn build(self) -> NewMarket {
        self.draft
    }
}
