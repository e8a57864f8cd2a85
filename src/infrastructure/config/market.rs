//! Market creation defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market creation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarketConfig {
    /// Liquidity parameter `b` used when a market is created without one.
    #[serde(default = "default_liquidity")]
    pub default_liquidity: Decimal,
    /// Smallest accepted liquidity parameter.
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity: Decimal,
}

fn default_liquidity() -> Decimal {
    Decimal::from(100)
}

fn default_min_liquidity() -> Decimal {
    Decimal::ONE
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            default_liquidity: default_liquidity(),
            min_liquidity: default_min_liquidity(),
        }
    }
}
