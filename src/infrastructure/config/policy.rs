//! Trade policy configuration.

use serde::{Deserialize, Serialize};

use crate::domain::policy::{RoundingMode, StandardPolicy};

/// Rounding and redemption settings for [`StandardPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Rounding of buy costs (default: `half_up`).
    #[serde(default = "default_buy_rounding")]
    pub buy_rounding: RoundingMode,
    /// Rounding of sell proceeds (default: `down`).
    #[serde(default = "default_sell_rounding")]
    pub sell_rounding: RoundingMode,
    /// GP redeemed per winning share (default: 1).
    #[serde(default = "default_payout_per_share")]
    pub payout_per_share: i64,
}

const fn default_buy_rounding() -> RoundingMode {
    RoundingMode::HalfUp
}

const fn default_sell_rounding() -> RoundingMode {
    RoundingMode::Down
}

const fn default_payout_per_share() -> i64 {
    1
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            buy_rounding: default_buy_rounding(),
            sell_rounding: default_sell_rounding(),
            payout_per_share: default_payout_per_share(),
        }
    }
}

impl From<PolicyConfig> for StandardPolicy {
    fn from(config: PolicyConfig) -> Self {
        Self::new(
            config.buy_rounding,
            config.sell_rounding,
            config.payout_per_share,
        )
    }
}
