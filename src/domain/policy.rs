//! Conversion of continuous LMSR amounts into integral GP.
//!
//! Wallet balances are whole GP while the cost function is continuous, so
//! every trade and payout passes through a [`TradePolicy`]. Rounding
//! directions and the redemption value of a winning share live here and
//! nowhere else.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rounding applied when converting a continuous amount to GP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round to nearest, ties away from zero.
    #[default]
    HalfUp,
    /// Round toward zero.
    Down,
    /// Round away from zero.
    Up,
}

impl RoundingMode {
    /// Apply the rounding to a non-negative amount.
    ///
    /// Returns `None` for negative, non-finite or unrepresentable values.
    #[must_use]
    pub fn apply(self, value: f64) -> Option<i64> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let rounded = match self {
            Self::HalfUp => value.round(),
            Self::Down => value.floor(),
            Self::Up => value.ceil(),
        };
        if rounded > i64::MAX as f64 {
            return None;
        }
        Some(rounded as i64)
    }

    /// Stable name used in config files and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HalfUp => "half_up",
            Self::Down => "down",
            Self::Up => "up",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts continuous trade amounts and terminal holdings into GP.
///
/// The engine only prices positive trades. Implementations must never
/// return a buy cost of zero, even when the continuous cost underflows to
/// 0, and must never credit more GP than the continuous amount plus
/// rounding tolerance allows.
pub trait TradePolicy: Send + Sync + fmt::Debug {
    /// GP debited for a positive buy whose continuous cost is `cost`.
    fn buy_cost_gp(&self, cost: f64) -> Option<i64>;

    /// GP credited for a sell whose continuous proceeds are `proceeds`.
    fn sell_proceeds_gp(&self, proceeds: f64) -> Option<i64>;

    /// GP redeemed for `shares` of the winning outcome at resolution.
    fn payout_gp(&self, shares: Decimal) -> Option<i64>;
}

/// Default policy: buys round half-up, sells round down, one winning share
/// redeems for `payout_per_share` GP (floored for fractional holdings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardPolicy {
    buy_rounding: RoundingMode,
    sell_rounding: RoundingMode,
    payout_per_share: i64,
}

impl StandardPolicy {
    /// Create a policy with explicit rounding and redemption value.
    #[must_use]
    pub const fn new(
        buy_rounding: RoundingMode,
        sell_rounding: RoundingMode,
        payout_per_share: i64,
    ) -> Self {
        Self {
            buy_rounding,
            sell_rounding,
            payout_per_share,
        }
    }

    /// Redemption value of one winning share.
    #[must_use]
    pub const fn payout_per_share(&self) -> i64 {
        self.payout_per_share
    }
}

impl Default for StandardPolicy {
    fn default() -> Self {
        Self::new(RoundingMode::HalfUp, RoundingMode::Down, 1)
    }
}

impl TradePolicy for StandardPolicy {
    fn buy_cost_gp(&self, cost: f64) -> Option<i64> {
        // shares are never free, however small the continuous cost
        self.buy_rounding.apply(cost).map(|gp| gp.max(1))
    }

    fn sell_proceeds_gp(&self, proceeds: f64) -> Option<i64> {
        self.sell_rounding.apply(proceeds)
    }

    fn payout_gp(&self, shares: Decimal) -> Option<i64> {
        if shares.is_sign_negative() {
            return None;
        }
        shares
            .checked_mul(Decimal::from(self.payout_per_share))?
            .floor()
            .to_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn half_up_rounds_ties_up() {
        assert_eq!(RoundingMode::HalfUp.apply(2.5), Some(3));
        assert_eq!(RoundingMode::HalfUp.apply(5.12), Some(5));
        assert_eq!(RoundingMode::HalfUp.apply(5.5), Some(6));
    }

    #[test]
    fn down_and_up_bracket_the_value() {
        assert_eq!(RoundingMode::Down.apply(5.99), Some(5));
        assert_eq!(RoundingMode::Up.apply(5.01), Some(6));
        assert_eq!(RoundingMode::Up.apply(5.0), Some(5));
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert_eq!(RoundingMode::Down.apply(-0.5), None);
        assert_eq!(RoundingMode::HalfUp.apply(f64::NAN), None);
        assert_eq!(RoundingMode::Up.apply(f64::INFINITY), None);
        assert_eq!(RoundingMode::Down.apply(1.0e30), None);
    }

    #[test]
    fn standard_policy_matches_reference_scenario() {
        let policy = StandardPolicy::default();
        assert_eq!(policy.buy_cost_gp(5.1249), Some(5));
        assert_eq!(policy.sell_proceeds_gp(5.1249), Some(5));
        assert_eq!(policy.sell_proceeds_gp(4.999), Some(4));
    }

    #[test]
    fn tiny_buys_cost_at_least_one_gp() {
        let policy = StandardPolicy::default();
        assert_eq!(policy.buy_cost_gp(0.2), Some(1));
        assert_eq!(policy.buy_cost_gp(0.0), Some(1));
        assert_eq!(policy.buy_cost_gp(f64::MIN_POSITIVE), Some(1));
        assert_eq!(policy.buy_cost_gp(f64::NAN), None);
    }

    #[test]
    fn payout_redeems_whole_shares() {
        let policy = StandardPolicy::default();
        assert_eq!(policy.payout_gp(dec!(7)), Some(7));
        assert_eq!(policy.payout_gp(dec!(7.9)), Some(7));
        assert_eq!(policy.payout_gp(dec!(0)), Some(0));
        assert_eq!(policy.payout_gp(dec!(-1)), None);
    }

    #[test]
    fn payout_scales_with_share_value() {
        let policy = StandardPolicy::new(RoundingMode::HalfUp, RoundingMode::Down, 10);
        assert_eq!(policy.payout_gp(dec!(2.55)), Some(25));
    }
}
