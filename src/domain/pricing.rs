//! Logarithmic market scoring rule (LMSR) pricing.
//!
//! For share vector `q` and liquidity `b`:
//!
//! - Cost function: `C(q) = b * ln(sum(exp(q_i / b)))`
//! - Implied probability: `p_i = exp(q_i / b) / sum(exp(q_j / b))`
//! - Cost to buy `d` of outcome `i`: `C(q + d*e_i) - C(q)`
//! - Proceeds from selling `d` of outcome `i`: `C(q) - C(q - d*e_i)`
//!
//! Everything here is pure. `C` is evaluated with the log-sum-exp shift so
//! large share counts never overflow. Trade deltas use the equivalent closed
//! form `b * ln(1 + p_i * (exp(d / b) - 1))`, which avoids subtracting two
//! large, nearly equal cost values. The closed form is evaluated from
//! log-probabilities, so neither a trade far larger than `b` nor a price
//! that has rounded to 0 or 1 leaves the finite range.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::error::DomainError;

/// LMSR pricing for one market's liquidity parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lmsr {
    liquidity: f64,
}

impl Lmsr {
    /// Create a pricer for liquidity parameter `b`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if `b` is not finite or not strictly positive.
    pub fn new(liquidity: f64) -> Result<Self, DomainError> {
        if !liquidity.is_finite() {
            return Err(DomainError::NonFinite {
                context: "liquidity parameter",
            });
        }
        if liquidity <= 0.0 {
            return Err(DomainError::NonPositiveLiquidity {
                liquidity: liquidity.to_string(),
            });
        }
        Ok(Self { liquidity })
    }

    /// Get the liquidity parameter `b`.
    #[must_use]
    pub const fn liquidity(&self) -> f64 {
        self.liquidity
    }

    /// Evaluate the cost function `C(q)`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if `q` is empty or holds non-finite values.
    pub fn cost(&self, q: &[f64]) -> Result<f64, DomainError> {
        let shift = max_share(q)?;
        let sum: f64 = q
            .iter()
            .map(|&q_i| ((q_i - shift) / self.liquidity).exp())
            .sum();
        finite(self.liquidity * sum.ln() + shift, "cost function")
    }

    /// Implied probabilities for every outcome, in outcome order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if `q` is empty or holds non-finite values.
    pub fn prices(&self, q: &[f64]) -> Result<Vec<f64>, DomainError> {
        let shift = max_share(q)?;
        let weights: Vec<f64> = q
            .iter()
            .map(|&q_i| ((q_i - shift) / self.liquidity).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        weights
            .into_iter()
            .map(|w| finite(w / total, "implied probability"))
            .collect()
    }

    /// Implied probability of outcome `index`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if `index` is out of range or `q` is invalid.
    pub fn price(&self, q: &[f64], index: usize) -> Result<f64, DomainError> {
        check_index(q, index)?;
        Ok(self.prices(q)?[index])
    }

    /// Cost of buying `delta` shares of outcome `index`.
    ///
    /// Zero for `delta == 0`, strictly positive, increasing and convex in `delta`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` for a negative or non-finite delta, a bad index,
    /// an invalid share vector, or a cost too large to represent.
    pub fn cost_to_buy(&self, q: &[f64], index: usize, delta: f64) -> Result<f64, DomainError> {
        check_delta(delta)?;
        let (log_p, _) = self.log_split(q, index)?;
        if delta == 0.0 {
            return Ok(0.0);
        }
        // ln(p * (exp(r) - 1)), then b * ln(1 + exp(x))
        let r = delta / self.liquidity;
        let x = log_p + r + (-(-r).exp_m1()).ln();
        finite(self.liquidity * softplus(x), "buy cost")
    }

    /// Proceeds from selling `delta` shares of outcome `index`.
    ///
    /// Never consults positions: the caller has already checked that the
    /// seller holds at least `delta`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` for a negative or non-finite delta, a bad index,
    /// an invalid share vector, or proceeds too large to represent.
    pub fn proceeds_from_sell(
        &self,
        q: &[f64],
        index: usize,
        delta: f64,
    ) -> Result<f64, DomainError> {
        check_delta(delta)?;
        let (log_p, log_rest) = self.log_split(q, index)?;
        if delta == 0.0 {
            return Ok(0.0);
        }
        let r = delta / self.liquidity;
        // fraction of the pool's weight removed by the sale, in (0, 1]
        let removed = log_p.exp() * -(-r).exp_m1();
        let log_kept = if removed < 0.5 {
            (-removed).ln_1p()
        } else {
            // (1 - p) + p * exp(-r), without cancelling against 1
            log_add_exp(log_rest, log_p - r)
        };
        finite(-self.liquidity * log_kept, "sell proceeds")
    }

    /// `ln(p_i)` and `ln(1 - p_i)` for outcome `index`.
    fn log_split(&self, q: &[f64], index: usize) -> Result<(f64, f64), DomainError> {
        check_index(q, index)?;
        let shift = max_share(q)?;
        let scaled: Vec<f64> = q.iter().map(|&q_i| (q_i - shift) / self.liquidity).collect();
        let log_total = log_sum_exp(scaled.iter().copied());
        let log_rest = log_sum_exp(
            scaled
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != index)
                .map(|(_, z)| *z),
        );
        Ok((scaled[index] - log_total, log_rest - log_total))
    }
}

/// `ln(sum(exp(z)))`; negative infinity for an empty input.
fn log_sum_exp(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let shift = values.clone().fold(f64::NEG_INFINITY, f64::max);
    if shift == f64::NEG_INFINITY {
        return shift;
    }
    shift + values.map(|z| (z - shift).exp()).sum::<f64>().ln()
}

fn log_add_exp(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if hi == f64::NEG_INFINITY {
        return hi;
    }
    hi + (lo - hi).exp().ln_1p()
}

/// `ln(1 + exp(x))`.
fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// Convert a decimal quantity into the `f64` domain used by the cost function.
///
/// # Errors
///
/// Returns `DomainError::NonFinite` if the value cannot be represented.
pub fn to_f64(value: Decimal, context: &'static str) -> Result<f64, DomainError> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or(DomainError::NonFinite { context })
}

fn max_share(q: &[f64]) -> Result<f64, DomainError> {
    if q.is_empty() {
        return Err(DomainError::TooFewOutcomes { count: 0 });
    }
    if q.iter().any(|v| !v.is_finite()) {
        return Err(DomainError::NonFinite {
            context: "share vector",
        });
    }
    Ok(q.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

fn check_index(q: &[f64], index: usize) -> Result<(), DomainError> {
    if index >= q.len() {
        return Err(DomainError::OutcomeIndexOutOfRange {
            index,
            count: q.len(),
        });
    }
    Ok(())
}

fn check_delta(delta: f64) -> Result<(), DomainError> {
    if !delta.is_finite() || delta < 0.0 {
        return Err(DomainError::InvalidDelta {
            delta: delta.to_string(),
        });
    }
    Ok(())
}

fn finite(value: f64, context: &'static str) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NonFinite { context })
    }
}
