//! Precision-safe decimal types for price tracking.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, so threshold
//! comparisons on percentage moves never drift the way floats do.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal places kept for displayed percentages.
pub const PERCENT_SCALE: u32 = 2;

/// Round a percentage for display (half-up, 2 dp).
///
/// Only apply this after threshold comparisons have been made.
#[inline]
pub fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// USD price with exact decimal precision.
///
/// Wraps `Decimal` to keep prices from being mixed with percentages
/// in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self - other`, `None` on overflow.
    #[inline]
    pub fn checked_sub(&self, other: Price) -> Option<Price> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Signed percentage change from `baseline` to `self`, unrounded.
    ///
    /// `(self - baseline) / baseline * 100`. Returns `None` for a zero
    /// baseline or when the result does not fit in a `Decimal`.
    #[inline]
    pub fn pct_from(&self, baseline: Price) -> Option<Decimal> {
        if baseline.is_zero() {
            return None;
        }
        self.0
            .checked_sub(baseline.0)?
            .checked_div(baseline.0)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }
}

/// Spread of a centralized exchange price over the DEX price:
/// `(cex - dex) / dex * 100`.
///
/// `None` for a non-positive DEX price or on overflow.
pub fn spread_pct(dex: Price, cex: Price) -> Option<Decimal> {
    if dex.0 <= Decimal::ZERO {
        return None;
    }
    cex.pct_from(dex)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Aggregators return very small prices in exponent form ("1.2e-7").
        let value = Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s))?;
        Ok(Self(value))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}
