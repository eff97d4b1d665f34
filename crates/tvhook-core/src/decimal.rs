//! Precision-safe decimal types for order construction.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors when sizing orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Truncate `value` down to the nearest multiple of `increment`.
///
/// Truncation (never rounding up) keeps orders from requesting more funds
/// or units than the signal allowed. A non-positive increment leaves the
/// value unchanged. `None` when the step count exceeds `Decimal`'s range.
#[inline]
pub fn quantize_down(value: Decimal, increment: Decimal) -> Option<Decimal> {
    if increment <= Decimal::ZERO {
        return Some(value);
    }
    let steps = value.checked_div(increment)?.floor();
    let mut out = steps.checked_mul(increment)?;
    // Keep the increment's scale so 100 at 0.01 renders as 100.00.
    out.rescale(increment.scale().max(out.scale()));
    Some(out)
}

/// Render a decimal the way the exchange expects: no trailing zeros,
/// no exponent.
#[inline]
pub fn to_wire_string(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to keep prices and sizes from being mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Truncate to the quote increment.
    #[inline]
    pub fn quantize(&self, increment: Decimal) -> Option<Self> {
        quantize_down(self.0, increment).map(Self)
    }

    /// Wire representation without trailing zeros.
    pub fn to_wire(&self) -> String {
        to_wire_string(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Size/quantity with exact decimal precision.
///
/// Denominated either in the base asset or in the quote currency,
/// depending on the order's `SizeKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Truncate to the given increment.
    #[inline]
    pub fn quantize(&self, increment: Decimal) -> Option<Self> {
        quantize_down(self.0, increment).map(Self)
    }

    /// Convert a cash amount into base units at `price`.
    ///
    /// `None` on a zero price or when the quotient overflows.
    #[inline]
    pub fn in_units_at(&self, price: Price) -> Option<Self> {
        self.0.checked_div(price.0).map(Self)
    }

    /// Wire representation without trailing zeros.
    pub fn to_wire(&self) -> String {
        to_wire_string(self.0)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}
