//! Type-safe price representation using decimal arithmetic.
//!
//! Monetary amounts never touch binary floating point; all arithmetic goes
//! through `rust_decimal::Decimal`.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency.
///
/// Serializes transparently as the underlying decimal, so wire payloads
/// carry plain numbers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Price {
    /// Format for display (e.g., "$19.99").
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimal_places() {
        let price = Price::new(Decimal::new(1999, 2));
        assert_eq!(price.to_string(), "$19.99");

        let whole = Price::new(Decimal::new(1000, 0));
        assert_eq!(whole.to_string(), "$1000.00");
    }

    #[test]
    fn test_line_arithmetic() {
        let unit = Price::new(Decimal::new(1050, 2)); // $10.50
        let line = unit * 3;
        assert_eq!(line.amount(), Decimal::new(3150, 2));
    }

    #[test]
    fn test_sum() {
        let total: Price = [
            Price::new(Decimal::new(100, 2)),
            Price::new(Decimal::new(250, 2)),
        ]
        .into_iter()
        .sum();
        assert_eq!(total.amount(), Decimal::new(350, 2));
    }
}
