//! Percentage type for bucket allocation rules
//!
//! Stored as hundredths of a percentage point, so "12.5%" is 1250 and 100% is
//! 10_000. Applying a percentage to a [`Money`] amount rounds to the nearest
//! cent, halves away from zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use super::money::{Money, MoneyParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(i64);

impl Percentage {
    /// 100%
    pub const HUNDRED: Percentage = Percentage(10_000);

    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// Create from whole percentage points (`from_points(15)` is 15%)
    pub const fn from_points(points: i64) -> Self {
        Self(points * 100)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse "15", "12.5" or "12.5%"
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let s = s.trim();
        let s = s.strip_suffix('%').unwrap_or(s);
        if s.starts_with('$') {
            return Err(MoneyParseError::InvalidFormat(s.to_string()));
        }
        // Two-decimal parsing is identical to money parsing
        Money::parse(s).map(|m| Self(m.cents()))
    }

    /// `round(self / 100 * amount)` to the cent
    pub fn apply(self, amount: Money) -> Money {
        Money::from_cents(round_div(
            amount.cents() as i128 * self.0 as i128,
            Self::HUNDRED.0 as i128,
        ))
    }

    /// Apply this share of `total` (normalized so all shares sum to 100%)
    ///
    /// Returns zero when `total` is not positive.
    pub fn apply_normalized(self, total: Percentage, amount: Money) -> Money {
        if !total.is_positive() {
            return Money::zero();
        }
        Money::from_cents(round_div(
            amount.cents() as i128 * self.0 as i128,
            total.0 as i128,
        ))
    }
}

/// Integer division rounding halves away from zero
fn round_div(numerator: i128, denominator: i128) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let rounded = if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) != (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    };
    rounded as i64
}

impl Add for Percentage {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sum for Percentage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Percentage::zero(), |acc, p| acc + p)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = (self.0 % 100).abs();
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}
