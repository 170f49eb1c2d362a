//! Fixed-point weight in kilograms.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Number of fractional decimal digits a weight carries.
pub const WEIGHT_SCALE: u32 = 2;

const HUNDREDTHS_PER_KG: i64 = 100;

/// Errors produced when parsing a weight from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightParseError {
    #[error("'{0}' is not a decimal number")]
    Invalid(String),

    #[error("'{0}' has more than two decimal places")]
    TooPrecise(String),

    #[error("'{0}' is out of range")]
    Overflow(String),
}

/// Weight in kilograms, stored as hundredths of a kilogram.
///
/// Sums and products stay exact: `0.10 * 3 == 0.30` with no floating-point
/// drift. Serialized as a decimal string with two fractional digits
/// (`"12.50"`). Parsed from text with [`FromStr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight {
    hundredths: i64,
}

impl Weight {
    /// Creates a weight from hundredths of a kilogram.
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self { hundredths }
    }

    /// Creates a weight from whole kilograms.
    pub const fn from_kg(kg: i64) -> Self {
        Self {
            hundredths: kg * HUNDREDTHS_PER_KG,
        }
    }

    pub const fn zero() -> Self {
        Self { hundredths: 0 }
    }

    /// Returns the weight in hundredths of a kilogram.
    pub const fn hundredths(&self) -> i64 {
        self.hundredths
    }

    /// Multiplies by a line quantity. Saturates instead of wrapping.
    pub fn multiply(&self, quantity: u32) -> Weight {
        Weight {
            hundredths: self.hundredths.saturating_mul(i64::from(quantity)),
        }
    }

    /// Adds another weight. Saturates instead of wrapping.
    pub fn saturating_add(&self, other: Weight) -> Weight {
        Weight {
            hundredths: self.hundredths.saturating_add(other.hundredths),
        }
    }
}

impl std::ops::Add for Weight {
    type Output = Weight;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl std::ops::AddAssign for Weight {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl std::iter::Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Self {
        iter.fold(Weight::zero(), |acc, w| acc + w)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.hundredths < 0 { "-" } else { "" };
        let abs = self.hundredths.unsigned_abs();
        let per_kg = HUNDREDTHS_PER_KG as u64;
        write!(f, "{sign}{}.{:02}", abs / per_kg, abs % per_kg)
    }
}

impl FromStr for Weight {
    type Err = WeightParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || WeightParseError::Invalid(s.to_string());

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        // Trailing zeros beyond the scale carry no value ("1.500").
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > WEIGHT_SCALE as usize {
            return Err(WeightParseError::TooPrecise(s.to_string()));
        }

        let overflow = || WeightParseError::Overflow(s.to_string());
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let fraction: i64 = format!("{fraction:0<2}").parse().map_err(|_| invalid())?;

        let hundredths = whole
            .checked_mul(HUNDREDTHS_PER_KG)
            .and_then(|h| h.checked_add(fraction))
            .ok_or_else(overflow)?;

        Ok(Weight {
            hundredths: if negative { -hundredths } else { hundredths },
        })
    }
}

impl Serialize for Weight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
