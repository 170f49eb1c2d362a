//! Sequential order numbers of the form `ORD00001`.

use std::fmt;
use std::str::FromStr;

use store::StoreTransaction;
use thiserror::Error;

use crate::error::DomainError;

const PREFIX: &str = "ORD";

/// Minimum width of the numeric part. Wider sequences are printed as is.
const MIN_DIGITS: usize = 5;

/// Longest numeric part accepted from callers. Leaves the counter room to
/// keep allocating after the largest reservable number.
const MAX_DIGITS: usize = 17;

/// Errors produced when parsing an order number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("Order number must start with 'ORD'.")]
    MissingPrefix,

    #[error("Order number must end in at least 5 digits.")]
    BadDigits,

    #[error("Order number must not exceed 17 digits.")]
    TooLong,

    #[error("Order number must not be zero or carry extra leading zeros.")]
    NotCanonical,
}

/// A unique, immutable order identifier visible to users.
///
/// The numeric part is a positive sequence zero-padded to five digits and
/// allowed to grow past that: `ORD99999` is followed by `ORD100000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderNumber {
    sequence: u64,
}

impl OrderNumber {
    /// The number issued to the first order of an empty store.
    pub const fn first() -> Self {
        Self { sequence: 1 }
    }

    /// Builds the order number for a counter value. Zero maps to the first
    /// number.
    pub fn from_sequence(sequence: u64) -> Self {
        Self {
            sequence: sequence.max(1),
        }
    }

    /// Parses the canonical text form.
    ///
    /// Accepts `ORD` followed by at least five digits, with no leading zeros
    /// beyond the five-digit padding. `ORD00000` is rejected.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let digits = s
            .strip_prefix(PREFIX)
            .ok_or(OrderNumberError::MissingPrefix)?;
        if digits.len() < MIN_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::BadDigits);
        }
        if digits.len() > MAX_DIGITS {
            return Err(OrderNumberError::TooLong);
        }

        let sequence: u64 = digits.parse().map_err(|_| OrderNumberError::BadDigits)?;
        let parsed = Self { sequence };
        if sequence == 0 || parsed.to_string() != s {
            return Err(OrderNumberError::NotCanonical);
        }
        Ok(parsed)
    }

    /// Returns the number issued after this one. Saturates at `u64::MAX`.
    pub fn next(&self) -> Self {
        Self {
            sequence: self.sequence.saturating_add(1),
        }
    }

    /// Returns the numeric part.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Allocates the next number from the counter held in `tx`.
    ///
    /// The counter moves with the transaction, so a rollback releases the
    /// number again.
    pub async fn allocate(tx: &mut dyn StoreTransaction) -> Result<Self, DomainError> {
        let sequence = tx.next_order_sequence().await?;
        Ok(Self::from_sequence(sequence))
    }

    /// Records a caller-supplied number so that later allocations skip it.
    pub async fn reserve(&self, tx: &mut dyn StoreTransaction) -> Result<(), DomainError> {
        tx.advance_order_sequence(self.sequence).await?;
        Ok(())
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{:0width$}", self.sequence, width = MIN_DIGITS)
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_number_is_padded() {
        assert_eq!(OrderNumber::first().to_string(), "ORD00001");
        assert_eq!(OrderNumber::from_sequence(0), OrderNumber::first());
    }

    #[test]
    fn next_grows_past_five_digits() {
        let n = OrderNumber::from_sequence(99_999);
        assert_eq!(n.to_string(), "ORD99999");
        assert_eq!(n.next().to_string(), "ORD100000");
        assert_eq!(n.next().sequence(), 100_000);
    }

    #[test]
    fn parse_accepts_canonical_forms() {
        assert_eq!(OrderNumber::parse("ORD00042").unwrap().sequence(), 42);
        assert_eq!(OrderNumber::parse("ORD123456").unwrap().sequence(), 123_456);
        assert_eq!(
            "ORD00007".parse::<OrderNumber>().unwrap(),
            OrderNumber::from_sequence(7)
        );
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(
            OrderNumber::parse("INV00001"),
            Err(OrderNumberError::MissingPrefix)
        );
        assert_eq!(OrderNumber::parse("ORD1"), Err(OrderNumberError::BadDigits));
        assert_eq!(
            OrderNumber::parse("ORD0001a"),
            Err(OrderNumberError::BadDigits)
        );
        assert_eq!(
            OrderNumber::parse("ORD00000"),
            Err(OrderNumberError::NotCanonical)
        );
        assert_eq!(
            OrderNumber::parse("ORD000001"),
            Err(OrderNumberError::NotCanonical)
        );
        assert_eq!(
            OrderNumber::parse("ORD123456789012345678"),
            Err(OrderNumberError::TooLong)
        );
    }

    #[test]
    fn number_after_largest_reservation_fits_column() {
        let largest = OrderNumber::parse("ORD99999999999999999").unwrap();
        let after = largest.next().to_string();
        assert_eq!(after, "ORD100000000000000000");
        assert!(after.len() <= store::ORDER_NUMBER_MAX_LEN);
        assert!(
            OrderNumber::from_sequence(u64::MAX).to_string().len() <= store::ORDER_NUMBER_MAX_LEN
        );
    }

    #[test]
    fn next_saturates_at_max() {
        let last = OrderNumber::from_sequence(u64::MAX);
        assert_eq!(last.next().sequence(), u64::MAX);
    }
}
