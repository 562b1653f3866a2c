//! Fixed-point monetary amounts.
//!
//! Amounts are `rust_decimal::Decimal` values limited to cent precision. They
//! travel over the wire as strings (`"100.00"`) so no float ever touches a
//! balance.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use ledgerbank_core::{DomainError, DomainResult};

/// Number of fractional digits carried by every amount.
pub const MONEY_SCALE: u32 = 2;

/// Total digits a stored amount may carry (`NUMERIC(20, 2)`).
pub const MONEY_PRECISION: u32 = 20;

/// A signed fixed-point amount with at most two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wrap a decimal, rejecting sub-cent precision and magnitudes a stored
    /// balance cannot hold.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.normalize().scale() > MONEY_SCALE {
            return Err(DomainError::validation(format!(
                "amount '{value}' has more than {MONEY_SCALE} decimal places"
            )));
        }
        if value.abs() > Self::max_magnitude() {
            return Err(DomainError::validation(format!(
                "amount '{value}' exceeds the maximum of {}",
                Self::max_magnitude()
            )));
        }
        Ok(Self(value))
    }

    /// Largest absolute amount: 999999999999999999.99.
    pub fn max_magnitude() -> Decimal {
        Decimal::from_i128_with_scale(10i128.pow(MONEY_PRECISION) - 1, MONEY_SCALE)
    }

    /// Parse a decimal string of any sign.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("amount is required"));
        }
        let value = Decimal::from_str(trimmed)
            .map_err(|_| DomainError::validation(format!("amount '{trimmed}' is not a decimal number")))?;
        Self::new(value)
    }

    /// Parse an amount that must be strictly greater than zero.
    pub fn parse_positive(input: &str) -> DomainResult<Self> {
        let money = Self::parse(input)?;
        if !money.is_positive() {
            return Err(DomainError::validation("amount must be greater than zero"));
        }
        Ok(money)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// `None` if the sum leaves the representable range.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0
            .checked_add(other.0)
            .and_then(|sum| Money::new(sum).ok())
    }
}

impl core::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut value = self.0;
        value.rescale(MONEY_SCALE);
        core::fmt::Display::fmt(&value, f)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Money::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_two_fraction_digits() {
        assert_eq!(Money::parse("100").unwrap().to_string(), "100.00");
        assert_eq!(Money::parse("40.5").unwrap().to_string(), "40.50");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", "  ", "abc", "1.005", "12,50"] {
            assert!(
                matches!(Money::parse(bad), Err(DomainError::Validation(_))),
                "expected validation failure for {bad:?}"
            );
        }
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        assert_eq!(Money::parse("1.500").unwrap().to_string(), "1.50");
    }

    #[test]
    fn positive_parse_rejects_zero_and_negative() {
        assert!(Money::parse_positive("0").is_err());
        assert!(Money::parse_positive("0.00").is_err());
        assert!(Money::parse_positive("-5").is_err());
        assert!(Money::parse_positive("0.01").is_ok());
    }

    #[test]
    fn magnitude_is_bounded_by_the_stored_precision() {
        assert_eq!(
            Money::parse("999999999999999999.99").unwrap().to_string(),
            "999999999999999999.99"
        );
        for too_big in [
            "1000000000000000000",
            "-1000000000000000000.00",
            "50000000000000000000000000000",
        ] {
            assert!(
                matches!(Money::parse(too_big), Err(DomainError::Validation(_))),
                "expected validation failure for {too_big:?}"
            );
        }
    }

    #[test]
    fn addition_past_the_bound_is_none() {
        let max = Money::new(Money::max_magnitude()).unwrap();
        let cent = Money::parse("0.01").unwrap();
        assert_eq!(max.checked_add(cent), None);
        assert_eq!(max.checked_add(-cent).unwrap().to_string(), "999999999999999999.98");
    }

    #[test]
    fn serializes_as_string() {
        let m = Money::parse("60").unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"60.00\"");
        let back: Money = serde_json::from_str("\"60.00\"").unwrap();
        assert_eq!(back, m);
    }
}
