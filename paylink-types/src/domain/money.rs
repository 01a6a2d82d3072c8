//! Type-safe monetary value with embedded currency.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Currencies supported by the collection system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Central African CFA franc - the default mobile-money settlement currency.
    XAF,
    NGN,
    GHS,
}

impl Currency {
    /// Returns the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::XAF => 0,
            Currency::NGN | Currency::GHS => 2,
        }
    }

    /// Returns the currency symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::XAF => "FCFA",
            Currency::NGN => "₦",
            Currency::GHS => "₵",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::XAF
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Monetary amount in the smallest unit of the currency.
///
/// Immutable once placed on a transaction: the amount is copied from the
/// payment link at initiation and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value.
    pub fn new(amount: i64, currency: Currency) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self { amount, currency })
    }

    /// Creates a zero-value Money for the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    /// Returns the amount in smallest currency unit.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.currency.decimal_places() {
            0 => write!(f, "{} {}", self.amount, self.currency.symbol()),
            _ => {
                let major = self.amount / 100;
                let minor = (self.amount % 100).abs();
                write!(f, "{}{}.{:02}", self.currency.symbol(), major, minor)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let money = Money::new(5000, Currency::XAF).unwrap();
        assert_eq!(money.amount(), 5000);
        assert_eq!(money.currency(), Currency::XAF);
    }

    #[test]
    fn test_negative_money_fails() {
        let result = Money::new(-100, Currency::XAF);
        assert!(matches!(result, Err(DomainError::NegativeAmount)));
    }

    #[test]
    fn test_xaf_display_has_no_decimals() {
        let money = Money::new(10000, Currency::XAF).unwrap();
        assert_eq!(format!("{}", money), "10000 FCFA");
    }

    #[test]
    fn test_ngn_display_has_decimals() {
        let money = Money::new(1050, Currency::NGN).unwrap();
        assert_eq!(format!("{}", money), "₦10.50");
    }
}
