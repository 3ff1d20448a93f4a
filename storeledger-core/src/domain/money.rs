//! Money and currency codes
//!
//! A `Money` value is an exact decimal tagged with its currency. Values of different
//! currencies never meet in arithmetic: `checked_add`/`checked_sub` fail with
//! `CurrencyMismatch`, and moving between currencies goes through
//! [`ExchangeRate::convert`](super::price::ExchangeRate::convert).

use std::fmt;
use std::ops::Neg;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// ISO 4217 style currency code, normalized to uppercase
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parse and normalize a three-letter currency code
    pub fn new(code: &str) -> Result<Self> {
        let normalized = code.trim().to_uppercase();
        if normalized.len() == 3 && normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(normalized))
        } else {
            Err(Error::InvalidCurrency(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// An exact amount in a single currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Add two amounts of the same currency
    pub fn checked_add(&self, other: &Money) -> Result<Money> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency.clone()))
    }

    /// Subtract two amounts of the same currency
    pub fn checked_sub(&self, other: &Money) -> Result<Money> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency.clone()))
    }

    /// Sum amounts that must all be in `currency`
    pub fn sum<'a>(currency: &Currency, items: impl IntoIterator<Item = &'a Money>) -> Result<Money> {
        items
            .into_iter()
            .try_fold(Money::zero(currency.clone()), |acc, m| acc.checked_add(m))
    }

    pub fn ensure_currency(&self, currency: &Currency) -> Result<()> {
        if &self.currency == currency {
            Ok(())
        } else {
            Err(Error::CurrencyMismatch {
                left: self.currency.clone(),
                right: currency.clone(),
            })
        }
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<()> {
        self.ensure_currency(&other.currency)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money::new(-self.amount, self.currency)
    }
}

impl Neg for &Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money::new(-self.amount, self.currency.clone())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
