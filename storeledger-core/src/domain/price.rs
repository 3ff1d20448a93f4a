//! Exchange rates and price points

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{Currency, Money};
use super::result::{Error, Result};

/// A rate between two currencies, derived from a pair of amounts
///
/// `convert` rounds to the decimal scale of the target amount the rate was derived
/// from, so converting that source amount gives back the target amount exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRate {
    from: Currency,
    to: Currency,
    rate: Decimal,
    scale: u32,
}

impl ExchangeRate {
    /// Derive `target / source`
    ///
    /// Fails when exactly one side is zero (or both are), and when the signs differ.
    pub fn derive(source: &Money, target: &Money) -> Result<Self> {
        let undefined = || Error::UndefinedRate {
            from: source.clone(),
            to: target.clone(),
        };

        if source.is_zero() || target.is_zero() {
            return Err(undefined());
        }

        let rate = target
            .amount()
            .checked_div(source.amount())
            .ok_or_else(undefined)?;

        if rate <= Decimal::ZERO {
            return Err(Error::NonPositiveRate {
                from: source.clone(),
                to: target.clone(),
            });
        }

        Ok(Self {
            from: source.currency().clone(),
            to: target.currency().clone(),
            rate: rate.normalize(),
            scale: target.amount().scale(),
        })
    }

    pub fn from(&self) -> &Currency {
        &self.from
    }

    pub fn to(&self) -> &Currency {
        &self.to
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Convert an amount in the `from` currency into the `to` currency
    pub fn convert(&self, money: &Money) -> Result<Money> {
        money.ensure_currency(&self.from)?;
        let converted = money
            .amount()
            .checked_mul(self.rate)
            .ok_or_else(|| Error::ConversionOverflow {
                amount: money.clone(),
                rate: self.rate,
            })?;
        Ok(Money::new(converted.round_dp(self.scale), self.to.clone()))
    }

    /// The dated price point recording this rate
    pub fn price_point(&self, date: NaiveDate) -> PricePoint {
        PricePoint {
            date,
            from: self.from.clone(),
            to: self.to.clone(),
            rate: self.rate,
        }
    }
}

/// A dated exchange rate for historical valuation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
}
