//! Result and error types for the core library

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::money::{Currency, Money};
use super::records::RecordRef;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    #[error("Undefined exchange rate from {from} to {to}")]
    UndefinedRate { from: Money, to: Money },

    #[error("Non-positive exchange rate from {from} to {to}")]
    NonPositiveRate { from: Money, to: Money },

    #[error("Converting {amount} at rate {rate} overflows")]
    ConversionOverflow { amount: Money, rate: Decimal },

    #[error("Commission {commission} is out of range for gross {gross}")]
    CommissionOutOfRange { gross: Money, commission: Money },

    #[error("Converted amount {converted} differs from {amount} in the bank currency")]
    ConversionWithinCurrency { amount: Money, converted: Money },

    #[error("Deposit has no source lines")]
    EmptyDeposit,

    #[error("Multiple bank currencies detected ({0} and {1}), not supported")]
    MultipleBankCurrencies(Currency, Currency),

    #[error("Could not find matching payment for amount {amount} after {after}")]
    UnmatchedPayment { amount: Money, after: NaiveDate },

    #[error("Invalid {record}: {cause}")]
    Record {
        record: RecordRef,
        #[source]
        cause: Box<Error>,
    },
}

impl Error {
    /// Attach the offending record to a data-integrity error
    pub fn for_record(self, record: RecordRef) -> Self {
        match self {
            Self::Record { .. } => self,
            cause => Self::Record {
                record,
                cause: Box::new(cause),
            },
        }
    }

    /// Whether this error only invalidates a single input record
    pub fn is_record_error(&self) -> bool {
        matches!(self, Self::Record { .. })
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
