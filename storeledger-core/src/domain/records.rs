//! Input records: sales and bank deposits
//!
//! These are produced by the report adapters and consumed by the split and
//! reconciliation engines. They carry amounts exactly as reported.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{Currency, Money};
use super::result::{Error, Result};

/// One App Store sale line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Settlement date
    pub date: NaiveDate,
    /// Product title
    pub title: String,
    /// Units sold; negative for refunds
    pub quantity: i64,
    /// What the customers paid
    pub gross: Money,
    /// Apple's share of `gross`
    pub commission: Money,
}

impl SaleRecord {
    /// Net proceeds owed to the developer
    pub fn proceeds(&self) -> Result<Money> {
        self.gross.checked_sub(&self.commission)
    }

    pub fn currency(&self) -> &Currency {
        self.gross.currency()
    }

    /// Check the commission against the gross amount
    ///
    /// Both must share a currency, and the commission must have the sign of the
    /// gross amount without exceeding it.
    pub fn validate(&self) -> Result<()> {
        self.commission.ensure_currency(self.gross.currency())?;

        let gross = self.gross.amount();
        let commission = self.commission.amount();
        let in_range = if gross >= Decimal::ZERO {
            commission >= Decimal::ZERO && commission <= gross
        } else {
            commission <= Decimal::ZERO && commission >= gross
        };
        if !in_range {
            return Err(Error::CommissionOutOfRange {
                gross: self.gross.clone(),
                commission: self.commission.clone(),
            });
        }
        Ok(())
    }

    pub fn record_ref(&self) -> RecordRef {
        RecordRef {
            kind: RecordKind::Sale,
            date: self.date,
            amount: self.gross.clone(),
        }
    }
}

/// The portion of a deposit that came from one source currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositSource {
    /// Amount cleared from the proceeds account, in the source currency
    pub amount: Money,
    /// The same value as paid out, in the bank currency
    pub converted: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineItemKind {
    Tax,
    Adjustment,
}

impl LineItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemKind::Tax => "Tax",
            LineItemKind::Adjustment => "Adjustment",
        }
    }
}

/// A tax or adjustment reported on a deposit, in the bank currency
///
/// Negative amounts reduce the deposit (withholding, fees); positive ones increase it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineItemKind,
    pub amount: Money,
    pub memo: Option<String>,
}

/// One bank deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub date: NaiveDate,
    /// True while `date` is only the report month, before settlement matching
    pub estimated: bool,
    /// Usually the receiving bank account name
    pub description: String,
    pub bank_currency: Currency,
    pub sources: Vec<DepositSource>,
    pub line_items: Vec<LineItem>,
    /// Bank-side transaction reference, once known
    pub reference: Option<String>,
}

impl DepositRecord {
    /// Amount that reached the bank: converted sources plus signed line items
    pub fn net(&self) -> Result<Money> {
        let converted = Money::sum(&self.bank_currency, self.sources.iter().map(|s| &s.converted))?;
        let items = Money::sum(&self.bank_currency, self.line_items.iter().map(|i| &i.amount))?;
        converted.checked_add(&items)
    }

    /// Source lines merged per source currency, in order of first appearance
    pub fn grouped_sources(&self) -> Result<Vec<DepositSource>> {
        let mut grouped: Vec<DepositSource> = Vec::new();
        for source in &self.sources {
            let currency = source.amount.currency();
            match grouped.iter_mut().find(|g| g.amount.currency() == currency) {
                Some(group) => {
                    group.amount = group.amount.checked_add(&source.amount)?;
                    group.converted = group.converted.checked_add(&source.converted)?;
                }
                None => grouped.push(source.clone()),
            }
        }
        Ok(grouped)
    }

    pub fn record_ref(&self) -> RecordRef {
        // fall back to the converted sources when a line item is in the wrong currency
        let amount = self
            .net()
            .or_else(|_| Money::sum(&self.bank_currency, self.sources.iter().map(|s| &s.converted)))
            .unwrap_or_else(|_| Money::zero(self.bank_currency.clone()));
        RecordRef {
            kind: RecordKind::Deposit,
            date: self.date,
            amount,
        }
    }
}

/// A payment as it actually settled, from the payment log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLogEntry {
    pub amount: Money,
    pub account_name: String,
    pub units_sold: i64,
    pub date: NaiveDate,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Sale,
    Deposit,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Sale => f.write_str("sale"),
            RecordKind::Deposit => f.write_str("deposit"),
        }
    }
}

/// Identifies an input record in error reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub kind: RecordKind,
    pub date: NaiveDate,
    pub amount: Money,
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} on {}", self.kind, self.amount, self.date)
    }
}
