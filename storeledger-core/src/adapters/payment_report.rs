//! App Store Connect "Payments and Financial Reports" reader
//!
//! Each payment block in the CSV becomes one deposit, dated on the first day of
//! the report month until settlement matching finds the real date.

use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use super::{parse_amount, parse_money};
use crate::domain::result::Error;
use crate::domain::{
    Currency, DepositRecord, DepositSource, ExchangeRate, LineItem, LineItemKind, Money,
};

const REPORT_TITLE: &str = "iTunes Connect - Payments and Financial Reports";
const BLOCK_HEADER: &str = "Country or Region (Currency)";

mod column {
    pub const REGION: usize = 0;
    pub const INPUT_TAX: usize = 4;
    pub const ADJUSTMENTS: usize = 5;
    pub const WITHHOLDING: usize = 6;
    pub const TOTAL: usize = 7;
    pub const EXCHANGE_RATE: usize = 8;
    pub const PROCEEDS: usize = 9;
    pub const BANK_CURRENCY: usize = 10;
}

/// One currency row of a payment block
#[derive(Debug, Clone, PartialEq, Eq)]
struct CurrencyRow {
    /// Owed in the row currency after taxes and adjustments
    total: Money,
    /// Input tax plus withholding tax, in the row currency
    taxes: Money,
    adjustments: Money,
    /// `total` as paid out, in the bank currency
    proceeds: Money,
}

fn currency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\((\w{3})\)").unwrap())
}

fn month_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\((\w+),\s(\d{4})\)").unwrap())
}

/// First day of the month named in the report title, e.g. `(January, 2024)`
fn estimated_date(title: &str) -> Option<NaiveDate> {
    let captures = month_pattern().captures(title)?;
    let first = format!("1 {} {}", &captures[1], &captures[2]);
    NaiveDate::parse_from_str(&first, "%d %B %Y").ok()
}

/// Read a payment report from disk
///
/// Files that are not payment reports are ignored with a warning.
pub fn read_payment_report(path: &Path) -> Result<Vec<DepositRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open payment report {}", path.display()))?;
    let parsed = parse_payment_report(file)
        .with_context(|| format!("Failed to parse payment report {}", path.display()))?;
    let Some(deposits) = parsed else {
        warn!(path = %path.display(), "ignoring unknown file");
        return Ok(Vec::new());
    };
    debug!(path = %path.display(), deposits = deposits.len(), "read payment report");
    Ok(deposits)
}

/// Parse a payment report; `None` when the input is not one
pub fn parse_payment_report<R: Read>(input: R) -> Result<Option<Vec<DepositRecord>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut rows = reader.records();

    let title = match rows.next() {
        Some(row) => row?.get(0).unwrap_or_default().to_string(),
        None => return Ok(None),
    };
    if !title.starts_with(REPORT_TITLE) {
        return Ok(None);
    }
    let date = estimated_date(&title)
        .with_context(|| format!("Could not parse the report month from {:?}", title))?;

    let mut deposits = Vec::new();
    while let Some(row) = rows.next() {
        if row?.get(0) != Some(BLOCK_HEADER) {
            continue;
        }

        let mut currency_rows = Vec::new();
        for row in rows.by_ref() {
            let row = row?;
            if cell(&row, column::REGION).is_empty() {
                break;
            }
            if cell(&row, column::EXCHANGE_RATE).is_empty() {
                continue;
            }
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            currency_rows.push(
                parse_currency_row(&row).with_context(|| format!("Invalid payment row on line {}", line))?,
            );
        }
        if currency_rows.is_empty() {
            continue;
        }

        let total_row = rows.next().context("Payment block ends before its total")??;
        let amount = parse_money(first_value(&total_row).context("Payment block has no total")?)?;
        let account_row = rows.next().context("Payment block ends before the bank account")??;
        let account = first_value(&account_row)
            .context("Payment block has no bank account")?
            .to_string();

        deposits.push(build_deposit(date, account, amount, &currency_rows)?);
    }

    Ok(Some(deposits))
}

fn cell(row: &csv::StringRecord, index: usize) -> &str {
    row.get(index).map(str::trim).unwrap_or_default()
}

fn first_value(row: &csv::StringRecord) -> Option<&str> {
    row.iter().map(str::trim).find(|s| !s.is_empty())
}

fn parse_currency_row(row: &csv::StringRecord) -> Result<CurrencyRow> {
    let region = cell(row, column::REGION);
    let code = currency_pattern()
        .captures(region)
        .with_context(|| format!("No currency code in {:?}", region))?;
    let currency = Currency::new(&code[1])?;
    let bank = Currency::new(cell(row, column::BANK_CURRENCY))?;

    let amount = |index: usize| parse_amount(cell(row, index));
    let taxes = amount(column::INPUT_TAX)? + amount(column::WITHHOLDING)?;

    Ok(CurrencyRow {
        total: Money::new(amount(column::TOTAL)?, currency.clone()),
        taxes: Money::new(taxes, currency.clone()),
        adjustments: Money::new(amount(column::ADJUSTMENTS)?, currency),
        proceeds: Money::new(amount(column::PROCEEDS)?, bank),
    })
}

/// Fold a payment block into one deposit
///
/// The proceeds account is cleared of what the sales put there (the total before
/// taxes and adjustments); taxes and adjustments become bank-currency line items
/// converted at `proceeds / total`, so the deposit nets to the paid amount.
fn build_deposit(
    date: NaiveDate,
    account: String,
    amount: Money,
    rows: &[CurrencyRow],
) -> Result<DepositRecord> {
    let bank = amount.currency().clone();
    for row in rows {
        if row.proceeds.currency() != &bank {
            return Err(Error::MultipleBankCurrencies(bank, row.proceeds.currency().clone()).into());
        }
    }

    let paid = Money::sum(&bank, rows.iter().map(|r| &r.proceeds))?;
    if paid != amount {
        anyhow::bail!(
            "Total proceeds {} do not match the payment amount {}, there must be a parsing error",
            paid,
            amount
        );
    }

    let mut sources = Vec::new();
    let mut line_items = Vec::new();
    for row in rows {
        let currency = row.total.currency();
        let earned = row.total.checked_sub(&row.taxes)?.checked_sub(&row.adjustments)?;
        let (converted, taxes, adjustments) = convert_row(row, &bank)?;

        for (kind, item) in [(LineItemKind::Tax, taxes), (LineItemKind::Adjustment, adjustments)] {
            if !item.is_zero() {
                line_items.push(LineItem {
                    kind,
                    amount: item,
                    memo: Some(format!("{} {}", currency, kind.as_str())),
                });
            }
        }
        sources.push(DepositSource {
            amount: earned,
            converted,
        });
    }

    Ok(DepositRecord {
        date,
        estimated: true,
        description: account,
        bank_currency: bank,
        sources,
        line_items,
        reference: None,
    })
}

/// Bank-currency value of a row, with its taxes and adjustments
///
/// Taxes and adjustments are converted at `proceeds / total`. When that rate is
/// undefined they stay in the row currency, and the deposit engine rejects the
/// deposit as an invalid record.
fn convert_row(row: &CurrencyRow, bank: &Currency) -> Result<(Money, Money, Money)> {
    let currency = row.total.currency();
    let (taxes, adjustments) = if currency == bank {
        (row.taxes.clone(), row.adjustments.clone())
    } else if row.taxes.is_zero() && row.adjustments.is_zero() {
        (Money::zero(bank.clone()), Money::zero(bank.clone()))
    } else {
        match ExchangeRate::derive(&row.total, &row.proceeds) {
            Ok(rate) => (rate.convert(&row.taxes)?, rate.convert(&row.adjustments)?),
            Err(e) => {
                warn!(
                    currency = %currency,
                    total = %row.total,
                    proceeds = %row.proceeds,
                    reason = %e,
                    "cannot convert taxes and adjustments"
                );
                return Ok((row.proceeds.clone(), row.taxes.clone(), row.adjustments.clone()));
            }
        }
    };
    let converted = row.proceeds.checked_sub(&taxes)?.checked_sub(&adjustments)?;
    Ok((converted, taxes, adjustments))
}
