//! Adapter implementations
//!
//! Adapters connect the core to files:
//! - App Store Connect sales and payment reports in, as records
//! - The payment log in, for settlement dates
//! - GnuCash CSV files out, for the LedgerSink port
//! - A counter file for the IdAllocator port
//! - In-memory versions of both ports

pub mod counter_file;
pub mod gnucash_csv;
pub mod memory;
pub mod payment_log;
pub mod payment_report;
pub mod sales_report;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{Currency, Money};

/// Parse a report amount such as `1,000.00` or `(3.49)`
pub(crate) fn parse_amount(s: &str) -> Result<Decimal> {
    let s = s.trim();

    // Parentheses notation for negative numbers: (100.00) -> -100.00
    let (is_negative, digits) = match s.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };

    let cleaned = digits.replace(',', "");
    let amount: Decimal = cleaned
        .parse()
        .with_context(|| format!("Invalid amount {:?}", s))?;

    Ok(if is_negative { -amount.abs() } else { amount })
}

/// Parse an amount followed by its currency, e.g. `22,070.60 USD`
pub(crate) fn parse_money(s: &str) -> Result<Money> {
    let mut parts = s.split_whitespace();
    let amount = parse_amount(parts.next().unwrap_or_default())?;
    let code = parts
        .next()
        .with_context(|| format!("No currency in {:?}", s))?;
    Ok(Money::new(amount, Currency::new(code)?))
}

/// Dates as they appear in App Store Connect reports
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let formats = ["%m/%d/%Y", "%Y-%m-%d"];
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
