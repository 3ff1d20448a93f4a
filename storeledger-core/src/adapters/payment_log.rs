//! Payment log reader
//!
//! A plain-text list of payments as copied from App Store Connect, one block per
//! payment separated by blank lines:
//!
//! ```text
//! 22,070.60 USD
//! Checking Account
//! 1,234
//! Units Sold
//! February 3, 2024
//! Transaction ID: 0123456789
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use super::parse_money;
use crate::domain::PaymentLogEntry;

const TRANSACTION_ID_PREFIX: &str = "Transaction ID:";

/// Read a payment log from disk
pub fn read_payment_log(path: &Path) -> Result<Vec<PaymentLogEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payment log {}", path.display()))?;
    let entries = parse_payment_log(&content)
        .with_context(|| format!("Failed to parse payment log {}", path.display()))?;
    debug!(path = %path.display(), entries = entries.len(), "read payment log");
    Ok(entries)
}

/// Parse a payment log
///
/// Blocks with fewer than six lines are ignored, as are blocks whose date cannot
/// be read (they could never be matched).
pub fn parse_payment_log(content: &str) -> Result<Vec<PaymentLogEntry>> {
    let separator = Regex::new(r"\n\s*\n")?;
    let mut entries = Vec::new();

    for block in separator.split(content.trim()) {
        let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.len() < 6 {
            continue;
        }

        let Ok(date) = NaiveDate::parse_from_str(lines[4], "%B %d, %Y") else {
            warn!(date = lines[4], "skipping payment with unreadable date");
            continue;
        };

        entries.push(PaymentLogEntry {
            amount: parse_money(lines[0])?,
            account_name: lines[1].to_string(),
            units_sold: lines[2]
                .replace(',', "")
                .parse()
                .with_context(|| format!("Invalid units sold {:?}", lines[2]))?,
            date,
            transaction_id: lines[5]
                .strip_prefix(TRANSACTION_ID_PREFIX)
                .unwrap_or(lines[5])
                .trim()
                .to_string(),
        });
    }

    Ok(entries)
}
