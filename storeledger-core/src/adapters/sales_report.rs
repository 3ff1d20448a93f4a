//! App Store Connect sales report reader
//!
//! Tab-separated. The second and third lines carry the report's start and end
//! dates, the fourth is the column header, and sale rows follow until the
//! per-country summary that starts with `Country Of Sale`.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::{parse_amount, parse_date};
use crate::domain::{Currency, Money, SaleRecord};

const HEADER_ROW: usize = 3;
const SUMMARY_MARKER: &str = "Country Of Sale";

/// A parsed sales report
#[derive(Debug, Clone, Default)]
pub struct SalesReport {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sales: Vec<SaleRecord>,
}

impl SalesReport {
    /// Currencies the report's sales are denominated in
    pub fn currencies(&self) -> Vec<&Currency> {
        let mut currencies: Vec<&Currency> = self.sales.iter().map(SaleRecord::currency).collect();
        currencies.sort();
        currencies.dedup();
        currencies
    }
}

struct Columns {
    settlement_date: usize,
    title: usize,
    quantity: usize,
    partner_share: usize,
    partner_share_currency: usize,
    customer_price: usize,
    customer_currency: usize,
}

impl Columns {
    fn locate(header: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .with_context(|| format!("Column '{}' not found in sales report header", name))
        };
        Ok(Self {
            settlement_date: find("Settlement Date")?,
            title: find("Title")?,
            quantity: find("Quantity")?,
            partner_share: find("Partner Share")?,
            partner_share_currency: find("Partner Share Currency")?,
            customer_price: find("Customer Price")?,
            customer_currency: find("Customer Currency")?,
        })
    }
}

/// Read a sales report from disk
pub fn read_sales_report(path: &Path) -> Result<SalesReport> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open sales report {}", path.display()))?;
    let report = parse_sales_report(file)
        .with_context(|| format!("Failed to parse sales report {}", path.display()))?;
    debug!(path = %path.display(), sales = report.sales.len(), "read sales report");
    Ok(report)
}

/// Parse a sales report
pub fn parse_sales_report<R: Read>(input: R) -> Result<SalesReport> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(input);

    let mut records = reader.records();
    let mut preamble = Vec::with_capacity(HEADER_ROW + 1);
    for _ in 0..=HEADER_ROW {
        let record = records
            .next()
            .context("Sales report ends before its header")??;
        preamble.push(record);
    }

    let report_date = |row: &csv::StringRecord| row.get(1).and_then(|s| parse_date(s.trim()));
    let columns = Columns::locate(&preamble[HEADER_ROW])?;

    let mut report = SalesReport {
        start_date: report_date(&preamble[1]),
        end_date: report_date(&preamble[2]),
        sales: Vec::new(),
    };

    for record in records {
        let record = record?;
        if record.get(0) == Some(SUMMARY_MARKER) {
            break;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let sale = parse_sale(&record, &columns)
            .with_context(|| format!("Invalid sale on line {}", line))?;
        report.sales.push(sale);
    }

    Ok(report)
}

fn parse_sale(record: &csv::StringRecord, columns: &Columns) -> Result<SaleRecord> {
    let cell = |index: usize, name: &str| {
        record
            .get(index)
            .map(str::trim)
            .with_context(|| format!("Missing {}", name))
    };

    let date_text = cell(columns.settlement_date, "Settlement Date")?;
    let date = parse_date(date_text)
        .with_context(|| format!("Unrecognized settlement date {:?}", date_text))?;
    let title = cell(columns.title, "Title")?.to_string();
    let quantity: i64 = cell(columns.quantity, "Quantity")?
        .replace(',', "")
        .parse()
        .context("Invalid Quantity")?;
    let partner_share = parse_amount(cell(columns.partner_share, "Partner Share")?)?;
    let customer_price = parse_amount(cell(columns.customer_price, "Customer Price")?)?;
    let partner_currency = Currency::new(cell(columns.partner_share_currency, "Partner Share Currency")?)?;
    let customer_currency = Currency::new(cell(columns.customer_currency, "Customer Currency")?)?;

    // quantity carries the sign; refunds come through with negative units
    let units = Decimal::from(quantity);
    let gross = customer_price.abs() * units;
    let net = partner_share.abs() * units;

    // a share paid in another currency fails validation in the split engine
    Ok(SaleRecord {
        date,
        title,
        quantity,
        gross: Money::new(gross, customer_currency),
        commission: Money::new(gross - net, partner_currency),
    })
}
