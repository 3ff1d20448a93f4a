//! GnuCash CSV import files
//!
//! Three files, each with a single header row: the account tree, one row per
//! split (rows of the same transaction share a Number), and the price list.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::config::OutputFiles;
use crate::domain::{Account, PricePoint, Transaction};
use crate::ports::LedgerSink;

/// Date format GnuCash's CSV importer is configured for
pub const DATE_FORMAT: &str = "%m/%d/%Y";

const ACCOUNT_HEADER: [&str; 12] = [
    "Type",
    "Full Account Name",
    "Account Name",
    "Account Code",
    "Description",
    "Account Color",
    "Notes",
    "Symbol",
    "Namespace",
    "Hidden",
    "Tax Info",
    "Placeholder",
];

const TRANSACTION_HEADER: [&str; 8] = [
    "Date",
    "Account",
    "Amount",
    "Currency",
    "Number",
    "Description",
    "Memo",
    "Price",
];

const PRICE_HEADER: [&str; 5] = ["Date", "Amount", "From Namespace", "From Symbol", "Currency To"];

/// Commodity namespace GnuCash uses for ISO currencies
const CURRENCY_NAMESPACE: &str = "CURRENCY";

/// Writes the three import files into a directory
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    files: OutputFiles,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>, files: OutputFiles) -> Self {
        Self {
            dir: dir.into(),
            files,
        }
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.dir.join(&self.files.accounts)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.dir.join(&self.files.transactions)
    }

    pub fn prices_path(&self) -> PathBuf {
        self.dir.join(&self.files.prices)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn flag(value: bool) -> &'static str {
    if value {
        "T"
    } else {
        "F"
    }
}

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))
}

impl LedgerSink for CsvSink {
    fn write_accounts(&mut self, accounts: &[Account]) -> Result<()> {
        let path = self.accounts_path();
        let mut out = writer(&path)?;
        out.write_record(ACCOUNT_HEADER)?;
        for account in accounts {
            out.write_record([
                account.kind.as_str(),
                account.name.as_str(),
                account.leaf_name(),
                "",
                account.description.as_deref().unwrap_or(""),
                "",
                "",
                account.commodity.as_str(),
                CURRENCY_NAMESPACE,
                flag(false),
                flag(false),
                flag(account.placeholder),
            ])?;
        }
        out.flush()?;
        info!(path = %path.display(), accounts = accounts.len(), "wrote accounts");
        Ok(())
    }

    fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        let path = self.transactions_path();
        let mut out = writer(&path)?;
        out.write_record(TRANSACTION_HEADER)?;
        let mut rows = 0;
        for tx in transactions {
            let date = format_date(tx.date);
            let number = tx.id.to_string();
            for split in &tx.splits {
                let amount = split.amount.amount().to_string();
                let rate = split.rate.map(|r| r.to_string()).unwrap_or_default();
                out.write_record([
                    date.as_str(),
                    split.account.as_str(),
                    amount.as_str(),
                    split.currency().as_str(),
                    number.as_str(),
                    tx.description.as_str(),
                    split.memo.as_deref().unwrap_or(""),
                    rate.as_str(),
                ])?;
                rows += 1;
            }
        }
        out.flush()?;
        info!(path = %path.display(), transactions = transactions.len(), rows, "wrote transactions");
        Ok(())
    }

    fn write_prices(&mut self, prices: &[PricePoint]) -> Result<()> {
        let path = self.prices_path();
        let mut out = writer(&path)?;
        out.write_record(PRICE_HEADER)?;
        for price in prices {
            let date = format_date(price.date);
            let rate = price.rate.to_string();
            out.write_record([
                date.as_str(),
                rate.as_str(),
                CURRENCY_NAMESPACE,
                price.from.as_str(),
                price.to.as_str(),
            ])?;
        }
        out.flush()?;
        info!(path = %path.display(), prices = prices.len(), "wrote prices");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountKind, Currency, Money, Split};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn jpy() -> Currency {
        Currency::new("JPY").unwrap()
    }

    fn read(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_transactions_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = CsvSink::new(dir.path(), OutputFiles::default());

        let sales = Account::new("Income:Sales:JPY", AccountKind::Income, jpy());
        let proceeds = Account::new("Assets:App Store Payments:JPY", AccountKind::Asset, jpy());
        let tx = Transaction {
            id: 12,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            description: "Pocket Synth, \"Pro\"".to_string(),
            splits: vec![
                Split::new(&sales, Money::new(Decimal::new(-1000, 0), jpy())),
                Split::new(&proceeds, Money::new(Decimal::new(1000, 0), jpy())).with_memo("net"),
            ],
        };
        sink.write_transactions(&[tx]).unwrap();

        let rows = read(&sink.transactions_path());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], TRANSACTION_HEADER.map(String::from).to_vec());
        assert_eq!(
            rows[1],
            vec!["01/05/2024", "Income:Sales:JPY", "-1000", "JPY", "12", "Pocket Synth, \"Pro\"", "", ""]
        );
        assert_eq!(rows[2][6], "net");
    }

    #[test]
    fn test_accounts_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = CsvSink::new(dir.path(), OutputFiles::default());

        let mut namespace = crate::domain::AccountNamespace::default();
        namespace.entry(&jpy());
        let usd = Currency::new("USD").unwrap();
        sink.write_accounts(&namespace.accounts(&usd)).unwrap();

        let rows = read(&sink.accounts_path());
        assert_eq!(rows.len(), 1 + 7 + 4);
        assert_eq!(
            rows[1],
            vec![
                "RECEIVABLE",
                "Assets:Accounts Receivable",
                "Accounts Receivable",
                "",
                "Accounts Receivable",
                "",
                "",
                "USD",
                "CURRENCY",
                "F",
                "F",
                "F"
            ]
        );
        assert_eq!(rows[2][11], "T");
        assert_eq!(rows[8][1], "Assets:App Store Payments:JPY");
        assert_eq!(rows[8][7], "JPY");
    }

    #[test]
    fn test_prices_file() {
        let dir = TempDir::new().unwrap();
        let files = OutputFiles {
            prices: "rates.csv".to_string(),
            ..OutputFiles::default()
        };
        let mut sink = CsvSink::new(dir.path().join("out"), files);

        sink.write_prices(&[PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            from: jpy(),
            to: Currency::new("USD").unwrap(),
            rate: Decimal::new(108, 2),
        }])
        .unwrap();

        let rows = read(&dir.path().join("out").join("rates.csv"));
        assert_eq!(rows[0], PRICE_HEADER.map(String::from).to_vec());
        assert_eq!(rows[1], vec!["02/03/2024", "1.08", "CURRENCY", "JPY", "USD"]);
    }
}
