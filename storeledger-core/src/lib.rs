//! storeledger core - App Store reports to a double-entry ledger
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: money, accounts, input records and balanced transactions
//! - **ports**: trait definitions for the id allocator and the ledger sink
//! - **services**: the split and reconciliation engines and the batch conversion
//! - **adapters**: report readers, GnuCash CSV output, the counter file

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use adapters::counter_file::CounterFile;
use adapters::gnucash_csv::CsvSink;
use adapters::{payment_log, payment_report, sales_report};
use config::{Config, COUNTER_FILE};
use services::ConversionService;

// Re-export commonly used types at crate root
pub use config::InvalidRecordPolicy;
pub use domain::result::Error;
pub use domain::{
    Account, Currency, DepositRecord, Money, PaymentLogEntry, PricePoint, SaleRecord, Split,
    Transaction,
};
pub use services::{ConversionResult, RejectedRecord};

/// Records read from a set of input files
#[derive(Debug, Clone, Default)]
pub struct InputRecords {
    pub sales: Vec<SaleRecord>,
    pub deposits: Vec<DepositRecord>,
    /// Deposits re-dated from the payment log
    pub settled: usize,
}

/// Main context for storeledger operations
///
/// Holds the configuration loaded from the storeledger directory and the
/// conversion service built from it.
pub struct StoreLedgerContext {
    pub config: Config,
    pub dir: PathBuf,
    pub conversion_service: ConversionService,
}

impl StoreLedgerContext {
    /// Create a new context for a storeledger directory
    pub fn new(dir: &Path) -> Result<Self> {
        let config = Config::load(dir)?;
        let conversion_service = ConversionService::new(&config);

        Ok(Self {
            config,
            dir: dir.to_path_buf(),
            conversion_service,
        })
    }

    /// Where the transaction counter lives
    pub fn counter_path(&self) -> PathBuf {
        self.dir.join(COUNTER_FILE)
    }

    pub fn open_counter(&self) -> Result<CounterFile> {
        CounterFile::open(self.counter_path())
    }

    /// GnuCash CSV output into `output_dir`, using the configured file names
    pub fn sink(&self, output_dir: &Path) -> CsvSink {
        CsvSink::new(output_dir, self.config.output.clone())
    }

    /// Read input files
    ///
    /// `.csv` files are payment reports, anything else is a sales report. With a
    /// payment log, deposits are matched to their settlement dates.
    pub fn read_inputs(&self, files: &[PathBuf], payment_log: Option<&Path>) -> Result<InputRecords> {
        let mut inputs = InputRecords::default();

        for file in files.iter().filter(|f| !is_payment_report(f)) {
            inputs.sales.extend(sales_report::read_sales_report(file)?.sales);
        }
        for file in files.iter().filter(|f| is_payment_report(f)) {
            inputs.deposits.extend(payment_report::read_payment_report(file)?);
        }

        if let Some(log) = payment_log {
            let entries = payment_log::read_payment_log(log)?;
            inputs.settled = services::match_settlements(&mut inputs.deposits, entries)?;
        }

        info!(
            files = files.len(),
            sales = inputs.sales.len(),
            deposits = inputs.deposits.len(),
            settled = inputs.settled,
            "read inputs"
        );
        Ok(inputs)
    }
}

fn is_payment_report(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}
