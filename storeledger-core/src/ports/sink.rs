//! Ledger output port

use anyhow::Result;

use crate::domain::{Account, PricePoint, Transaction};

/// Receives the finished ledger
///
/// Each method is called once per run, with records in emission order.
pub trait LedgerSink {
    fn write_accounts(&mut self, accounts: &[Account]) -> Result<()>;

    fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()>;

    fn write_prices(&mut self, prices: &[PricePoint]) -> Result<()>;
}
