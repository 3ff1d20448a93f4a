//! In-memory adapters for library callers and tests

use anyhow::Result;

use crate::domain::{Account, PricePoint, Transaction};
use crate::ports::{IdAllocator, LedgerSink};

/// Hands out consecutive ids from a starting value
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    fn peek(&self) -> u64 {
        self.next
    }
}

/// Keeps everything written to it
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub prices: Vec<PricePoint>,
}

impl LedgerSink for MemorySink {
    fn write_accounts(&mut self, accounts: &[Account]) -> Result<()> {
        self.accounts.extend_from_slice(accounts);
        Ok(())
    }

    fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        self.transactions.extend_from_slice(transactions);
        Ok(())
    }

    fn write_prices(&mut self, prices: &[PricePoint]) -> Result<()> {
        self.prices.extend_from_slice(prices);
        Ok(())
    }
}
