//! Conversion service - turns a batch of sales and deposits into a ledger

use serde::Serialize;
use tracing::{debug, info, warn};

use super::deposit::reconcile_deposit;
use super::price::derive_prices;
use super::split::split_sale;
use crate::config::{Config, InvalidRecordPolicy};
use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountNames, AccountNamespace, Currency, DepositRecord, PricePoint, RecordRef,
    SaleRecord, Transaction,
};
use crate::ports::{IdAllocator, LedgerSink};

/// A record dropped under the skip policy
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    pub record: RecordRef,
    pub reason: String,
}

/// Everything a conversion run produces
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    /// Currency of the fixed accounts
    pub base_currency: Currency,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub prices: Vec<PricePoint>,
    pub rejected: Vec<RejectedRecord>,
    /// Records that moved no value and produced no transaction
    pub empty_records: usize,
    /// Next id the allocator will hand out
    pub next_id: u64,
}

impl ConversionResult {
    /// Write accounts, transactions and prices, in that order
    pub fn write_to(&self, sink: &mut dyn LedgerSink) -> anyhow::Result<()> {
        sink.write_accounts(&self.accounts)?;
        sink.write_transactions(&self.transactions)?;
        sink.write_prices(&self.prices)?;
        Ok(())
    }

    pub fn split_count(&self) -> usize {
        self.transactions.iter().map(|t| t.splits.len()).sum()
    }
}

#[derive(Debug, Clone, Copy)]
enum Pending<'a> {
    Sale(&'a SaleRecord),
    Deposit(&'a DepositRecord),
}

impl Pending<'_> {
    fn date(&self) -> chrono::NaiveDate {
        match self {
            Pending::Sale(sale) => sale.date,
            Pending::Deposit(deposit) => deposit.date,
        }
    }

    /// Sales go before deposits on the same day
    fn rank(&self) -> u8 {
        match self {
            Pending::Sale(_) => 0,
            Pending::Deposit(_) => 1,
        }
    }
}

/// Runs the split and reconciliation engines over one batch
pub struct ConversionService {
    base_currency: Currency,
    policy: InvalidRecordPolicy,
    names: AccountNames,
}

impl ConversionService {
    pub fn new(config: &Config) -> Self {
        Self {
            base_currency: config.base_currency.clone(),
            policy: config.on_invalid_record,
            names: config.accounts.clone(),
        }
    }

    pub fn with_policy(mut self, policy: InvalidRecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Convert a batch
    ///
    /// Records are processed by ascending date, sales before deposits on the same
    /// day, input order otherwise. Ids are drawn only for emitted transactions, so
    /// they increase in output order.
    pub fn convert(
        &self,
        sales: &[SaleRecord],
        deposits: &[DepositRecord],
        ids: &mut dyn IdAllocator,
    ) -> Result<ConversionResult> {
        let base_currency = bank_currency(deposits)?.unwrap_or_else(|| self.base_currency.clone());

        let mut pending: Vec<Pending> = sales
            .iter()
            .map(Pending::Sale)
            .chain(deposits.iter().map(Pending::Deposit))
            .collect();
        pending.sort_by_key(|p| (p.date(), p.rank()));

        let mut namespace = AccountNamespace::new(self.names.clone());
        let mut transactions = Vec::new();
        let mut prices = Vec::new();
        let mut rejected = Vec::new();
        let mut empty_records = 0;

        for record in pending {
            let outcome = match record {
                Pending::Sale(sale) => split_sale(sale, &mut namespace, ids).map(|tx| (tx, Vec::new())),
                Pending::Deposit(deposit) => derive_prices(deposit).and_then(|points| {
                    reconcile_deposit(deposit, &mut namespace, ids).map(|tx| (tx, points))
                }),
            };

            match outcome {
                Ok((Some(tx), points)) => {
                    transactions.push(tx);
                    prices.extend(points);
                }
                Ok((None, _)) => empty_records += 1,
                Err(Error::Record { record, cause }) if self.policy == InvalidRecordPolicy::Skip => {
                    warn!(record = %record, reason = %cause, "skipping invalid record");
                    rejected.push(RejectedRecord {
                        record,
                        reason: cause.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let result = ConversionResult {
            accounts: namespace.accounts(&base_currency),
            base_currency,
            transactions,
            prices,
            rejected,
            empty_records,
            next_id: ids.peek(),
        };

        info!(
            transactions = result.transactions.len(),
            prices = result.prices.len(),
            currencies = namespace.len(),
            rejected = result.rejected.len(),
            next_id = result.next_id,
            "conversion finished"
        );
        Ok(result)
    }
}

/// The single bank currency shared by every deposit
fn bank_currency(deposits: &[DepositRecord]) -> Result<Option<Currency>> {
    let mut found: Option<&Currency> = None;
    for deposit in deposits {
        match found {
            None => found = Some(&deposit.bank_currency),
            Some(currency) if currency != &deposit.bank_currency => {
                return Err(Error::MultipleBankCurrencies(
                    currency.clone(),
                    deposit.bank_currency.clone(),
                ));
            }
            Some(_) => {}
        }
    }
    if let Some(currency) = found {
        debug!(bank_currency = %currency, "using bank currency for fixed accounts");
    }
    Ok(found.cloned())
}
