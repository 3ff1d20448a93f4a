//! Split transactions

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::money::{Currency, Money};

/// One posting line: debit positive, credit negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub account: String,
    pub amount: Money,
    pub memo: Option<String>,
    /// Exchange rate applied to produce the other side of this posting
    pub rate: Option<Decimal>,
}

impl Split {
    /// Post `amount` to `account`
    ///
    /// # Panics
    /// If the amount is not in the account's currency.
    pub fn new(account: &Account, amount: Money) -> Self {
        assert_eq!(
            amount.currency(),
            &account.commodity,
            "posting {} to {} account {}",
            amount,
            account.commodity,
            account.name
        );
        Self {
            account: account.name.clone(),
            amount,
            memo: None,
            rate: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn currency(&self) -> &Currency {
        self.amount.currency()
    }
}

/// A balanced transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub date: NaiveDate,
    pub description: String,
    pub splits: Vec<Split>,
}

impl Transaction {
    /// Per-currency sums that are not zero
    pub fn imbalances(&self) -> BTreeMap<Currency, Decimal> {
        imbalances(&self.splits)
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalances().is_empty()
    }

    /// Currencies present among the splits
    pub fn currencies(&self) -> Vec<&Currency> {
        let mut currencies: Vec<&Currency> = self.splits.iter().map(Split::currency).collect();
        currencies.sort();
        currencies.dedup();
        currencies
    }
}

fn imbalances(splits: &[Split]) -> BTreeMap<Currency, Decimal> {
    let mut totals: BTreeMap<Currency, Decimal> = BTreeMap::new();
    for split in splits {
        *totals.entry(split.currency().clone()).or_insert(Decimal::ZERO) += split.amount.amount();
    }
    totals.retain(|_, total| !total.is_zero());
    totals
}

/// Collects splits for one transaction
///
/// Zero-amount splits are dropped. `build` refuses to produce an unbalanced
/// transaction.
#[derive(Debug)]
pub struct TransactionBuilder {
    date: NaiveDate,
    description: String,
    splits: Vec<Split>,
}

impl TransactionBuilder {
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            date,
            description: description.into(),
            splits: Vec::new(),
        }
    }

    pub fn push(&mut self, split: Split) -> &mut Self {
        if !split.amount.is_zero() {
            self.splits.push(split);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// Finish the transaction under `id`
    ///
    /// # Panics
    /// If any currency group does not sum to zero. Engines only build balanced
    /// transactions, so this is a logic fault rather than bad input.
    pub fn build(self, id: u64) -> Transaction {
        let unbalanced = imbalances(&self.splits);
        assert!(
            unbalanced.is_empty(),
            "transaction {} ({} on {}) is unbalanced: {:?}",
            id,
            self.description,
            self.date,
            unbalanced
        );
        Transaction {
            id,
            date: self.date,
            description: self.description,
            splits: self.splits,
        }
    }
}
