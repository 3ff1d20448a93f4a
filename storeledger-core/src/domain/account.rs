//! Ledger accounts and the per-currency account namespace

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::money::Currency;
use super::records::LineItemKind;

/// Account type, using GnuCash nomenclature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountKind {
    Receivable,
    Asset,
    Expense,
    Income,
    Trading,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Receivable => "RECEIVABLE",
            AccountKind::Asset => "ASSET",
            AccountKind::Expense => "EXPENSE",
            AccountKind::Income => "INCOME",
            AccountKind::Trading => "TRADING",
        }
    }
}

/// A ledger account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Full colon-separated account name
    pub name: String,
    pub kind: AccountKind,
    /// Currency every split posted here is denominated in
    pub commodity: Currency,
    /// Placeholder accounts only group children and take no postings
    pub placeholder: bool,
    pub description: Option<String>,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountKind, commodity: Currency) -> Self {
        Self {
            name: name.into(),
            kind,
            commodity,
            placeholder: false,
            description: None,
        }
    }

    fn placeholder(mut self) -> Self {
        self.placeholder = true;
        self
    }

    fn described(mut self) -> Self {
        self.description = Some(self.leaf_name().to_string());
        self
    }

    /// Last component of the full name
    pub fn leaf_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }
}

/// Account names used to build the namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountNames {
    pub receivable: String,
    /// Parent of the per-currency proceeds accounts
    pub proceeds: String,
    /// Parent of the per-currency commission accounts
    pub commissions: String,
    /// Parent of the per-currency sales accounts
    pub sales: String,
    pub tax: String,
    pub adjustment: String,
    /// Parent of the per-currency exchange clearing accounts
    pub exchange: String,
}

impl Default for AccountNames {
    fn default() -> Self {
        Self {
            receivable: "Assets:Accounts Receivable".to_string(),
            proceeds: "Assets:App Store Payments".to_string(),
            commissions: "Expenses:Commissions".to_string(),
            sales: "Income:Sales".to_string(),
            tax: "Expenses:Taxes:Other Tax".to_string(),
            adjustment: "Expenses:Adjustment".to_string(),
            exchange: "Trading:CURRENCY".to_string(),
        }
    }
}

/// The accounts that belong to one currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyAccounts {
    /// Net sale revenue waiting for a deposit
    pub proceeds: Account,
    pub commission: Account,
    pub sales: Account,
    /// Clearing account for conversions into or out of this currency
    pub exchange: Account,
}

impl CurrencyAccounts {
    fn new(names: &AccountNames, currency: &Currency) -> Self {
        let child = |parent: &str| format!("{}:{}", parent, currency);
        Self {
            proceeds: Account::new(child(&names.proceeds), AccountKind::Asset, currency.clone()),
            commission: Account::new(child(&names.commissions), AccountKind::Expense, currency.clone()),
            sales: Account::new(child(&names.sales), AccountKind::Income, currency.clone()),
            exchange: Account::new(child(&names.exchange), AccountKind::Trading, currency.clone()),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Account> {
        [&self.proceeds, &self.commission, &self.sales, &self.exchange].into_iter()
    }
}

/// Maps currencies to their accounts
///
/// Entries are created the first time a currency is seen, by a sale or a deposit,
/// and are never removed. Every posting for a currency goes through the same entry.
#[derive(Debug, Clone, Default)]
pub struct AccountNamespace {
    names: AccountNames,
    entries: BTreeMap<Currency, CurrencyAccounts>,
}

impl AccountNamespace {
    pub fn new(names: AccountNames) -> Self {
        Self {
            names,
            entries: BTreeMap::new(),
        }
    }

    /// Accounts for `currency`, created on first use
    pub fn entry(&mut self, currency: &Currency) -> &CurrencyAccounts {
        let names = &self.names;
        self.entries
            .entry(currency.clone())
            .or_insert_with(|| CurrencyAccounts::new(names, currency))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.entries.keys()
    }

    /// Accounts receivable, held in the bank currency
    pub fn receivable(&self, currency: &Currency) -> Account {
        Account::new(&self.names.receivable, AccountKind::Receivable, currency.clone())
    }

    /// Expense account for a deposit line item
    pub fn line_item_account(&self, kind: LineItemKind, currency: &Currency) -> Account {
        let name = match kind {
            LineItemKind::Tax => &self.names.tax,
            LineItemKind::Adjustment => &self.names.adjustment,
        };
        Account::new(name, AccountKind::Expense, currency.clone())
    }

    /// Every account, fixed accounts first, then four per currency in currency order
    ///
    /// Fixed and placeholder accounts are denominated in `base`.
    pub fn accounts(&self, base: &Currency) -> Vec<Account> {
        let names = &self.names;
        let mut accounts = vec![
            self.receivable(base).described(),
            Account::new(&names.proceeds, AccountKind::Asset, base.clone())
                .described()
                .placeholder(),
            self.line_item_account(LineItemKind::Adjustment, base).described(),
            self.line_item_account(LineItemKind::Tax, base).described(),
            Account::new(&names.commissions, AccountKind::Expense, base.clone())
                .described()
                .placeholder(),
            Account::new(&names.sales, AccountKind::Income, base.clone()).placeholder(),
            Account::new(&names.exchange, AccountKind::Trading, base.clone()).placeholder(),
        ];
        accounts.extend(self.entries.values().flat_map(|e| e.iter().cloned()));
        accounts
    }
}
