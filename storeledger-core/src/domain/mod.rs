//! Core domain entities
//!
//! Money, accounts, input records and split transactions. These are pure data
//! structures with validation logic - no I/O or external dependencies.

pub mod account;
pub mod money;
pub mod price;
pub mod records;
pub mod result;
pub mod transaction;

pub use account::{Account, AccountKind, AccountNames, AccountNamespace, CurrencyAccounts};
pub use money::{Currency, Money};
pub use price::{ExchangeRate, PricePoint};
pub use records::{
    DepositRecord, DepositSource, LineItem, LineItemKind, PaymentLogEntry, RecordKind, RecordRef,
    SaleRecord,
};
pub use transaction::{Split, Transaction, TransactionBuilder};
