//! Deposit reconciliation - one balanced multi-currency transaction per deposit
//!
//! A deposit clears the per-currency proceeds accounts into accounts receivable in
//! the bank currency. Each conversion goes through the exchange clearing accounts
//! of both currencies, so every currency group sums to zero on its own. Source
//! lines in the same currency are merged first and post as one conversion:
//!
//! ```text
//! Assets:Accounts Receivable        +6.40 USD
//! Assets:App Store Payments:JPY     -700  JPY
//! Trading:CURRENCY:JPY              +700  JPY
//! Trading:CURRENCY:USD              -6.50 USD
//! Expenses:Taxes:Other Tax          +0.10 USD
//! ```

use tracing::debug;

use super::price::source_rate;
use crate::domain::result::{Error, Result};
use crate::domain::{AccountNamespace, DepositRecord, Split, Transaction, TransactionBuilder};
use crate::ports::IdAllocator;

/// Turn a deposit into a transaction
///
/// Returns `None` (and draws no id) when the deposit moves no value.
pub fn reconcile_deposit(
    deposit: &DepositRecord,
    namespace: &mut AccountNamespace,
    ids: &mut dyn IdAllocator,
) -> Result<Option<Transaction>> {
    let builder = plan_deposit(deposit, namespace).map_err(|e| e.for_record(deposit.record_ref()))?;

    if builder.is_empty() {
        debug!(date = %deposit.date, "deposit has no value, nothing to post");
        return Ok(None);
    }

    let tx = builder.build(ids.next_id());
    debug!(id = tx.id, date = %tx.date, splits = tx.splits.len(), "reconciled deposit");
    Ok(Some(tx))
}

fn plan_deposit(deposit: &DepositRecord, namespace: &mut AccountNamespace) -> Result<TransactionBuilder> {
    if deposit.sources.is_empty() {
        return Err(Error::EmptyDeposit);
    }

    let bank = &deposit.bank_currency;
    let received = deposit.net()?;
    let sources = deposit.grouped_sources()?;
    // every check happens before the namespace is touched
    let rates = sources
        .iter()
        .map(|source| source_rate(source, bank))
        .collect::<Result<Vec<_>>>()?;

    let mut builder = TransactionBuilder::new(deposit.date, &deposit.description);

    let mut receivable = Split::new(&namespace.receivable(bank), received);
    if let Some(reference) = &deposit.reference {
        receivable = receivable.with_memo(reference.clone());
    }
    builder.push(receivable);

    for (source, rate) in sources.iter().zip(rates) {
        let currency = source.amount.currency();
        match rate {
            None => {
                let accounts = namespace.entry(currency);
                builder.push(Split::new(&accounts.proceeds, -&source.amount));
            }
            Some(rate) => {
                let from = namespace.entry(currency).clone();
                let to = namespace.entry(bank).clone();
                let memo = format!("{} to {}", currency, bank);
                builder
                    .push(Split::new(&from.proceeds, -&source.amount))
                    .push(
                        Split::new(&from.exchange, source.amount.clone())
                            .with_memo(memo.clone())
                            .with_rate(rate.rate()),
                    )
                    .push(Split::new(&to.exchange, -&source.converted).with_memo(memo));
            }
        }
    }

    for item in &deposit.line_items {
        let account = namespace.line_item_account(item.kind, bank);
        let memo = item.memo.clone().unwrap_or_else(|| item.kind.as_str().to_string());
        builder.push(Split::new(&account, -&item.amount).with_memo(memo));
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::SequentialIds;
    use crate::domain::{Currency, DepositSource, ExchangeRate, LineItem, LineItemKind, Money};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn money(amount: i64, scale: u32, code: &str) -> Money {
        Money::new(Decimal::new(amount, scale), Currency::new(code).unwrap())
    }

    fn source(amount: Money, converted: Money) -> DepositSource {
        DepositSource { amount, converted }
    }

    fn deposit(sources: Vec<DepositSource>, line_items: Vec<LineItem>) -> DepositRecord {
        DepositRecord {
            date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            estimated: false,
            description: "Checking".to_string(),
            bank_currency: Currency::new("USD").unwrap(),
            sources,
            line_items,
            reference: None,
        }
    }

    fn tax(amount: Money) -> LineItem {
        LineItem {
            kind: LineItemKind::Tax,
            amount,
            memo: None,
        }
    }

    fn amount_for<'a>(tx: &'a Transaction, account: &str) -> Option<&'a Money> {
        tx.splits.iter().find(|s| s.account == account).map(|s| &s.amount)
    }

    #[test]
    fn test_single_currency_deposit() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let record = deposit(vec![source(money(700, 0, "JPY"), money(650, 2, "USD"))], vec![]);
        let tx = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap().unwrap();

        assert!(tx.is_balanced());
        assert_eq!(tx.splits.len(), 4);
        assert_eq!(amount_for(&tx, "Assets:Accounts Receivable"), Some(&money(650, 2, "USD")));
        assert_eq!(amount_for(&tx, "Assets:App Store Payments:JPY"), Some(&money(-700, 0, "JPY")));
        assert_eq!(amount_for(&tx, "Trading:CURRENCY:JPY"), Some(&money(700, 0, "JPY")));
        assert_eq!(amount_for(&tx, "Trading:CURRENCY:USD"), Some(&money(-650, 2, "USD")));
    }

    #[test]
    fn test_tax_line_reduces_receivable() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let record = deposit(
            vec![source(money(700, 0, "JPY"), money(650, 2, "USD"))],
            vec![tax(money(-10, 2, "USD"))],
        );
        let tx = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap().unwrap();

        assert!(tx.is_balanced());
        assert_eq!(amount_for(&tx, "Assets:Accounts Receivable"), Some(&money(640, 2, "USD")));
        assert_eq!(amount_for(&tx, "Expenses:Taxes:Other Tax"), Some(&money(10, 2, "USD")));

        // bank-currency group: everything except the clearing credit adds up to the bank amount
        let usd = Currency::new("USD").unwrap();
        let usd_total: Decimal = tx
            .splits
            .iter()
            .filter(|s| s.currency() == &usd && s.account != "Trading:CURRENCY:USD")
            .map(|s| s.amount.amount())
            .sum();
        assert_eq!(usd_total, Decimal::new(650, 2));
    }

    #[test]
    fn test_positive_adjustment_is_credited() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let record = deposit(
            vec![source(money(1000, 2, "USD"), money(1000, 2, "USD"))],
            vec![LineItem {
                kind: LineItemKind::Adjustment,
                amount: money(25, 2, "USD"),
                memo: Some("Refund correction".to_string()),
            }],
        );
        let tx = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap().unwrap();

        assert!(tx.is_balanced());
        assert_eq!(amount_for(&tx, "Assets:Accounts Receivable"), Some(&money(1025, 2, "USD")));
        assert_eq!(amount_for(&tx, "Expenses:Adjustment"), Some(&money(-25, 2, "USD")));
        assert_eq!(amount_for(&tx, "Assets:App Store Payments:USD"), Some(&money(-1000, 2, "USD")));
        assert!(tx.splits.iter().all(|s| !s.account.starts_with("Trading")));
    }

    #[test]
    fn test_multi_currency_deposit_balances_per_currency() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::starting_at(5);

        let record = deposit(
            vec![
                source(money(700, 0, "JPY"), money(650, 2, "USD")),
                source(money(2000, 2, "EUR"), money(2160, 2, "USD")),
                source(money(1000, 2, "USD"), money(1000, 2, "USD")),
            ],
            vec![tax(money(-50, 2, "USD"))],
        );
        let tx = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap().unwrap();

        assert_eq!(tx.id, 5);
        assert!(tx.is_balanced());
        assert_eq!(tx.currencies().len(), 3);
        assert_eq!(amount_for(&tx, "Assets:Accounts Receivable"), Some(&money(3760, 2, "USD")));
        assert_eq!(namespace.len(), 3);
    }

    #[test]
    fn test_same_currency_lines_post_once() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let mut record = deposit(
            vec![
                source(money(1000, 2, "USD"), money(920, 2, "EUR")),
                source(money(500, 2, "USD"), money(463, 2, "EUR")),
            ],
            vec![],
        );
        record.bank_currency = Currency::new("EUR").unwrap();
        let tx = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap().unwrap();

        assert!(tx.is_balanced());
        let postings = |account: &str| tx.splits.iter().filter(|s| s.account == account).count();
        assert_eq!(postings("Assets:App Store Payments:USD"), 1);
        assert_eq!(postings("Trading:CURRENCY:USD"), 1);
        assert_eq!(amount_for(&tx, "Assets:App Store Payments:USD"), Some(&money(-1500, 2, "USD")));
        assert_eq!(amount_for(&tx, "Trading:CURRENCY:EUR"), Some(&money(-1383, 2, "EUR")));
        assert_eq!(amount_for(&tx, "Assets:Accounts Receivable"), Some(&money(1383, 2, "EUR")));
    }

    #[test]
    fn test_rate_round_trip_against_postings() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let record = deposit(vec![source(money(123_457, 0, "JPY"), money(83_211, 2, "USD"))], vec![]);
        let tx = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap().unwrap();

        let credit = tx.splits.iter().find(|s| s.account == "Trading:CURRENCY:JPY").unwrap();
        let debit = amount_for(&tx, "Trading:CURRENCY:USD").unwrap();
        let rate = ExchangeRate::derive(&credit.amount, &-debit).unwrap();

        assert_eq!(credit.rate, Some(rate.rate()));
        assert_eq!(rate.convert(&credit.amount).unwrap(), -debit);
    }

    #[test]
    fn test_reference_recorded_on_receivable() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let mut record = deposit(vec![source(money(700, 0, "JPY"), money(650, 2, "USD"))], vec![]);
        record.reference = Some("TX-123".to_string());
        let tx = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap().unwrap();

        assert_eq!(tx.splits[0].account, "Assets:Accounts Receivable");
        assert_eq!(tx.splits[0].memo.as_deref(), Some("TX-123"));
    }

    #[test]
    fn test_undefined_rate_rejected() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        for record in [
            deposit(vec![source(money(0, 0, "JPY"), money(650, 2, "USD"))], vec![]),
            deposit(vec![source(money(700, 0, "JPY"), money(0, 2, "USD"))], vec![]),
        ] {
            let err = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap_err();
            assert!(err.is_record_error());
        }
        assert_eq!(ids.peek(), 0);
        assert!(namespace.is_empty());
    }

    #[test]
    fn test_line_item_currency_checked() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let record = deposit(
            vec![source(money(700, 0, "JPY"), money(650, 2, "USD"))],
            vec![tax(money(-10, 0, "JPY"))],
        );
        let err = reconcile_deposit(&record, &mut namespace, &mut ids).unwrap_err();
        match err {
            Error::Record { cause, .. } => assert!(matches!(*cause, Error::CurrencyMismatch { .. })),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_deposit_rejected() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let err = reconcile_deposit(&deposit(vec![], vec![]), &mut namespace, &mut ids).unwrap_err();
        assert!(err.is_record_error());
    }
}
