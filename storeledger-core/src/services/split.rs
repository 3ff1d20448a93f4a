//! Sale splitting - one balanced transaction per sale line

use tracing::debug;

use crate::domain::result::Result;
use crate::domain::{AccountNamespace, SaleRecord, Split, Transaction, TransactionBuilder};
use crate::ports::IdAllocator;

/// Memo on the commission split
pub const COMMISSION_MEMO: &str = "Commission";

/// Turn a sale into a transaction in the sale's currency
///
/// Postings: sales income credited with the gross amount, commission expense
/// debited with Apple's share, proceeds debited with the rest. Returns `None`
/// (and draws no id) when every posting would be zero.
pub fn split_sale(
    sale: &SaleRecord,
    namespace: &mut AccountNamespace,
    ids: &mut dyn IdAllocator,
) -> Result<Option<Transaction>> {
    let builder = plan_sale(sale, namespace).map_err(|e| e.for_record(sale.record_ref()))?;

    if builder.is_empty() {
        debug!(title = %sale.title, date = %sale.date, "sale has no value, nothing to post");
        return Ok(None);
    }

    let tx = builder.build(ids.next_id());
    debug!(id = tx.id, title = %tx.description, gross = %sale.gross, "split sale");
    Ok(Some(tx))
}

fn plan_sale(sale: &SaleRecord, namespace: &mut AccountNamespace) -> Result<TransactionBuilder> {
    sale.validate()?;
    let proceeds = sale.proceeds()?;
    let accounts = namespace.entry(sale.currency());

    let mut builder = TransactionBuilder::new(sale.date, &sale.title);
    builder
        .push(Split::new(&accounts.sales, -&sale.gross))
        .push(Split::new(&accounts.commission, sale.commission.clone()).with_memo(COMMISSION_MEMO))
        .push(Split::new(&accounts.proceeds, proceeds));
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::SequentialIds;
    use crate::domain::result::Error;
    use crate::domain::{Currency, Money};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn money(amount: i64, scale: u32, code: &str) -> Money {
        Money::new(Decimal::new(amount, scale), Currency::new(code).unwrap())
    }

    fn sale(gross: Money, commission: Money) -> SaleRecord {
        SaleRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            title: "Pocket Synth".to_string(),
            quantity: 1,
            gross,
            commission,
        }
    }

    #[test]
    fn test_split_jpy_sale() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::starting_at(10);

        let tx = split_sale(&sale(money(1000, 0, "JPY"), money(300, 0, "JPY")), &mut namespace, &mut ids)
            .unwrap()
            .unwrap();

        assert_eq!(tx.id, 10);
        assert_eq!(tx.description, "Pocket Synth");
        assert!(tx.is_balanced());

        let postings: Vec<(&str, Money)> = tx
            .splits
            .iter()
            .map(|s| (s.account.as_str(), s.amount.clone()))
            .collect();
        assert_eq!(
            postings,
            vec![
                ("Income:Sales:JPY", money(-1000, 0, "JPY")),
                ("Expenses:Commissions:JPY", money(300, 0, "JPY")),
                ("Assets:App Store Payments:JPY", money(700, 0, "JPY")),
            ]
        );
        assert_eq!(tx.splits[1].memo.as_deref(), Some(COMMISSION_MEMO));
    }

    #[test]
    fn test_zero_commission_split_omitted() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let tx = split_sale(&sale(money(499, 2, "USD"), money(0, 2, "USD")), &mut namespace, &mut ids)
            .unwrap()
            .unwrap();
        assert_eq!(tx.splits.len(), 2);
        assert!(tx.splits.iter().all(|s| s.account != "Expenses:Commissions:USD"));
    }

    #[test]
    fn test_free_sale_emits_nothing() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let tx = split_sale(&sale(money(0, 2, "USD"), money(0, 2, "USD")), &mut namespace, &mut ids).unwrap();
        assert!(tx.is_none());
        assert_eq!(ids.peek(), 0);
    }

    #[test]
    fn test_refund_mirrors_sale() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let tx = split_sale(&sale(money(-1000, 0, "JPY"), money(-300, 0, "JPY")), &mut namespace, &mut ids)
            .unwrap()
            .unwrap();
        assert_eq!(tx.splits[0].amount, money(1000, 0, "JPY"));
        assert_eq!(tx.splits[2].amount, money(-700, 0, "JPY"));
    }

    #[test]
    fn test_invalid_sale_rejected_without_id() {
        let mut namespace = AccountNamespace::default();
        let mut ids = SequentialIds::default();

        let err = split_sale(&sale(money(1000, 0, "JPY"), money(3, 0, "USD")), &mut namespace, &mut ids)
            .unwrap_err();
        assert!(err.is_record_error());
        assert!(err.to_string().contains("1000 JPY"));
        assert_eq!(ids.peek(), 0);
        assert!(namespace.is_empty());

        let err = split_sale(&sale(money(1000, 0, "JPY"), money(1001, 0, "JPY")), &mut namespace, &mut ids)
            .unwrap_err();
        match err {
            Error::Record { cause, .. } => assert!(matches!(*cause, Error::CommissionOutOfRange { .. })),
            other => panic!("unexpected error: {other}"),
        }
    }
}
