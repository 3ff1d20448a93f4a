//! Price derivation from deposits

use crate::domain::result::{Error, Result};
use crate::domain::{Currency, DepositRecord, DepositSource, ExchangeRate, PricePoint};

/// Rate implied by one deposit source line
///
/// `None` when no conversion happened: the source is already in the bank
/// currency, or both amounts are zero. Reconciliation and price derivation both
/// go through here so they always agree on the rate.
pub(crate) fn source_rate(source: &DepositSource, bank: &Currency) -> Result<Option<ExchangeRate>> {
    source.converted.ensure_currency(bank)?;

    if source.amount.currency() == bank {
        if source.amount != source.converted {
            return Err(Error::ConversionWithinCurrency {
                amount: source.amount.clone(),
                converted: source.converted.clone(),
            });
        }
        return Ok(None);
    }

    if source.amount.is_zero() && source.converted.is_zero() {
        return Ok(None);
    }

    ExchangeRate::derive(&source.amount, &source.converted).map(Some)
}

/// One price point per converted source currency, dated at the deposit
pub fn derive_prices(deposit: &DepositRecord) -> Result<Vec<PricePoint>> {
    let in_record = |e: Error| e.for_record(deposit.record_ref());
    let mut prices = Vec::new();
    for source in &deposit.grouped_sources().map_err(in_record)? {
        if let Some(rate) = source_rate(source, &deposit.bank_currency).map_err(in_record)? {
            prices.push(rate.price_point(deposit.date));
        }
    }
    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn money(amount: i64, scale: u32, code: &str) -> Money {
        Money::new(Decimal::new(amount, scale), Currency::new(code).unwrap())
    }

    fn deposit(sources: Vec<DepositSource>) -> DepositRecord {
        DepositRecord {
            date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            estimated: false,
            description: "Checking".to_string(),
            bank_currency: Currency::new("USD").unwrap(),
            sources,
            line_items: Vec::new(),
            reference: None,
        }
    }

    fn source(amount: Money, converted: Money) -> DepositSource {
        DepositSource { amount, converted }
    }

    #[test]
    fn test_jpy_price() {
        let prices = derive_prices(&deposit(vec![source(money(700, 0, "JPY"), money(650, 2, "USD"))])).unwrap();

        assert_eq!(prices.len(), 1);
        let price = &prices[0];
        assert_eq!(price.from.as_str(), "JPY");
        assert_eq!(price.to.as_str(), "USD");
        assert_eq!(price.date, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert!(price.rate.to_string().starts_with("0.009285714"));
        assert!(price.rate > Decimal::ZERO);
    }

    #[test]
    fn test_bank_currency_source_has_no_price() {
        let prices = derive_prices(&deposit(vec![
            source(money(1000, 2, "USD"), money(1000, 2, "USD")),
            source(money(200, 0, "EUR"), money(21600, 2, "USD")),
        ]))
        .unwrap();

        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].from.as_str(), "EUR");
        assert_eq!(prices[0].rate, Decimal::new(108, 2));
    }

    #[test]
    fn test_one_price_per_source_currency() {
        let mut record = deposit(vec![
            source(money(1000, 2, "USD"), money(920, 2, "EUR")),
            source(money(500, 2, "USD"), money(463, 2, "EUR")),
        ]);
        record.bank_currency = Currency::new("EUR").unwrap();

        let prices = derive_prices(&record).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].from.as_str(), "USD");
        assert_eq!(prices[0].to.as_str(), "EUR");
        assert_eq!(prices[0].rate, Decimal::new(922, 3));
    }

    #[test]
    fn test_undefined_rate_rejected() {
        let err = derive_prices(&deposit(vec![source(money(0, 0, "JPY"), money(650, 2, "USD"))])).unwrap_err();
        assert!(err.is_record_error());

        let err = derive_prices(&deposit(vec![source(money(700, 0, "JPY"), money(0, 2, "USD"))])).unwrap_err();
        assert!(err.is_record_error());
    }

    #[test]
    fn test_both_zero_is_skipped() {
        let prices = derive_prices(&deposit(vec![source(money(0, 0, "JPY"), money(0, 2, "USD"))])).unwrap();
        assert!(prices.is_empty());
    }

    #[test]
    fn test_same_currency_must_match() {
        let err = derive_prices(&deposit(vec![source(money(1000, 2, "USD"), money(999, 2, "USD"))])).unwrap_err();
        match err {
            Error::Record { cause, .. } => assert!(matches!(*cause, Error::ConversionWithinCurrency { .. })),
            other => panic!("unexpected error: {other}"),
        }
    }
}
