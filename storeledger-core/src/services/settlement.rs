//! Settlement matching - date deposits by when the bank actually received them

use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{DepositRecord, PaymentLogEntry};

/// Match deposits against the payment log
///
/// Deposits are taken in slice order. Each one takes the first unused log entry
/// with the same amount dated strictly after its estimated date, moves to that
/// date and records the log's transaction id as its reference. Returns the number
/// of deposits matched; a deposit with no candidate fails the whole match.
pub fn match_settlements(deposits: &mut [DepositRecord], mut log: Vec<PaymentLogEntry>) -> Result<usize> {
    let mut matched = 0;

    for deposit in deposits.iter_mut() {
        let amount = deposit.net()?;
        let position = log
            .iter()
            .position(|entry| entry.amount == amount && entry.date > deposit.date);

        let Some(position) = position else {
            return Err(Error::UnmatchedPayment {
                amount,
                after: deposit.date,
            });
        };

        let entry = log.remove(position);
        debug!(
            amount = %amount,
            estimated = %deposit.date,
            settled = %entry.date,
            reference = %entry.transaction_id,
            "matched deposit to payment"
        );
        deposit.date = entry.date;
        deposit.estimated = false;
        deposit.reference = Some(entry.transaction_id);
        matched += 1;
    }

    Ok(matched)
}
