//! Service layer - business logic orchestration
//!
//! The split and reconciliation engines each turn one record into at most one
//! balanced transaction. `ConversionService` runs them over a batch.

mod conversion;
mod deposit;
mod price;
mod settlement;
mod split;

pub use conversion::{ConversionResult, ConversionService, RejectedRecord};
pub use deposit::reconcile_deposit;
pub use price::derive_prices;
pub use settlement::match_settlements;
pub use split::{split_sale, COMMISSION_MEMO};
