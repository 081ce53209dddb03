//! Adverse slippage for market orders.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::TransactionType;

/// Move `price` against the taker by `slippage_pct` percent.
///
/// Buys pay more, sells receive less. The result is rounded to the paisa.
#[must_use]
pub fn apply_slippage(price: Decimal, side: TransactionType, slippage_pct: Decimal) -> Decimal {
    let fraction = slippage_pct.max(Decimal::ZERO) / Decimal::ONE_HUNDRED;
    let adjusted = match side {
        TransactionType::Buy => price * (Decimal::ONE + fraction),
        TransactionType::Sell => price * (Decimal::ONE - fraction),
    };
    adjusted.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
