//! Net position per instrument.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{InstrumentId, TransactionType};

/// Net position in one instrument. Positive quantity is long, negative short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument held.
    pub instrument_id: InstrumentId,
    /// Signed quantity.
    pub quantity: Decimal,
    /// Average entry price of the open quantity.
    pub average_price: Decimal,
    /// Most recent price seen for the instrument.
    pub last_price: Decimal,
    /// Profit realized by fills that reduced this position.
    pub realized_pnl: Decimal,
    /// Mark-to-market profit on the open quantity.
    pub unrealized_pnl: Decimal,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// A flat position in `instrument_id`.
    #[must_use]
    pub fn flat(instrument_id: InstrumentId) -> Self {
        Self {
            instrument_id,
            quantity: Decimal::ZERO,
            average_price: Decimal::ZERO,
            last_price: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    /// Returns true when no quantity is held.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Apply a fill and return the profit it realized.
    ///
    /// Same-direction fills blend into a quantity-weighted average price.
    /// Reducing fills keep the average and realize `(price - avg) * closed`
    /// (negated for shorts). A fill that flips the sign opens the remainder
    /// at the fill price.
    pub fn apply_fill(
        &mut self,
        side: TransactionType,
        quantity: Decimal,
        price: Decimal,
    ) -> Decimal {
        let signed = quantity * side.sign();
        let previous = self.quantity;
        let mut realized = Decimal::ZERO;

        if previous.is_zero() || previous.is_sign_positive() == signed.is_sign_positive() {
            let held = previous.abs();
            self.average_price = (held * self.average_price + quantity * price) / (held + quantity);
        } else {
            let closed = previous.abs().min(quantity);
            let direction = if previous.is_sign_positive() {
                Decimal::ONE
            } else {
                Decimal::NEGATIVE_ONE
            };
            realized = (price - self.average_price) * closed * direction;
            if quantity > previous.abs() {
                self.average_price = price;
            }
        }

        self.quantity = previous + signed;
        self.realized_pnl += realized;
        self.mark(price);
        realized
    }

    /// Re-price the open quantity at `price`.
    pub fn mark(&mut self, price: Decimal) {
        self.last_price = price;
        self.unrealized_pnl = (price - self.average_price) * self.quantity;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat() -> Position {
        Position::flat(InstrumentId::new("NSE:INFY"))
    }

    #[test]
    fn same_direction_fills_average() {
        let mut pos = flat();
        pos.apply_fill(TransactionType::Buy, dec!(10), dec!(100));
        pos.apply_fill(TransactionType::Buy, dec!(30), dec!(120));
        assert_eq!(pos.quantity, dec!(40));
        assert_eq!(pos.average_price, dec!(115));
    }

    #[test]
    fn partial_reduction_keeps_average_and_realizes() {
        let mut pos = flat();
        pos.apply_fill(TransactionType::Buy, dec!(10), dec!(100));
        let realized = pos.apply_fill(TransactionType::Sell, dec!(4), dec!(110));
        assert_eq!(realized, dec!(40));
        assert_eq!(pos.quantity, dec!(6));
        assert_eq!(pos.average_price, dec!(100));
        assert_eq!(pos.realized_pnl, dec!(40));
        assert_eq!(pos.unrealized_pnl, dec!(60));
    }

    #[test]
    fn flip_resets_average_to_fill_price() {
        let mut pos = flat();
        pos.apply_fill(TransactionType::Buy, dec!(5), dec!(100));
        let realized = pos.apply_fill(TransactionType::Sell, dec!(8), dec!(90));
        assert_eq!(realized, dec!(-50));
        assert_eq!(pos.quantity, dec!(-3));
        assert_eq!(pos.average_price, dec!(90));
    }

    #[test]
    fn short_cover_realizes_with_inverted_sign() {
        let mut pos = flat();
        pos.apply_fill(TransactionType::Sell, dec!(10), dec!(200));
        assert_eq!(pos.quantity, dec!(-10));
        let realized = pos.apply_fill(TransactionType::Buy, dec!(10), dec!(180));
        assert_eq!(realized, dec!(200));
        assert!(pos.is_flat());
    }

    #[test]
    fn mark_updates_unrealized_for_shorts() {
        let mut pos = flat();
        pos.apply_fill(TransactionType::Sell, dec!(2), dec!(50));
        pos.mark(dec!(45));
        assert_eq!(pos.unrealized_pnl, dec!(10));
        assert_eq!(pos.last_price, dec!(45));
    }
}
