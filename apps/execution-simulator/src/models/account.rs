//! Derived account views.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{InstrumentId, Position};

/// Account balance computed on demand from cash and open positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Cash on hand.
    pub cash: Decimal,
    /// Cash available for new orders.
    pub available_balance: Decimal,
    /// Capital tied up in open positions (sum of |qty| x avg).
    pub used_margin: Decimal,
    /// Realized profit since the venue was created.
    pub realized_pnl: Decimal,
    /// Mark-to-market profit on open positions.
    pub unrealized_pnl: Decimal,
    /// Mark-to-market equity.
    pub total_balance: Decimal,
}

/// Per-position view with live profit figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Instrument held.
    pub instrument_id: InstrumentId,
    /// Signed quantity.
    pub quantity: Decimal,
    /// Average entry price.
    pub average_price: Decimal,
    /// Current simulated price.
    pub current_price: Decimal,
    /// Profit at the current price.
    pub pnl: Decimal,
    /// Profit as a percentage of cost basis (0 when the basis is zero).
    pub pnl_percentage: Decimal,
}

impl Holding {
    /// Value `position` at `current_price`.
    #[must_use]
    pub fn from_position(position: &Position, current_price: Decimal) -> Self {
        let pnl = (current_price - position.average_price) * position.quantity;
        let basis = position.average_price * position.quantity.abs();
        let pnl_percentage = if basis.is_zero() {
            Decimal::ZERO
        } else {
            pnl / basis * Decimal::ONE_HUNDRED
        };
        Self {
            instrument_id: position.instrument_id.clone(),
            quantity: position.quantity,
            average_price: position.average_price,
            current_price,
            pnl,
            pnl_percentage,
        }
    }
}
