//! Executed trades.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{InstrumentId, OrderId, TradeId, TransactionType};

/// A single execution. Each completed order yields exactly one trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade identifier.
    pub id: TradeId,
    /// Order that produced the trade.
    pub order_id: OrderId,
    /// Instrument traded.
    pub instrument_id: InstrumentId,
    /// Unsigned quantity.
    pub quantity: Decimal,
    /// Fill price.
    pub price: Decimal,
    /// Buy or sell.
    pub transaction_type: TransactionType,
    /// Execution time.
    pub timestamp: DateTime<Utc>,
    /// Total charges for the fill.
    pub commission: Decimal,
}

impl Trade {
    /// Price times quantity.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }

    /// Cash impact: buys pay notional plus charges, sells receive notional less charges.
    #[must_use]
    pub fn cash_delta(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Buy => -(self.notional() + self.commission),
            TransactionType::Sell => self.notional() - self.commission,
        }
    }
}
