//! Market quotes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::InstrumentId;

/// A synthetic top-of-book quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Quoted instrument.
    pub instrument_id: InstrumentId,
    /// Bid price.
    pub bid: Decimal,
    /// Ask price.
    pub ask: Decimal,
    /// Last traded price.
    pub last_price: Decimal,
    /// Synthetic traded volume.
    pub volume: u64,
    /// Quote time.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Ask minus bid.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}
