//! Venue adapter trait definition.
//!
//! Every venue the broker manager can route to implements [`VenueAdapter`]:
//! the simulated [`PaperVenue`](crate::execution::PaperVenue) and the
//! [`LiveVenue`](super::LiveVenue) binding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::VenueResult;
use crate::market::QuoteCallback;
use crate::models::{
    AccountBalance, Holding, InstrumentId, Order, OrderId, Position, Quote, Trade, VenueHealth,
    VenueOrderId,
};

/// Capability set of a trading venue.
///
/// Implementations must be usable behind `Arc<dyn VenueAdapter>` and safe to
/// call from any task.
///
/// # Order Lifecycle
///
/// 1. **PENDING**: accepted by [`place_order`](Self::place_order)
/// 2. **OPEN**: resting limit order, waiting for the market to cross
/// 3. **COMPLETE**: filled, exactly one trade recorded
/// 4. **CANCELLED**: cancelled while OPEN
/// 5. **REJECTED**: refused by the venue
///
/// # Error Handling
///
/// Only order submission requires a connection. Reads work on a disconnected
/// venue and return whatever it last knew.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    /// Venue name used in logs.
    fn name(&self) -> &str;

    /// Start the venue's background work. Idempotent.
    async fn connect(&self) -> VenueResult<()>;

    /// Stop background work and wait for it to finish. Idempotent.
    async fn disconnect(&self) -> VenueResult<()>;

    /// Whether the venue is connected.
    fn is_connected(&self) -> bool;

    /// Submit an order.
    ///
    /// # Returns
    ///
    /// * `Ok(VenueOrderId)` - Venue-assigned id; the order is now PENDING
    /// * `Err(VenueError::NotConnected)` - Venue is disconnected
    /// * `Err(VenueError::InvalidOrder)` - Non-positive quantity or duplicate id
    async fn place_order(&self, order: Order) -> VenueResult<VenueOrderId>;

    /// Cancel an order.
    ///
    /// Returns `Ok(true)` only if the order was OPEN and is now CANCELLED.
    /// Unknown orders and orders in any other status yield `Ok(false)`.
    async fn cancel_order(&self, order_id: &OrderId) -> VenueResult<bool>;

    /// Replace quantity and/or price of an OPEN order.
    ///
    /// Returns `Ok(false)` when the order is unknown or not OPEN.
    async fn modify_order(
        &self,
        order_id: &OrderId,
        quantity: Option<Decimal>,
        price: Option<Decimal>,
    ) -> VenueResult<bool>;

    /// Snapshot of one order.
    async fn get_order_status(&self, order_id: &OrderId) -> VenueResult<Option<Order>>;

    /// Snapshot of every order, in submission order.
    async fn get_orders(&self) -> VenueResult<Vec<Order>>;

    /// Open positions.
    async fn get_positions(&self) -> VenueResult<Vec<Position>>;

    /// Open position in one instrument.
    async fn get_position(&self, instrument_id: &InstrumentId) -> VenueResult<Option<Position>>;

    /// Trades, optionally limited to an inclusive time range.
    async fn get_trades(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> VenueResult<Vec<Trade>>;

    /// Current quote.
    async fn get_quote(&self, instrument_id: &InstrumentId) -> VenueResult<Quote>;

    /// Register `callback` for quotes on each instrument.
    async fn subscribe_quotes(
        &self,
        instruments: &[InstrumentId],
        callback: QuoteCallback,
    ) -> VenueResult<()>;

    /// Remove registrations of this exact callback.
    async fn unsubscribe_quotes(
        &self,
        instruments: &[InstrumentId],
        callback: &QuoteCallback,
    ) -> VenueResult<()>;

    /// Balance computed from cash and open positions.
    async fn get_account_balance(&self) -> VenueResult<AccountBalance>;

    /// Open positions valued at current prices.
    async fn get_holdings(&self) -> VenueResult<Vec<Holding>>;

    /// Liveness probe. Healthy when the account balance can be read.
    async fn health_check(&self) -> VenueHealth {
        let connected = self.is_connected();
        match self.get_account_balance().await {
            Ok(_) => VenueHealth::healthy(connected),
            Err(e) => VenueHealth::unhealthy(connected, e.to_string()),
        }
    }
}
