//! Live venue binding.
//!
//! Placeholder for a real broker connection. It tracks a connection flag and
//! reports every trading and read call as unsupported, so the broker manager
//! always sees it as unhealthy and routes elsewhere.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::VenueAdapter;
use crate::config::VenueConfig;
use crate::error::{VenueError, VenueResult};
use crate::market::QuoteCallback;
use crate::models::{
    AccountBalance, Holding, InstrumentId, Order, OrderId, Position, Quote, Trade, VenueOrderId,
};

/// Live venue without a wire implementation.
#[derive(Debug)]
pub struct LiveVenue {
    name: String,
    config: VenueConfig,
    connected: AtomicBool,
}

impl LiveVenue {
    /// Create a live venue.
    #[must_use]
    pub fn new(name: impl Into<String>, config: VenueConfig) -> Self {
        Self {
            name: name.into(),
            config,
            connected: AtomicBool::new(false),
        }
    }

    /// Configuration the venue was created with.
    #[must_use]
    pub const fn config(&self) -> &VenueConfig {
        &self.config
    }

    fn unsupported<T>(&self, operation: &str) -> VenueResult<T> {
        tracing::debug!(venue = %self.name, operation, "Live venue call not implemented");
        Err(VenueError::Unsupported(format!(
            "{operation} is not implemented for live venue {}",
            self.name
        )))
    }
}

#[async_trait]
impl VenueAdapter for LiveVenue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> VenueResult<()> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            tracing::warn!(venue = %self.name, "Live venue connected without a trading backend");
        }
        Ok(())
    }

    async fn disconnect(&self) -> VenueResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn place_order(&self, _order: Order) -> VenueResult<VenueOrderId> {
        self.unsupported("place_order")
    }

    async fn cancel_order(&self, _order_id: &OrderId) -> VenueResult<bool> {
        self.unsupported("cancel_order")
    }

    async fn modify_order(
        &self,
        _order_id: &OrderId,
        _quantity: Option<Decimal>,
        _price: Option<Decimal>,
    ) -> VenueResult<bool> {
        self.unsupported("modify_order")
    }

    async fn get_order_status(&self, _order_id: &OrderId) -> VenueResult<Option<Order>> {
        self.unsupported("get_order_status")
    }

    async fn get_orders(&self) -> VenueResult<Vec<Order>> {
        self.unsupported("get_orders")
    }

    async fn get_positions(&self) -> VenueResult<Vec<Position>> {
        self.unsupported("get_positions")
    }

    async fn get_position(&self, _instrument_id: &InstrumentId) -> VenueResult<Option<Position>> {
        self.unsupported("get_position")
    }

    async fn get_trades(
        &self,
        _start: Option<DateTime<Utc>>,
        _end: Option<DateTime<Utc>>,
    ) -> VenueResult<Vec<Trade>> {
        self.unsupported("get_trades")
    }

    async fn get_quote(&self, _instrument_id: &InstrumentId) -> VenueResult<Quote> {
        self.unsupported("get_quote")
    }

    async fn subscribe_quotes(
        &self,
        _instruments: &[InstrumentId],
        _callback: QuoteCallback,
    ) -> VenueResult<()> {
        self.unsupported("subscribe_quotes")
    }

    async fn unsubscribe_quotes(
        &self,
        _instruments: &[InstrumentId],
        _callback: &QuoteCallback,
    ) -> VenueResult<()> {
        self.unsupported("unsubscribe_quotes")
    }

    async fn get_account_balance(&self) -> VenueResult<AccountBalance> {
        self.unsupported("get_account_balance")
    }

    async fn get_holdings(&self) -> VenueResult<Vec<Holding>> {
        self.unsupported("get_holdings")
    }
}
