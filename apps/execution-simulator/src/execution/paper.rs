//! Simulated venue.
//!
//! A [`PaperVenue`] owns its books and a [`MarketDataSimulator`]. While
//! connected it runs two background tasks: the market tick loop and the
//! order-processing loop. Both stop when the venue disconnects.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::book::VenueBook;
use super::commission::CommissionSchedule;
use super::processor;
use crate::config::{SimulationConfig, VenueConfig};
use crate::error::{ConfigError, VenueError, VenueResult};
use crate::market::{MarketDataSimulator, QuoteCallback, RandomSource, SeededRandom};
use crate::models::{
    AccountBalance, Holding, InstrumentId, Order, OrderId, OrderStatus, Position, Quote, Trade,
    VenueEvent, VenueOrderId,
};
use crate::observability;
use crate::venue::VenueAdapter;

/// Capacity of the per-venue event channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// State shared between the venue handle and its processing task.
pub(crate) struct VenueShared {
    pub name: String,
    pub simulation: SimulationConfig,
    pub schedule: CommissionSchedule,
    pub market: Arc<MarketDataSimulator>,
    pub book: RwLock<VenueBook>,
    pub rng: Mutex<Box<dyn RandomSource>>,
    pub events: broadcast::Sender<VenueEvent>,
}

struct BackgroundTasks {
    shutdown: CancellationToken,
    market: JoinHandle<()>,
    processor: JoinHandle<()>,
}

/// Paper-trading venue with simulated latency, rejects, slippage and charges.
pub struct PaperVenue {
    shared: Arc<VenueShared>,
    config: VenueConfig,
    tasks: Mutex<Option<BackgroundTasks>>,
}

impl std::fmt::Debug for PaperVenue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperVenue")
            .field("name", &self.shared.name)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl PaperVenue {
    /// Create a venue. Randomness is seeded from `config.simulation.seed`.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` from [`VenueConfig::validate`].
    pub fn new(name: impl Into<String>, config: VenueConfig) -> Result<Self, ConfigError> {
        let seed = config.simulation.seed;
        Self::with_random(
            name,
            config,
            Box::new(SeededRandom::from_seed(seed)),
            Box::new(SeededRandom::from_seed(seed.map(|s| s.wrapping_add(1)))),
        )
    }

    /// Create a venue with explicit random sources for the market and the fill model.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` from [`VenueConfig::validate`].
    pub fn with_random(
        name: impl Into<String>,
        config: VenueConfig,
        market_rng: Box<dyn RandomSource>,
        fill_rng: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let name = name.into();
        let market = Arc::new(MarketDataSimulator::with_random(
            &config.simulation,
            market_rng,
        ));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            venue = %name,
            initial_balance = %config.initial_balance,
            "Paper venue initialized"
        );

        let shared = VenueShared {
            name,
            simulation: config.simulation.clone(),
            schedule: CommissionSchedule::from_config(&config),
            market,
            book: RwLock::new(VenueBook::new(config.initial_balance)),
            rng: Mutex::new(fill_rng),
            events,
        };

        Ok(Self {
            shared: Arc::new(shared),
            config,
            tasks: Mutex::new(None),
        })
    }

    /// Configuration the venue was created with.
    #[must_use]
    pub const fn config(&self) -> &VenueConfig {
        &self.config
    }

    /// The venue's market simulator, for price overrides and history.
    #[must_use]
    pub fn market(&self) -> &Arc<MarketDataSimulator> {
        &self.shared.market
    }

    /// Receive order, trade and position events from now on.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<VenueEvent> {
        self.shared.events.subscribe()
    }

    /// Current cash.
    #[must_use]
    pub fn cash(&self) -> Decimal {
        self.shared.book.read().cash()
    }

    fn current_price(&self, position: &Position) -> Decimal {
        self.shared
            .market
            .last_price(&position.instrument_id)
            .unwrap_or(position.last_price)
    }

    fn validate(order: &Order) -> VenueResult<()> {
        if order.quantity <= Decimal::ZERO {
            return Err(VenueError::InvalidOrder(format!(
                "quantity must be positive, got {}",
                order.quantity
            )));
        }
        if let Some(price) = order.price
            && price <= Decimal::ZERO
        {
            return Err(VenueError::InvalidOrder(format!(
                "price must be positive, got {price}"
            )));
        }
        Ok(())
    }
}

impl Drop for PaperVenue {
    fn drop(&mut self) {
        if let Some(tasks) = self.tasks.get_mut().take() {
            tasks.shutdown.cancel();
        }
    }
}

#[async_trait]
impl VenueAdapter for PaperVenue {
    fn name(&self) -> &str {
        &self.shared.name
    }

    async fn connect(&self) -> VenueResult<()> {
        let mut tasks = self.tasks.lock();
        if tasks.is_some() {
            return Ok(());
        }

        let shutdown = CancellationToken::new();
        let market = Arc::clone(&self.shared.market).spawn(shutdown.child_token());
        let processor = tokio::spawn(processor::run(
            Arc::clone(&self.shared),
            shutdown.child_token(),
        ));
        *tasks = Some(BackgroundTasks {
            shutdown,
            market,
            processor,
        });

        tracing::info!(venue = %self.shared.name, "Paper venue connected");
        Ok(())
    }

    async fn disconnect(&self) -> VenueResult<()> {
        let tasks = self.tasks.lock().take();
        let Some(tasks) = tasks else {
            return Ok(());
        };

        tasks.shutdown.cancel();
        for (task, handle) in [("market", tasks.market), ("processor", tasks.processor)] {
            if let Err(e) = handle.await {
                tracing::error!(venue = %self.shared.name, task, error = %e, "Background task failed");
            }
        }

        tracing::info!(venue = %self.shared.name, "Paper venue disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.tasks.lock().is_some()
    }

    async fn place_order(&self, mut order: Order) -> VenueResult<VenueOrderId> {
        if !self.is_connected() {
            return Err(VenueError::NotConnected);
        }
        Self::validate(&order)?;

        let venue_order_id = VenueOrderId::paper();
        order.venue_order_id = Some(venue_order_id.clone());
        order.status = OrderStatus::Pending;
        order.updated_at = Utc::now();

        {
            let mut book = self.shared.book.write();
            book.insert(order.clone())?;
            let _ = self.shared.events.send(VenueEvent::OrderUpdate(order.clone()));
        }

        observability::record_order_placed(&self.shared.name, &order.order_type.to_string());
        tracing::info!(
            venue = %self.shared.name,
            order_id = %order.id,
            venue_order_id = %venue_order_id,
            instrument = %order.instrument_id,
            side = %order.transaction_type,
            quantity = %order.quantity,
            price = %order.price.map_or_else(|| "MARKET".to_string(), |p| p.to_string()),
            "Order placed"
        );
        Ok(venue_order_id)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> VenueResult<bool> {
        let cancelled = {
            let mut book = self.shared.book.write();
            let cancelled = book.cancel(order_id);
            if let Some(order) = &cancelled {
                let _ = self.shared.events.send(VenueEvent::OrderUpdate(order.clone()));
            }
            cancelled.is_some()
        };

        if cancelled {
            tracing::info!(venue = %self.shared.name, order_id = %order_id, "Order cancelled");
        } else {
            tracing::debug!(venue = %self.shared.name, order_id = %order_id, "Order not cancellable");
        }
        Ok(cancelled)
    }

    async fn modify_order(
        &self,
        order_id: &OrderId,
        quantity: Option<Decimal>,
        price: Option<Decimal>,
    ) -> VenueResult<bool> {
        if quantity.is_some_and(|q| q <= Decimal::ZERO) {
            return Err(VenueError::InvalidOrder(
                "replacement quantity must be positive".to_string(),
            ));
        }
        if price.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(VenueError::InvalidOrder(
                "replacement price must be positive".to_string(),
            ));
        }

        let modified = {
            let mut book = self.shared.book.write();
            let modified = book.modify(order_id, quantity, price);
            if let Some(order) = &modified {
                let _ = self.shared.events.send(VenueEvent::OrderUpdate(order.clone()));
            }
            modified.is_some()
        };

        if modified {
            tracing::info!(venue = %self.shared.name, order_id = %order_id, "Order modified");
        }
        Ok(modified)
    }

    async fn get_order_status(&self, order_id: &OrderId) -> VenueResult<Option<Order>> {
        Ok(self.shared.book.read().order(order_id).cloned())
    }

    async fn get_orders(&self) -> VenueResult<Vec<Order>> {
        Ok(self.shared.book.read().orders())
    }

    async fn get_positions(&self) -> VenueResult<Vec<Position>> {
        let mut positions = self.shared.book.read().positions();
        for position in &mut positions {
            let price = self.current_price(position);
            position.mark(price);
        }
        Ok(positions)
    }

    async fn get_position(&self, instrument_id: &InstrumentId) -> VenueResult<Option<Position>> {
        let position = self.shared.book.read().position(instrument_id);
        Ok(position.map(|mut position| {
            let price = self.current_price(&position);
            position.mark(price);
            position
        }))
    }

    async fn get_trades(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> VenueResult<Vec<Trade>> {
        Ok(self.shared.book.read().trades_between(start, end))
    }

    async fn get_quote(&self, instrument_id: &InstrumentId) -> VenueResult<Quote> {
        Ok(self.shared.market.get_quote(instrument_id))
    }

    async fn subscribe_quotes(
        &self,
        instruments: &[InstrumentId],
        callback: QuoteCallback,
    ) -> VenueResult<()> {
        self.shared.market.subscribe(instruments, callback);
        tracing::info!(
            venue = %self.shared.name,
            instruments = instruments.len(),
            "Subscribed to quotes"
        );
        Ok(())
    }

    async fn unsubscribe_quotes(
        &self,
        instruments: &[InstrumentId],
        callback: &QuoteCallback,
    ) -> VenueResult<()> {
        let removed = self.shared.market.unsubscribe(instruments, callback);
        tracing::info!(venue = %self.shared.name, removed, "Unsubscribed from quotes");
        Ok(())
    }

    async fn get_account_balance(&self) -> VenueResult<AccountBalance> {
        let (cash, realized_pnl, positions) = {
            let book = self.shared.book.read();
            (book.cash(), book.realized_pnl(), book.positions())
        };

        let mut unrealized_pnl = Decimal::ZERO;
        let mut used_margin = Decimal::ZERO;
        let mut exposure = Decimal::ZERO;
        for position in &positions {
            let price = self.current_price(position);
            unrealized_pnl += (price - position.average_price) * position.quantity;
            used_margin += position.quantity.abs() * position.average_price;
            exposure += position.quantity * position.average_price;
        }

        Ok(AccountBalance {
            cash,
            available_balance: cash,
            used_margin,
            realized_pnl,
            unrealized_pnl,
            total_balance: cash + exposure + unrealized_pnl,
        })
    }

    async fn get_holdings(&self) -> VenueResult<Vec<Holding>> {
        let positions = self.shared.book.read().positions();
        Ok(positions
            .iter()
            .map(|position| Holding::from_position(position, self.current_price(position)))
            .collect())
    }
}
