//! Broker manager integration tests: failover, aggregation and lifecycle.
//!
//! Uses a test venue that wraps a paper venue and can be rigged to fail
//! order placement or balance reads.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use execution_simulator::market::QuoteCallback;
use execution_simulator::models::{AccountBalance, Holding, Position, Quote, Trade};
use execution_simulator::{
    BrokerManager, InstrumentId, ManagerConfig, ManagerState, NamedVenueConfig, Order, OrderId,
    PaperVenue, RouterError, SimulationConfig, TransactionType, VenueAdapter, VenueConfig,
    VenueError, VenueFactory, VenueOrderId, VenueResult,
};

// =============================================================================
// Rigged venue
// =============================================================================

#[derive(Debug, Default)]
struct Calls {
    place_order: AtomicUsize,
}

struct RiggedVenue {
    inner: PaperVenue,
    fail_orders: bool,
    fail_balance: bool,
    calls: Arc<Calls>,
}

#[async_trait]
impl VenueAdapter for RiggedVenue {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn connect(&self) -> VenueResult<()> {
        self.inner.connect().await
    }

    async fn disconnect(&self) -> VenueResult<()> {
        self.inner.disconnect().await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn place_order(&self, order: Order) -> VenueResult<VenueOrderId> {
        self.calls.place_order.fetch_add(1, Ordering::SeqCst);
        if self.fail_orders {
            return Err(VenueError::Internal("rigged order failure".to_string()));
        }
        self.inner.place_order(order).await
    }

    async fn cancel_order(&self, order_id: &OrderId) -> VenueResult<bool> {
        self.inner.cancel_order(order_id).await
    }

    async fn modify_order(
        &self,
        order_id: &OrderId,
        quantity: Option<Decimal>,
        price: Option<Decimal>,
    ) -> VenueResult<bool> {
        self.inner.modify_order(order_id, quantity, price).await
    }

    async fn get_order_status(&self, order_id: &OrderId) -> VenueResult<Option<Order>> {
        self.inner.get_order_status(order_id).await
    }

    async fn get_orders(&self) -> VenueResult<Vec<Order>> {
        self.inner.get_orders().await
    }

    async fn get_positions(&self) -> VenueResult<Vec<Position>> {
        self.inner.get_positions().await
    }

    async fn get_position(&self, instrument_id: &InstrumentId) -> VenueResult<Option<Position>> {
        self.inner.get_position(instrument_id).await
    }

    async fn get_trades(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> VenueResult<Vec<Trade>> {
        self.inner.get_trades(start, end).await
    }

    async fn get_quote(&self, instrument_id: &InstrumentId) -> VenueResult<Quote> {
        self.inner.get_quote(instrument_id).await
    }

    async fn subscribe_quotes(
        &self,
        instruments: &[InstrumentId],
        callback: QuoteCallback,
    ) -> VenueResult<()> {
        self.inner.subscribe_quotes(instruments, callback).await
    }

    async fn unsubscribe_quotes(
        &self,
        instruments: &[InstrumentId],
        callback: &QuoteCallback,
    ) -> VenueResult<()> {
        self.inner.unsubscribe_quotes(instruments, callback).await
    }

    async fn get_account_balance(&self) -> VenueResult<AccountBalance> {
        if self.fail_balance {
            return Err(VenueError::Internal("rigged balance failure".to_string()));
        }
        self.inner.get_account_balance().await
    }

    async fn get_holdings(&self) -> VenueResult<Vec<Holding>> {
        self.inner.get_holdings().await
    }
}

/// Factory with `paper`, `failing-orders` and `failing-balance` kinds. Every
/// venue it builds shares `calls`.
fn rigged_factory(calls: &Arc<Calls>) -> VenueFactory {
    let mut factory = VenueFactory::with_defaults();
    for (kind, fail_orders, fail_balance) in [
        ("paper", false, false),
        ("failing-orders", true, false),
        ("failing-balance", false, true),
    ] {
        let calls = Arc::clone(calls);
        factory = factory.register(kind, move |name, config| {
            Ok(Arc::new(RiggedVenue {
                inner: PaperVenue::new(name, config.clone())?,
                fail_orders,
                fail_balance,
                calls: Arc::clone(&calls),
            }))
        });
    }
    factory
}

fn venue(kind: &str) -> VenueConfig {
    VenueConfig {
        name: kind.to_string(),
        ..VenueConfig::default().with_simulation(SimulationConfig::deterministic())
    }
}

fn config(venues: &[(&str, &str)]) -> ManagerConfig {
    ManagerConfig {
        venues: venues
            .iter()
            .map(|(name, kind)| NamedVenueConfig::new(*name, venue(kind)))
            .collect(),
        ..ManagerConfig::default()
    }
}

async fn running_manager(venues: &[(&str, &str)]) -> (BrokerManager, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let manager = BrokerManager::new(rigged_factory(&calls));
    manager.initialize(config(venues)).await.unwrap();
    (manager, calls)
}

fn order() -> Order {
    Order::market("NSE:INFY", TransactionType::Buy, dec!(1))
}

async fn order_count(manager: &BrokerManager, broker: &str) -> usize {
    let slots = manager.get_orders(Some(broker)).await.unwrap();
    slots[0].data().map_or(0, Vec::len)
}

// =============================================================================
// Failover
// =============================================================================

#[tokio::test]
async fn failing_primary_fails_over_to_healthy_broker() {
    let (manager, calls) = running_manager(&[("A", "failing-orders"), ("B", "paper")]).await;
    assert_eq!(manager.healthy_brokers(), vec!["A", "B"]);

    let venue_order_id = manager.place_order(order(), None).await.unwrap();

    assert!(venue_order_id.as_str().starts_with("PAPER_"));
    assert_eq!(calls.place_order.load(Ordering::SeqCst), 2);
    assert_eq!(order_count(&manager, "A").await, 0);
    assert_eq!(order_count(&manager, "B").await, 1);
    manager.shutdown().await;
}

#[tokio::test]
async fn failover_retries_at_most_once() {
    let (manager, calls) = running_manager(&[
        ("A", "failing-orders"),
        ("B", "failing-orders"),
        ("C", "paper"),
    ])
    .await;

    let err = manager.place_order(order(), None).await.unwrap_err();

    assert!(matches!(err, RouterError::NoAvailableBroker { .. }));
    assert!(err.is_adapter_failure());
    assert_eq!(calls.place_order.load(Ordering::SeqCst), 2);
    assert_eq!(order_count(&manager, "C").await, 0);
    manager.shutdown().await;
}

#[tokio::test]
async fn explicit_broker_failure_without_alternate() {
    let (manager, calls) = running_manager(&[("A", "failing-orders")]).await;

    let err = manager.place_order(order(), Some("A")).await.unwrap_err();

    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert!(source.unwrap().contains("rigged order failure"));
    assert_eq!(calls.place_order.load(Ordering::SeqCst), 1);
    manager.shutdown().await;
}

#[tokio::test]
async fn unnamed_order_routes_before_first_health_loop_pass() {
    let (manager, calls) = running_manager(&[("A", "paper")]).await;

    manager.place_order(order(), None).await.unwrap();

    manager.add_broker("B", venue("paper")).await.unwrap();
    assert_eq!(manager.healthy_brokers(), vec!["A", "B"]);
    manager.remove_broker("A").await.unwrap();
    manager.place_order(order(), None).await.unwrap();

    assert_eq!(calls.place_order.load(Ordering::SeqCst), 2);
    assert_eq!(order_count(&manager, "B").await, 1);
    manager.shutdown().await;
}

// =============================================================================
// Aggregation
// =============================================================================

#[tokio::test]
async fn balance_aggregation_survives_one_failing_broker() {
    let (manager, _) =
        running_manager(&[("A", "paper"), ("B", "failing-balance"), ("C", "paper")]).await;

    let balances = manager.get_account_balance(None).await.unwrap();

    assert_eq!(balances.len(), 3);
    let valid: Vec<_> = balances
        .iter()
        .filter_map(|slot| slot.data().map(|balance| (slot.broker.as_str(), balance.cash)))
        .collect();
    assert_eq!(valid, vec![("A", dec!(1000000)), ("C", dec!(1000000))]);
    assert_eq!(balances[1].broker, "B");
    assert!(balances[1].error().unwrap().contains("rigged balance failure"));

    assert_eq!(manager.healthy_brokers(), vec!["A", "C"]);
    manager.shutdown().await;
}

#[tokio::test]
async fn orders_and_positions_aggregate_per_broker() {
    let (manager, _) = running_manager(&[("A", "paper"), ("B", "paper")]).await;
    manager.place_order(order(), Some("B")).await.unwrap();

    let orders = manager.get_orders(None).await.unwrap();
    let counts: Vec<_> = orders
        .iter()
        .map(|slot| (slot.broker.as_str(), slot.data().map_or(0, Vec::len)))
        .collect();
    assert_eq!(counts, vec![("A", 0), ("B", 1)]);

    let positions = manager.get_positions(None).await.unwrap();
    assert!(positions.iter().all(|slot| slot.is_ok()));
    manager.shutdown().await;
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn zero_venue_startup_is_a_no_op() {
    let manager = BrokerManager::new(VenueFactory::with_defaults());
    manager.initialize(ManagerConfig::default()).await.unwrap();

    assert_eq!(manager.state(), ManagerState::Running);
    assert!(manager.get_account_balance(None).await.unwrap().is_empty());
    assert!(manager.get_health_status().is_empty());
    assert!(matches!(
        manager.get_quote(&InstrumentId::new("NSE:INFY"), None).await,
        Err(RouterError::NoAvailableBroker { .. })
    ));
    manager.shutdown().await;
}

#[tokio::test]
async fn statistics_and_shutdown() {
    let (manager, _) = running_manager(&[("A", "paper"), ("B", "failing-balance")]).await;

    let stats = manager.get_statistics();
    assert_eq!(stats.total_brokers, 2);
    assert_eq!(stats.connected_brokers, 2);
    assert_eq!(stats.healthy_brokers, 1);
    assert_eq!(stats.primary_broker.as_deref(), Some("A"));
    assert_eq!(stats.broker_types["B"], "failing-balance");
    assert_eq!(stats.state, ManagerState::Running);

    let venue = manager.get_broker(Some("B")).unwrap();
    manager.shutdown().await;

    assert_eq!(manager.state(), ManagerState::Stopped);
    assert!(!venue.is_connected());
    assert_eq!(manager.get_statistics().total_brokers, 0);
    manager.shutdown().await;
    assert_eq!(manager.state(), ManagerState::Stopped);
}

#[tokio::test]
async fn cancel_routes_to_primary() {
    let (manager, _) = running_manager(&[("A", "paper")]).await;
    let limit = Order::limit("NSE:INFY", TransactionType::Buy, dec!(1), dec!(0.01))
        .with_id("rest-1");
    manager.place_order(limit, None).await.unwrap();
    let id = OrderId::new("rest-1");

    let venue = manager.get_broker(None).unwrap();
    for _ in 0..200 {
        let status = venue.get_order_status(&id).await.unwrap().unwrap().status;
        if status == execution_simulator::OrderStatus::Open {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    assert!(manager.cancel_order(&id, None).await.unwrap());
    assert!(!manager.cancel_order(&id, Some("A")).await.unwrap());
    manager.shutdown().await;
}
