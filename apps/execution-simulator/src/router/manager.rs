//! Multi-venue broker manager.
//!
//! The manager owns a registry of named venues, routes orders to one of them,
//! fans read queries out to all of them and keeps a health cache fresh from a
//! background loop.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::aggregate::BrokerSlot;
use super::factory::VenueFactory;
use super::health::{self, HealthCache};
use super::registry::{BrokerEntry, Registry};
use super::state::{ManagerState, ManagerStatistics, SelectionCriteria};
use crate::config::{ManagerConfig, VenueConfig};
use crate::error::{RouterError, RouterResult, VenueResult};
use crate::models::{
    AccountBalance, InstrumentId, Order, OrderId, Position, Quote, VenueHealth, VenueOrderId,
};
use crate::observability::record_failover;
use crate::venue::VenueAdapter;

struct HealthTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Routes orders across registered venues.
pub struct BrokerManager {
    factory: VenueFactory,
    registry: Arc<RwLock<Registry>>,
    health: Arc<HealthCache>,
    state: RwLock<ManagerState>,
    health_task: Mutex<Option<HealthTask>>,
}

impl std::fmt::Debug for BrokerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerManager")
            .field("state", &self.state())
            .field("brokers", &self.registry.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for BrokerManager {
    fn default() -> Self {
        Self::new(VenueFactory::with_defaults())
    }
}

impl Drop for BrokerManager {
    fn drop(&mut self) {
        if let Some(task) = self.health_task.get_mut().as_ref() {
            task.shutdown.cancel();
        }
    }
}

impl BrokerManager {
    /// Create an empty manager that builds venues with `factory`.
    #[must_use]
    pub fn new(factory: VenueFactory) -> Self {
        Self {
            factory,
            registry: Arc::new(RwLock::new(Registry::default())),
            health: Arc::new(HealthCache::default()),
            state: RwLock::new(ManagerState::Uninitialized),
            health_task: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ManagerState {
        *self.state.read()
    }

    /// Register every configured venue in order and start the health loop.
    ///
    /// Each venue has a health verdict by the time this returns, so unnamed
    /// orders can be routed immediately.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the manager is uninitialized,
    /// `InvalidConfig` if validation fails, and the first `add_broker` error
    /// otherwise. Any failure leaves the manager stopped with no brokers.
    pub async fn initialize(&self, config: ManagerConfig) -> RouterResult<()> {
        {
            let mut state = self.state.write();
            if *state != ManagerState::Uninitialized {
                return Err(RouterError::InvalidState(*state));
            }
            *state = ManagerState::Initializing;
        }
        tracing::info!(venues = config.venues.len(), "Initializing broker manager");

        if let Err(e) = self.register_all(&config).await {
            tracing::error!(error = %e, "Broker manager initialization failed");
            self.teardown().await;
            self.set_state(ManagerState::Stopped);
            return Err(e);
        }

        let shutdown = CancellationToken::new();
        let handle = health::spawn_health_loop(
            Arc::clone(&self.registry),
            Arc::clone(&self.health),
            config.health_check_interval(),
            shutdown.clone(),
        );
        if let Some(previous) = self.health_task.lock().replace(HealthTask { shutdown, handle }) {
            previous.shutdown.cancel();
        }

        self.set_state(ManagerState::Running);
        let (brokers, primary) = {
            let registry = self.registry.read();
            (registry.len(), registry.primary().map(str::to_string))
        };
        tracing::info!(
            brokers,
            primary = primary.as_deref().unwrap_or("none"),
            "Broker manager initialized"
        );
        Ok(())
    }

    async fn register_all(&self, config: &ManagerConfig) -> RouterResult<()> {
        config.validate()?;
        for venue in &config.venues {
            self.add_broker(&venue.name, venue.config.clone()).await?;
        }
        Ok(())
    }

    /// Build, connect, register and health-check a venue under `name`.
    ///
    /// The first broker registered becomes primary.
    ///
    /// # Errors
    ///
    /// `DuplicateBroker` if the name is taken, `InvalidConfig` for a bad
    /// config, `ConnectFailed` if the venue refuses to connect.
    pub async fn add_broker(&self, name: &str, config: VenueConfig) -> RouterResult<()> {
        let state = self.state();
        if matches!(state, ManagerState::ShuttingDown | ManagerState::Stopped) {
            return Err(RouterError::InvalidState(state));
        }
        if self.registry.read().contains(name) {
            return Err(RouterError::DuplicateBroker(name.to_string()));
        }
        config.validate()?;

        let kind = config.name.clone();
        let adapter = self.factory.create(name, &config)?;
        adapter
            .connect()
            .await
            .map_err(|e| RouterError::ConnectFailed {
                broker: name.to_string(),
                reason: e.to_string(),
            })?;

        let inserted = {
            let mut registry = self.registry.write();
            if registry.contains(name) {
                false
            } else {
                registry.insert(BrokerEntry {
                    name: name.to_string(),
                    kind: kind.clone(),
                    adapter: Arc::clone(&adapter),
                });
                true
            }
        };
        if !inserted {
            if let Err(e) = adapter.disconnect().await {
                tracing::warn!(broker = name, error = %e, "Failed to disconnect duplicate broker");
            }
            return Err(RouterError::DuplicateBroker(name.to_string()));
        }

        health::check_one(&self.registry, &self.health, name, adapter.as_ref()).await;
        tracing::info!(
            broker = name,
            kind = %kind,
            healthy = self.health.is_healthy(name),
            "Added broker"
        );
        Ok(())
    }

    /// Disconnect and drop the broker registered as `name`.
    ///
    /// # Errors
    ///
    /// `UnknownBroker` if nothing is registered under `name`.
    pub async fn remove_broker(&self, name: &str) -> RouterResult<()> {
        let entry = self
            .registry
            .write()
            .remove(name)
            .ok_or_else(|| RouterError::UnknownBroker(name.to_string()))?;
        self.health.remove(name);

        if let Err(e) = entry.adapter.disconnect().await {
            tracing::warn!(broker = name, error = %e, "Error disconnecting broker");
        }
        let primary = self.primary_broker();
        tracing::info!(
            broker = name,
            primary = primary.as_deref().unwrap_or("none"),
            "Removed broker"
        );
        Ok(())
    }

    /// The named broker, or the primary when `name` is `None`.
    #[must_use]
    pub fn get_broker(&self, name: Option<&str>) -> Option<Arc<dyn VenueAdapter>> {
        let registry = self.registry.read();
        match name {
            Some(name) => registry.get(name),
            None => registry.primary().and_then(|primary| registry.get(primary)),
        }
    }

    /// Name of the primary broker.
    #[must_use]
    pub fn primary_broker(&self) -> Option<String> {
        self.registry.read().primary().map(str::to_string)
    }

    /// Connected brokers, in registration order.
    #[must_use]
    pub fn available_brokers(&self) -> Vec<String> {
        let brokers = self.registry.read().snapshot();
        brokers
            .into_iter()
            .filter(|(_, adapter)| adapter.is_connected())
            .map(|(name, _)| name)
            .collect()
    }

    /// Brokers whose last health check passed, in registration order.
    #[must_use]
    pub fn healthy_brokers(&self) -> Vec<String> {
        let registry = self.registry.read();
        registry
            .names()
            .filter(|name| self.health.is_healthy(name))
            .map(str::to_string)
            .collect()
    }

    /// Pick a broker according to `criteria`.
    #[must_use]
    pub fn select_best_broker(&self, criteria: SelectionCriteria) -> Option<String> {
        match criteria {
            SelectionCriteria::Health => self.healthy_brokers().into_iter().next(),
            SelectionCriteria::Primary => self.primary_broker(),
            SelectionCriteria::Available => self.available_brokers().into_iter().next(),
        }
    }

    /// Place `order` on the named broker, or the first healthy one.
    ///
    /// If the venue rejects the call, the order is retried once on the first
    /// other healthy broker.
    ///
    /// # Errors
    ///
    /// `UnknownBroker` for an unregistered explicit name. `NoAvailableBroker`
    /// if no broker could be selected, or if the first attempt failed and the
    /// failover was impossible or failed too; its source is the last
    /// `AdapterFailure`.
    pub async fn place_order(
        &self,
        order: Order,
        broker: Option<&str>,
    ) -> RouterResult<VenueOrderId> {
        let target = self.route(broker)?;
        let adapter = self.adapter(&target)?;
        let order_id = order.id.clone();

        let failure = match adapter.place_order(order.clone()).await {
            Ok(venue_order_id) => {
                tracing::info!(broker = %target, %order_id, %venue_order_id, "Order placed");
                return Ok(venue_order_id);
            }
            Err(e) => {
                tracing::warn!(broker = %target, %order_id, error = %e, "Order placement failed");
                RouterError::adapter(&target, e)
            }
        };

        let alternate = self
            .healthy_brokers()
            .into_iter()
            .find(|name| *name != target);
        let Some((alternate, adapter)) =
            alternate.and_then(|name| self.get_broker(Some(&name)).map(|adapter| (name, adapter)))
        else {
            return Err(RouterError::NoAvailableBroker {
                reason: format!("no alternate broker after {target} failed"),
                source: Some(Box::new(failure)),
            });
        };

        tracing::info!(from = %target, to = %alternate, %order_id, "Attempting failover");
        record_failover(&target, &alternate);
        match adapter.place_order(order).await {
            Ok(venue_order_id) => {
                tracing::info!(broker = %alternate, %order_id, %venue_order_id, "Order placed after failover");
                Ok(venue_order_id)
            }
            Err(e) => {
                tracing::warn!(broker = %alternate, %order_id, error = %e, "Failover placement failed");
                Err(RouterError::NoAvailableBroker {
                    reason: format!("failover from {target} to {alternate} failed"),
                    source: Some(Box::new(RouterError::adapter(&alternate, e))),
                })
            }
        }
    }

    /// Cancel on the named broker, or the primary.
    ///
    /// Returns `Ok(false)` when no name is given and there is no primary.
    ///
    /// # Errors
    ///
    /// `UnknownBroker` for an unregistered explicit name, `AdapterFailure` if
    /// the venue call fails.
    pub async fn cancel_order(&self, order_id: &OrderId, broker: Option<&str>) -> RouterResult<bool> {
        let target = match broker {
            Some(name) => name.to_string(),
            None => match self.primary_broker() {
                Some(primary) => primary,
                None => return Ok(false),
            },
        };
        let adapter = self.adapter(&target)?;
        adapter
            .cancel_order(order_id)
            .await
            .map_err(|e| RouterError::adapter(&target, e))
    }

    /// Orders from one broker, or from every broker.
    ///
    /// # Errors
    ///
    /// Only for a named broker: `UnknownBroker` or `AdapterFailure`.
    pub async fn get_orders(&self, broker: Option<&str>) -> RouterResult<Vec<BrokerSlot<Vec<Order>>>> {
        self.fan_out(broker, |adapter| async move { adapter.get_orders().await }.boxed())
            .await
    }

    /// Positions from one broker, or from every broker.
    ///
    /// # Errors
    ///
    /// Only for a named broker: `UnknownBroker` or `AdapterFailure`.
    pub async fn get_positions(
        &self,
        broker: Option<&str>,
    ) -> RouterResult<Vec<BrokerSlot<Vec<Position>>>> {
        self.fan_out(broker, |adapter| async move { adapter.get_positions().await }.boxed())
            .await
    }

    /// Account balance from one broker, or from every broker.
    ///
    /// # Errors
    ///
    /// Only for a named broker: `UnknownBroker` or `AdapterFailure`.
    pub async fn get_account_balance(
        &self,
        broker: Option<&str>,
    ) -> RouterResult<Vec<BrokerSlot<AccountBalance>>> {
        self.fan_out(broker, |adapter| {
            async move { adapter.get_account_balance().await }.boxed()
        })
        .await
    }

    /// Quote from the named broker, or the first healthy one.
    ///
    /// # Errors
    ///
    /// As for [`place_order`](Self::place_order), without failover.
    pub async fn get_quote(
        &self,
        instrument_id: &InstrumentId,
        broker: Option<&str>,
    ) -> RouterResult<Quote> {
        let target = self.route(broker)?;
        let adapter = self.adapter(&target)?;
        adapter
            .get_quote(instrument_id)
            .await
            .map_err(|e| RouterError::adapter(&target, e))
    }

    /// Run one health-check pass now.
    pub async fn run_health_checks(&self) {
        health::check_all(&self.registry, &self.health).await;
    }

    /// Last health verdict per broker.
    #[must_use]
    pub fn get_health_status(&self) -> BTreeMap<String, VenueHealth> {
        self.health.snapshot()
    }

    /// Counts, primary, kinds and state.
    #[must_use]
    pub fn get_statistics(&self) -> ManagerStatistics {
        let (total_brokers, primary_broker, broker_types) = {
            let registry = self.registry.read();
            (
                registry.len(),
                registry.primary().map(str::to_string),
                registry.kinds(),
            )
        };
        ManagerStatistics {
            total_brokers,
            connected_brokers: self.available_brokers().len(),
            healthy_brokers: self.healthy_brokers().len(),
            primary_broker,
            broker_types,
            state: self.state(),
        }
    }

    /// Stop the health loop and disconnect every broker.
    ///
    /// Safe to call in any state and more than once.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.write();
            if matches!(*state, ManagerState::ShuttingDown | ManagerState::Stopped) {
                return;
            }
            *state = ManagerState::ShuttingDown;
        }
        tracing::info!("Shutting down broker manager");

        self.teardown().await;
        self.set_state(ManagerState::Stopped);
        tracing::info!("Broker manager shutdown complete");
    }

    async fn teardown(&self) {
        let task = self.health_task.lock().take();
        if let Some(task) = task {
            task.shutdown.cancel();
            if let Err(e) = task.handle.await {
                tracing::error!(error = %e, "Health check loop failed");
            }
        }

        let entries = self.registry.write().drain();
        for entry in entries {
            match entry.adapter.disconnect().await {
                Ok(()) => tracing::info!(broker = %entry.name, "Disconnected broker"),
                Err(e) => tracing::error!(broker = %entry.name, error = %e, "Error disconnecting broker"),
            }
        }
        self.health.clear();
    }

    fn set_state(&self, next: ManagerState) {
        let previous = std::mem::replace(&mut *self.state.write(), next);
        tracing::debug!(from = %previous, to = %next, "Manager state changed");
    }

    fn route(&self, broker: Option<&str>) -> RouterResult<String> {
        match broker {
            Some(name) => Ok(name.to_string()),
            None => self
                .select_best_broker(SelectionCriteria::Health)
                .ok_or_else(|| RouterError::no_broker("no healthy broker available")),
        }
    }

    fn adapter(&self, name: &str) -> RouterResult<Arc<dyn VenueAdapter>> {
        self.registry
            .read()
            .get(name)
            .ok_or_else(|| RouterError::UnknownBroker(name.to_string()))
    }

    async fn fan_out<T, F>(&self, broker: Option<&str>, call: F) -> RouterResult<Vec<BrokerSlot<T>>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn VenueAdapter>) -> BoxFuture<'static, VenueResult<T>> + Send + Sync,
    {
        if let Some(name) = broker {
            let adapter = self.adapter(name)?;
            let data = call(adapter)
                .await
                .map_err(|e| RouterError::adapter(name, e))?;
            return Ok(vec![BrokerSlot {
                broker: name.to_string(),
                result: Ok(data),
            }]);
        }

        let brokers = self.registry.read().snapshot();
        let calls = brokers.into_iter().map(|(name, adapter)| {
            let pending = call(adapter);
            async move {
                let result = pending.await;
                if let Err(e) = &result {
                    tracing::warn!(broker = %name, error = %e, "Broker query failed");
                }
                BrokerSlot::from_venue(name, result)
            }
        });
        Ok(join_all(calls).await)
    }
}
