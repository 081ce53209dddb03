//! Cached venue health and the periodic check loop.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::registry::Registry;
use crate::models::VenueHealth;
use crate::observability::record_venue_health;
use crate::venue::VenueAdapter;

/// Last health verdict per broker name.
#[derive(Debug, Default)]
pub(crate) struct HealthCache {
    entries: RwLock<HashMap<String, VenueHealth>>,
}

impl HealthCache {
    pub fn is_healthy(&self, broker: &str) -> bool {
        self.entries
            .read()
            .get(broker)
            .is_some_and(VenueHealth::is_healthy)
    }

    pub fn record(&self, broker: &str, health: VenueHealth) {
        self.entries.write().insert(broker.to_string(), health);
    }

    pub fn remove(&self, broker: &str) {
        self.entries.write().remove(broker);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn snapshot(&self) -> BTreeMap<String, VenueHealth> {
        self.entries
            .read()
            .iter()
            .map(|(name, health)| (name.clone(), health.clone()))
            .collect()
    }
}

/// Check every registered broker concurrently and cache the verdicts.
///
/// A verdict is only stored if the broker is still registered when the check
/// returns, so a concurrent removal never leaves a stale entry behind.
pub(crate) async fn check_all(registry: &RwLock<Registry>, cache: &HealthCache) {
    let brokers = registry.read().snapshot();
    if brokers.is_empty() {
        return;
    }

    let checks = brokers
        .into_iter()
        .map(|(name, adapter)| async move { (name, run_check(adapter.as_ref()).await) });
    let results = join_all(checks).await;

    let registry = registry.read();
    for (name, health) in results {
        store(&registry, cache, &name, health);
    }
}

/// Check one broker and cache the verdict, under the same rule as [`check_all`].
pub(crate) async fn check_one(
    registry: &RwLock<Registry>,
    cache: &HealthCache,
    name: &str,
    adapter: &dyn VenueAdapter,
) {
    let health = run_check(adapter).await;
    store(&registry.read(), cache, name, health);
}

async fn run_check(adapter: &dyn VenueAdapter) -> VenueHealth {
    match AssertUnwindSafe(adapter.health_check()).catch_unwind().await {
        Ok(health) => health,
        Err(_) => VenueHealth::unhealthy(adapter.is_connected(), "health check panicked"),
    }
}

fn store(registry: &Registry, cache: &HealthCache, name: &str, health: VenueHealth) {
    if !registry.contains(name) {
        return;
    }
    let healthy = health.is_healthy();
    if healthy {
        tracing::debug!(broker = %name, connected = health.connected, "Broker healthy");
    } else {
        tracing::warn!(
            broker = %name,
            connected = health.connected,
            error = health.error.as_deref().unwrap_or("unknown"),
            "Broker health check failed"
        );
    }
    record_venue_health(name, healthy);
    cache.record(name, health);
}

/// Run [`check_all`] every `interval` until cancelled.
///
/// The first pass runs after one interval; brokers get their initial verdict
/// when they are added.
pub(crate) fn spawn_health_loop(
    registry: Arc<RwLock<Registry>>,
    cache: Arc<HealthCache>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs(), "Health check loop started");
        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = shutdown.cancelled() => break,
            }
            tokio::select! {
                () = check_all(&registry, &cache) => {}
                () = shutdown.cancelled() => break,
            }
        }
        tracing::info!("Health check loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenueConfig;
    use crate::execution::PaperVenue;
    use crate::router::registry::BrokerEntry;
    use crate::venue::LiveVenue;

    fn paper(name: &str) -> Arc<dyn VenueAdapter> {
        Arc::new(PaperVenue::new(name, VenueConfig::default()).unwrap())
    }

    fn live(name: &str) -> Arc<dyn VenueAdapter> {
        Arc::new(LiveVenue::new(name, VenueConfig::of_kind("live")))
    }

    fn registry_with(entries: Vec<(&str, Arc<dyn VenueAdapter>)>) -> RwLock<Registry> {
        let mut registry = Registry::default();
        for (name, adapter) in entries {
            registry.insert(BrokerEntry {
                name: name.to_string(),
                kind: "test".to_string(),
                adapter,
            });
        }
        RwLock::new(registry)
    }

    #[tokio::test]
    async fn check_all_caches_each_verdict() {
        let registry = registry_with(vec![
            ("paper", paper("paper")),
            ("live", live("live")),
        ]);
        let cache = HealthCache::default();

        check_all(&registry, &cache).await;

        assert!(cache.is_healthy("paper"));
        assert!(!cache.is_healthy("live"));
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot["live"].error.is_some());
    }

    #[tokio::test]
    async fn unknown_brokers_are_unhealthy() {
        let cache = HealthCache::default();
        assert!(!cache.is_healthy("missing"));
    }

    #[tokio::test]
    async fn check_one_skips_unregistered_broker() {
        let registry = registry_with(vec![("paper", paper("paper"))]);
        let cache = HealthCache::default();
        let stray = paper("stray");

        check_one(&registry, &cache, "stray", stray.as_ref()).await;
        check_one(&registry, &cache, "paper", paper("paper").as_ref()).await;

        assert!(cache.is_healthy("paper"));
        assert!(!cache.snapshot().contains_key("stray"));
    }

    #[tokio::test]
    async fn loop_rechecks_each_interval_and_stops_on_cancel() {
        let registry = Arc::new(registry_with(vec![("paper", paper("paper"))]));
        let cache = Arc::new(HealthCache::default());
        let shutdown = CancellationToken::new();

        let handle = spawn_health_loop(
            Arc::clone(&registry),
            Arc::clone(&cache),
            Duration::from_millis(10),
            shutdown.clone(),
        );
        for _ in 0..100 {
            if cache.is_healthy("paper") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(cache.is_healthy("paper"));

        shutdown.cancel();
        handle.await.unwrap();
    }
}
