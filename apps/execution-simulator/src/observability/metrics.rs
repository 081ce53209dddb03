//! Prometheus metrics for venues and the broker manager.
//!
//! The `record_*` functions are no-ops until a recorder is installed, so
//! library users and tests pay nothing unless a host calls [`init_metrics`].

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Exporter listening on `addr`.
    #[must_use]
    pub const fn with_addr(addr: SocketAddr) -> Self {
        Self { listen_addr: addr }
    }
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Start the Prometheus exporter, serving `/metrics`.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(addr = %config.listen_addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Record an order accepted by a venue.
pub fn record_order_placed(venue: &str, order_type: &str) {
    counter!(
        "venue_orders_placed_total",
        "venue" => venue.to_string(),
        "order_type" => order_type.to_string()
    )
    .increment(1);
}

/// Record a filled order.
pub fn record_order_filled(venue: &str, order_type: &str) {
    counter!(
        "venue_orders_filled_total",
        "venue" => venue.to_string(),
        "order_type" => order_type.to_string()
    )
    .increment(1);
}

/// Record a rejected order.
///
/// * `reason` - e.g. `"simulated"`, `"missing_limit_price"`
pub fn record_order_rejected(venue: &str, reason: &str) {
    counter!(
        "venue_orders_rejected_total",
        "venue" => venue.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a failover from one broker to another.
pub fn record_failover(from: &str, to: &str) {
    counter!(
        "router_failovers_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

/// Publish the latest health verdict of a broker (1 healthy, 0 unhealthy).
pub fn record_venue_health(broker: &str, healthy: bool) {
    gauge!("router_venue_healthy", "broker" => broker.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
