//! Logging and metrics.

mod logging;
mod metrics;

pub use logging::{DEFAULT_FILTER, LoggingConfig, LoggingError, build_filter, init_tracing};
pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_failover, record_order_filled,
    record_order_placed, record_order_rejected, record_venue_health,
};
