//! Error types for venues, the broker manager and configuration.
//!
//! Venue-level failures are reported as [`VenueError`]. The broker manager
//! wraps them in [`RouterError`] together with the broker name so callers can
//! tell which venue failed. Configuration validation reports [`ConfigError`].

use thiserror::Error;

use crate::models::{OrderId, OrderStatus};
use crate::router::ManagerState;

/// Errors raised by a venue adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VenueError {
    /// The venue is not connected.
    #[error("Venue is not connected")]
    NotConnected,

    /// An order state transition was attempted that the lifecycle forbids.
    #[error("Invalid order state transition for {order_id}: {from} -> {to}")]
    InvalidOrderState {
        /// Order that was being transitioned.
        order_id: OrderId,
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// The order failed validation.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The venue does not implement the operation.
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// Unexpected internal failure.
    #[error("Internal venue error: {0}")]
    Internal(String),
}

/// Result alias for venue operations.
pub type VenueResult<T> = Result<T, VenueError>;

/// Errors raised by the broker manager.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No broker is registered under the given name.
    #[error("Unknown broker: {0}")]
    UnknownBroker(String),

    /// No broker could serve the request.
    #[error("No available broker: {reason}")]
    NoAvailableBroker {
        /// Why no broker qualified.
        reason: String,
        /// Last adapter failure, when a broker was tried.
        #[source]
        source: Option<Box<RouterError>>,
    },

    /// A broker returned an error.
    #[error("Broker {broker} failed: {source}")]
    AdapterFailure {
        /// Broker that failed.
        broker: String,
        /// Underlying venue error.
        #[source]
        source: VenueError,
    },

    /// Connecting a newly added broker failed.
    #[error("Failed to connect broker {broker}: {reason}")]
    ConnectFailed {
        /// Broker that failed to connect.
        broker: String,
        /// Failure description.
        reason: String,
    },

    /// A broker with this name is already registered.
    #[error("Broker already registered: {0}")]
    DuplicateBroker(String),

    /// The supplied configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The manager is not in a state that allows the operation.
    #[error("Broker manager is {0}")]
    InvalidState(ManagerState),
}

impl RouterError {
    /// Wrap a venue error with the name of the broker that produced it.
    pub fn adapter(broker: impl Into<String>, source: VenueError) -> Self {
        Self::AdapterFailure {
            broker: broker.into(),
            source,
        }
    }

    /// No broker qualified and none was tried.
    pub fn no_broker(reason: impl Into<String>) -> Self {
        Self::NoAvailableBroker {
            reason: reason.into(),
            source: None,
        }
    }

    /// Returns true when the error came from a venue adapter, directly or
    /// through a failed failover.
    pub fn is_adapter_failure(&self) -> bool {
        match self {
            Self::AdapterFailure { .. } => true,
            Self::NoAvailableBroker {
                source: Some(source),
                ..
            } => source.is_adapter_failure(),
            _ => false,
        }
    }
}

/// Result alias for broker manager operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric field is outside its allowed range.
    #[error("{field} is out of range: {reason}")]
    OutOfRange {
        /// Offending field.
        field: &'static str,
        /// Constraint that was violated.
        reason: String,
    },

    /// Latency bounds are inverted.
    #[error("latency_min_ms ({min}) must not exceed latency_max_ms ({max})")]
    InvertedLatency {
        /// Configured minimum.
        min: u64,
        /// Configured maximum.
        max: u64,
    },

    /// Two venues share the same name.
    #[error("Duplicate venue name: {0}")]
    DuplicateVenue(String),

    /// A venue name is empty.
    #[error("Venue name must not be empty")]
    EmptyVenueName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_error_display() {
        let err = VenueError::InvalidOrderState {
            order_id: OrderId::new("ord-1"),
            from: OrderStatus::Complete,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(
            err.to_string(),
            "Invalid order state transition for ord-1: COMPLETE -> CANCELLED"
        );
        assert_eq!(VenueError::NotConnected.to_string(), "Venue is not connected");
    }

    #[test]
    fn adapter_failure_keeps_source() {
        let err = RouterError::adapter("zerodha", VenueError::NotConnected);
        assert_eq!(err.to_string(), "Broker zerodha failed: Venue is not connected");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Venue is not connected"));
    }

    #[test]
    fn no_available_broker_wraps_last_failure() {
        let err = RouterError::NoAvailableBroker {
            reason: "failover to b failed".to_string(),
            source: Some(Box::new(RouterError::adapter("b", VenueError::NotConnected))),
        };
        assert!(err.is_adapter_failure());
        assert!(!RouterError::no_broker("none registered").is_adapter_failure());
    }

    #[test]
    fn config_error_converts_into_router_error() {
        let err: RouterError = ConfigError::EmptyVenueName.into();
        assert!(matches!(err, RouterError::InvalidConfig(ConfigError::EmptyVenueName)));
    }
}
