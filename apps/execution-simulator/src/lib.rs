// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Execution Simulator - paper-trading venues and a multi-venue router
//!
//! # Architecture
//!
//! - `models`: orders, positions, trades, quotes, balances and venue events
//! - `market`: random-walk quote simulator with injectable randomness
//! - `execution`: `PaperVenue`, the simulated fill engine with latency,
//!   rejects, slippage and Indian-market style charges
//! - `venue`: the `VenueAdapter` capability every venue implements, plus the
//!   `LiveVenue` placeholder
//! - `router`: `BrokerManager`, which registers venues, routes orders with a
//!   single failover, aggregates read queries and tracks venue health
//! - `config`: serde configuration for venues, simulation and the manager
//! - `observability`: tracing subscriber and Prometheus metrics setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Venue, simulation and manager configuration.
pub mod config;

/// Error types.
pub mod error;

/// Simulated order execution.
pub mod execution;

/// Simulated market data.
pub mod market;

/// Trading domain types.
pub mod models;

/// Logging and metrics setup.
pub mod observability;

/// Multi-venue broker manager.
pub mod router;

/// Venue capability trait and implementations.
pub mod venue;

pub use config::{ManagerConfig, NamedVenueConfig, SimulationConfig, VenueConfig};
pub use error::{ConfigError, RouterError, RouterResult, VenueError, VenueResult};
pub use execution::PaperVenue;
pub use market::MarketDataSimulator;
pub use models::{
    AccountBalance, Holding, InstrumentId, Order, OrderId, OrderStatus, OrderType, Position,
    Quote, Trade, TransactionType, VenueEvent, VenueHealth, VenueOrderId,
};
pub use router::{BrokerManager, BrokerSlot, ManagerState, SelectionCriteria, VenueFactory};
pub use venue::{LiveVenue, VenueAdapter};
