//! Broker manager: venue registry, order routing with failover, aggregated
//! queries and periodic health checks.

mod aggregate;
mod factory;
mod health;
mod manager;
mod registry;
mod state;

pub use aggregate::BrokerSlot;
pub use factory::{VenueBuild, VenueConstructor, VenueFactory};
pub use manager::BrokerManager;
pub use state::{ManagerState, ManagerStatistics, SelectionCriteria};
