//! Configuration for venues, their simulation and the broker manager.
//!
//! Plain serde structs with defaults, independent of file format. Hosts load
//! them however they like and call `validate()` before use.

mod manager;
mod simulation;
mod venue;

pub use manager::{ManagerConfig, NamedVenueConfig};
pub use simulation::SimulationConfig;
pub use venue::VenueConfig;
