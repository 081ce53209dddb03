//! Manager lifecycle state, broker selection criteria and statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a [`BrokerManager`](super::BrokerManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagerState {
    /// Created, not yet initialized.
    Uninitialized,
    /// Registering configured venues.
    Initializing,
    /// Routing orders, health loop active.
    Running,
    /// Disconnecting venues.
    ShuttingDown,
    /// Shut down, or initialization failed.
    Stopped,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Initializing => "INITIALIZING",
            Self::Running => "RUNNING",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Stopped => "STOPPED",
        };
        f.write_str(label)
    }
}

/// How [`BrokerManager::select_best_broker`](super::BrokerManager::select_best_broker)
/// picks a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionCriteria {
    /// First registered broker whose cached health is healthy.
    #[default]
    Health,
    /// The primary broker.
    Primary,
    /// First connected broker.
    Available,
}

impl SelectionCriteria {
    /// Lenient parse: anything other than `health` or `primary` means `Available`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "health" => Self::Health,
            "primary" => Self::Primary,
            _ => Self::Available,
        }
    }
}

impl FromStr for SelectionCriteria {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Point-in-time summary of the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerStatistics {
    /// Registered brokers.
    pub total_brokers: usize,
    /// Brokers reporting a connection.
    pub connected_brokers: usize,
    /// Brokers whose last health check passed.
    pub healthy_brokers: usize,
    /// Current primary.
    pub primary_broker: Option<String>,
    /// Broker name to venue kind.
    pub broker_types: BTreeMap<String, String>,
    /// Manager lifecycle state.
    pub state: ManagerState,
}
