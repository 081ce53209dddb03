//! Broker manager configuration.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::VenueConfig;
use crate::error::ConfigError;

/// A venue config registered under a broker name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedVenueConfig {
    /// Broker name used for routing.
    pub name: String,
    /// Venue configuration.
    #[serde(default)]
    pub config: VenueConfig,
}

impl NamedVenueConfig {
    /// Pair a broker name with its config.
    pub fn new(name: impl Into<String>, config: VenueConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

/// Configuration for [`BrokerManager::initialize`](crate::router::BrokerManager::initialize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Venues in registration order. The first becomes primary.
    #[serde(default)]
    pub venues: Vec<NamedVenueConfig>,
    /// Seconds between health-check passes.
    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            venues: Vec::new(),
            health_check_interval_secs: default_health_check_interval_secs(),
        }
    }
}

impl ManagerConfig {
    /// Interval between health-check passes.
    #[must_use]
    pub const fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// Log level of the primary venue, or `info` with no venues.
    #[must_use]
    pub fn log_level(&self) -> &str {
        self.venues
            .first()
            .map_or("info", |venue| venue.config.log_level.as_str())
    }

    /// Validate names and every venue config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.health_check_interval_secs == 0 {
            return Err(ConfigError::OutOfRange {
                field: "health_check_interval_secs",
                reason: "must be positive".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for venue in &self.venues {
            if venue.name.trim().is_empty() {
                return Err(ConfigError::EmptyVenueName);
            }
            if !seen.insert(venue.name.as_str()) {
                return Err(ConfigError::DuplicateVenue(venue.name.clone()));
            }
            venue.config.validate()?;
        }
        Ok(())
    }
}

const fn default_health_check_interval_secs() -> u64 {
    30
}
