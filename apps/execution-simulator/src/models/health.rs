//! Venue health snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Venue answered its liveness probe.
    Healthy,
    /// Venue failed its liveness probe.
    Unhealthy,
}

/// Result of a venue health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueHealth {
    /// Verdict.
    pub status: HealthStatus,
    /// Whether the venue reported itself connected.
    pub connected: bool,
    /// Failure description for unhealthy venues.
    pub error: Option<String>,
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
}

impl VenueHealth {
    /// A healthy snapshot.
    #[must_use]
    pub fn healthy(connected: bool) -> Self {
        Self {
            status: HealthStatus::Healthy,
            connected,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// An unhealthy snapshot carrying `error`.
    #[must_use]
    pub fn unhealthy(connected: bool, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            connected,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Returns true if the verdict is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
