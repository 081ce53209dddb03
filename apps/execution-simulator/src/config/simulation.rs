//! Knobs for the simulated market and fill model.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Simulation parameters for a paper venue.
///
/// Setting `reject_probability`, `max_slippage_pct` and `default_volatility`
/// to zero makes fills fully deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Lower bound of simulated execution latency (ms).
    #[serde(default = "default_latency_min_ms")]
    pub latency_min_ms: u64,
    /// Upper bound of simulated execution latency (ms).
    #[serde(default = "default_latency_max_ms")]
    pub latency_max_ms: u64,
    /// Probability in `[0, 1]` that a pending order is rejected.
    #[serde(default = "default_reject_probability")]
    pub reject_probability: f64,
    /// Maximum adverse slippage for market orders, in percent.
    #[serde(default = "default_max_slippage_pct")]
    pub max_slippage_pct: f64,
    /// Per-tick volatility in percent (0.02 means sigma = 0.02%).
    #[serde(default = "default_volatility")]
    pub default_volatility: f64,
    /// Pause between order-processing passes (ms).
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Pause between market ticks (ms).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// RNG seed; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: default_latency_min_ms(),
            latency_max_ms: default_latency_max_ms(),
            reject_probability: default_reject_probability(),
            max_slippage_pct: default_max_slippage_pct(),
            default_volatility: default_volatility(),
            scan_interval_ms: default_scan_interval_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Fast, noise-free settings: no latency, rejects, slippage or drift.
    #[must_use]
    pub fn deterministic() -> Self {
        Self {
            latency_min_ms: 0,
            latency_max_ms: 0,
            reject_probability: 0.0,
            max_slippage_pct: 0.0,
            default_volatility: 0.0,
            scan_interval_ms: 5,
            tick_interval_ms: 10,
            seed: Some(7),
        }
    }

    /// Interval between processing passes.
    #[must_use]
    pub const fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    /// Interval between market ticks.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.latency_min_ms > self.latency_max_ms {
            return Err(ConfigError::InvertedLatency {
                min: self.latency_min_ms,
                max: self.latency_max_ms,
            });
        }
        if !(0.0..=1.0).contains(&self.reject_probability) {
            return Err(ConfigError::OutOfRange {
                field: "reject_probability",
                reason: "must be within [0, 1]".to_string(),
            });
        }
        if !(0.0..100.0).contains(&self.max_slippage_pct) {
            return Err(ConfigError::OutOfRange {
                field: "max_slippage_pct",
                reason: "must be within [0, 100)".to_string(),
            });
        }
        if !self.default_volatility.is_finite() || self.default_volatility < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "default_volatility",
                reason: "must be a non-negative number".to_string(),
            });
        }
        if self.scan_interval_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "scan_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "tick_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

const fn default_latency_min_ms() -> u64 {
    100
}

const fn default_latency_max_ms() -> u64 {
    500
}

const fn default_reject_probability() -> f64 {
    0.02
}

const fn default_max_slippage_pct() -> f64 {
    2.0
}

const fn default_volatility() -> f64 {
    0.02
}

const fn default_scan_interval_ms() -> u64 {
    100
}

const fn default_tick_interval_ms() -> u64 {
    1000
}
