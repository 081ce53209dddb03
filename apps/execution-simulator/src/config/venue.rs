//! Per-venue configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::SimulationConfig;
use crate::error::ConfigError;

/// Configuration consumed once when a venue is added.
///
/// `name` selects the venue kind in the [`VenueFactory`](crate::router::VenueFactory).
/// Rates are percentages of notional: `stt_rate = 0.025` charges 0.025%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Venue kind (`paper`, `live`).
    #[serde(default = "default_name")]
    pub name: String,
    /// Whether the venue trades on paper.
    #[serde(default = "default_paper_trading")]
    pub paper_trading: bool,
    /// Starting cash.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    /// Flat brokerage charged on every fill.
    #[serde(default = "default_brokerage_per_order")]
    pub brokerage_per_order: Decimal,
    /// Securities transaction tax, percent of notional.
    #[serde(default = "default_stt_rate")]
    pub stt_rate: Decimal,
    /// Exchange transaction charge, percent of notional.
    #[serde(default = "default_transaction_charge_rate")]
    pub transaction_charge_rate: Decimal,
    /// Largest position quantity allowed.
    #[serde(default = "default_max_position_size")]
    pub max_position_size: Decimal,
    /// Largest tolerated loss per day.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    /// Largest number of simultaneously open positions.
    #[serde(default = "default_max_open_positions")]
    pub max_open_positions: u32,
    /// Log filter directive for this venue.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Fill and market simulation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            paper_trading: default_paper_trading(),
            initial_balance: default_initial_balance(),
            brokerage_per_order: default_brokerage_per_order(),
            stt_rate: default_stt_rate(),
            transaction_charge_rate: default_transaction_charge_rate(),
            max_position_size: default_max_position_size(),
            max_daily_loss: default_max_daily_loss(),
            max_open_positions: default_max_open_positions(),
            log_level: default_log_level(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl VenueConfig {
    /// A default config for the given venue kind.
    #[must_use]
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            name: kind.into(),
            ..Self::default()
        }
    }

    /// Replace the simulation parameters.
    #[must_use]
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    /// Validate ranges, including the nested simulation config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_balance < Decimal::ZERO {
            return Err(ConfigError::OutOfRange {
                field: "initial_balance",
                reason: "must not be negative".to_string(),
            });
        }
        let non_negative = [
            ("brokerage_per_order", self.brokerage_per_order),
            ("stt_rate", self.stt_rate),
            ("transaction_charge_rate", self.transaction_charge_rate),
        ];
        for (field, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: "must not be negative".to_string(),
                });
            }
        }
        if self.max_position_size <= Decimal::ZERO {
            return Err(ConfigError::OutOfRange {
                field: "max_position_size",
                reason: "must be positive".to_string(),
            });
        }
        self.simulation.validate()
    }
}

fn default_name() -> String {
    "paper".to_string()
}

const fn default_paper_trading() -> bool {
    true
}

fn default_initial_balance() -> Decimal {
    dec!(1000000)
}

fn default_brokerage_per_order() -> Decimal {
    dec!(20)
}

fn default_stt_rate() -> Decimal {
    dec!(0.025)
}

fn default_transaction_charge_rate() -> Decimal {
    dec!(0.00325)
}

fn default_max_position_size() -> Decimal {
    dec!(100)
}

fn default_max_daily_loss() -> Decimal {
    dec!(50000)
}

const fn default_max_open_positions() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
