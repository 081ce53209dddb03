//! Execution Simulator Binary
//!
//! Starts a broker manager over paper venues and runs until interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin execution-simulator
//! ```
//!
//! # Environment Variables
//!
//! - `VENUES`: comma-separated `name:kind` pairs (default: `paper:paper`)
//! - `INITIAL_BALANCE`: starting cash per venue (default: 1000000)
//! - `SIMULATION_SEED`: seed for reproducible fills and prices
//! - `HEALTH_CHECK_INTERVAL_SECS`: seconds between health checks (default: 30)
//! - `METRICS_ADDR`: Prometheus listener address, e.g. `0.0.0.0:9090`
//! - `LOG_LEVEL`: log level for every venue; the primary venue's level sets
//!   the crate filter (default: info)
//! - `RUST_LOG`: full filter override

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context;
use execution_simulator::observability::{self, LoggingConfig, MetricsConfig};
use execution_simulator::{
    BrokerManager, ManagerConfig, NamedVenueConfig, VenueConfig, VenueFactory,
};
use rust_decimal::Decimal;
use tokio::signal;

const DEFAULT_VENUES: &str = "paper:paper";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = parse_config()?;
    observability::init_tracing(&LoggingConfig::for_level(config.log_level()))?;

    if let Some(addr) = env_opt("METRICS_ADDR") {
        let addr = SocketAddr::from_str(&addr)
            .with_context(|| format!("METRICS_ADDR is not a socket address: {addr}"))?;
        observability::init_metrics(&MetricsConfig::with_addr(addr))?;
    }

    tracing::info!(
        venues = config.venues.len(),
        health_check_interval_secs = config.health_check_interval_secs,
        "Starting execution simulator"
    );

    let manager = BrokerManager::new(VenueFactory::with_defaults());
    manager
        .initialize(config)
        .await
        .context("broker manager failed to initialize")?;

    shutdown_signal().await?;

    let statistics = serde_json::to_string(&manager.get_statistics())?;
    tracing::info!(%statistics, "Final manager statistics");
    manager.shutdown().await;

    tracing::info!("Execution simulator stopped");
    Ok(())
}

/// Load `.env` from the working directory or the nearest ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_opt(key)
        .map(|value| value.parse::<T>().with_context(|| format!("invalid {key}: {value}")))
        .transpose()
}

/// Build the manager config from environment variables.
fn parse_config() -> anyhow::Result<ManagerConfig> {
    let mut config = ManagerConfig::default();
    if let Some(secs) = env_parse::<u64>("HEALTH_CHECK_INTERVAL_SECS")? {
        config.health_check_interval_secs = secs;
    }

    let initial_balance = env_parse::<Decimal>("INITIAL_BALANCE")?;
    let seed = env_parse::<u64>("SIMULATION_SEED")?;
    let log_level = env_opt("LOG_LEVEL");

    for (index, entry) in env_or("VENUES", DEFAULT_VENUES).split(',').enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (name, kind) = entry.split_once(':').unwrap_or((entry, "paper"));

        let mut venue = VenueConfig::of_kind(kind.trim());
        if let Some(balance) = initial_balance {
            venue.initial_balance = balance;
        }
        if let Some(level) = &log_level {
            venue.log_level.clone_from(level);
        }
        // Offset per venue so two venues never share a random stream.
        venue.simulation.seed = seed.map(|seed| seed.wrapping_add(index as u64 * 100));
        config.venues.push(NamedVenueConfig::new(name.trim(), venue));
    }

    config.validate()?;
    Ok(config)
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = ctrl_c => {
                result.context("failed to listen for Ctrl+C")?;
                tracing::info!("Received Ctrl+C, initiating shutdown");
            }
            _ = terminate.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.context("failed to listen for Ctrl+C")?;
        tracing::info!("Received Ctrl+C, initiating shutdown");
    }

    Ok(())
}
