//! Venue construction by kind.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::VenueConfig;
use crate::error::ConfigError;
use crate::execution::PaperVenue;
use crate::venue::{LiveVenue, VenueAdapter};

/// Result of building a venue.
pub type VenueBuild = Result<Arc<dyn VenueAdapter>, ConfigError>;

/// Builds a venue from its broker name and config.
pub type VenueConstructor = Arc<dyn Fn(&str, &VenueConfig) -> VenueBuild + Send + Sync>;

/// Maps venue kinds (`VenueConfig::name`) to constructors.
///
/// Passed to the [`BrokerManager`](super::BrokerManager) explicitly, so tests
/// and hosts can register their own venue kinds.
#[derive(Clone)]
pub struct VenueFactory {
    constructors: HashMap<String, VenueConstructor>,
}

impl std::fmt::Debug for VenueFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueFactory")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl Default for VenueFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VenueFactory {
    /// A factory with no registered kinds. Every kind falls back to paper.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// `paper` and `live` registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::empty()
            .register("paper", |name, config| {
                Ok(Arc::new(PaperVenue::new(name, config.clone())?))
            })
            .register("live", |name, config| {
                Ok(Arc::new(LiveVenue::new(name, config.clone())))
            })
    }

    /// Register (or replace) the constructor for `kind`.
    #[must_use]
    pub fn register<F>(mut self, kind: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&str, &VenueConfig) -> VenueBuild + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Arc::new(constructor));
        self
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<_> = self.constructors.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Build a venue of kind `config.name`. Unknown kinds become paper venues.
    ///
    /// # Errors
    ///
    /// Whatever `ConfigError` the constructor reports for `config`.
    pub fn create(&self, name: &str, config: &VenueConfig) -> VenueBuild {
        if let Some(constructor) = self.constructors.get(&config.name) {
            return constructor(name, config);
        }
        tracing::warn!(
            broker = name,
            kind = %config.name,
            "Unknown venue kind, falling back to paper venue"
        );
        Ok(Arc::new(PaperVenue::new(name, config.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_paper_and_live() {
        assert_eq!(VenueFactory::with_defaults().kinds(), vec!["live", "paper"]);
    }

    #[tokio::test]
    async fn unknown_kind_falls_back_to_paper() {
        let factory = VenueFactory::with_defaults();
        let venue = factory.create("mystery", &VenueConfig::of_kind("ibkr")).unwrap();
        assert_eq!(venue.name(), "mystery");
        // Paper venues answer balance reads; live venues do not.
        assert!(venue.get_account_balance().await.is_ok());
    }

    #[tokio::test]
    async fn live_kind_builds_live_venue() {
        let factory = VenueFactory::with_defaults();
        let venue = factory.create("zerodha", &VenueConfig::of_kind("live")).unwrap();
        assert!(venue.get_account_balance().await.is_err());
    }

    #[test]
    fn custom_kinds_can_be_registered() {
        let factory = VenueFactory::empty().register("sim", |name, config| {
            Ok(Arc::new(PaperVenue::new(name, config.clone())?))
        });
        assert_eq!(factory.kinds(), vec!["sim"]);
    }

    #[test]
    fn invalid_paper_config_is_reported() {
        let config = VenueConfig {
            brokerage_per_order: rust_decimal_macros::dec!(-1),
            ..VenueConfig::default()
        };
        assert!(matches!(
            VenueFactory::with_defaults().create("paper", &config),
            Err(ConfigError::OutOfRange { field: "brokerage_per_order", .. })
        ));
    }
}
