//! Registered brokers, in registration order.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::venue::VenueAdapter;

#[derive(Clone)]
pub(crate) struct BrokerEntry {
    pub name: String,
    pub kind: String,
    pub adapter: Arc<dyn VenueAdapter>,
}

/// Broker table plus the primary designation.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<BrokerEntry>,
    primary: Option<String>,
}

impl Registry {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn VenueAdapter>> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.adapter))
    }

    /// Register a broker. The first one becomes primary.
    pub fn insert(&mut self, entry: BrokerEntry) {
        if self.primary.is_none() {
            self.primary = Some(entry.name.clone());
        }
        self.entries.push(entry);
    }

    /// Remove a broker, reassigning primary to the first remaining one.
    pub fn remove(&mut self, name: &str) -> Option<BrokerEntry> {
        let index = self.entries.iter().position(|entry| entry.name == name)?;
        let entry = self.entries.remove(index);
        if self.primary.as_deref() == Some(name) {
            self.primary = self.entries.first().map(|first| first.name.clone());
        }
        Some(entry)
    }

    pub fn drain(&mut self) -> Vec<BrokerEntry> {
        self.primary = None;
        std::mem::take(&mut self.entries)
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `(name, adapter)` pairs, cloned so callers can await without the lock.
    pub fn snapshot(&self) -> Vec<(String, Arc<dyn VenueAdapter>)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.clone(), Arc::clone(&entry.adapter)))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn kinds(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.kind.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenueConfig;
    use crate::venue::LiveVenue;

    fn entry(name: &str) -> BrokerEntry {
        BrokerEntry {
            name: name.to_string(),
            kind: "live".to_string(),
            adapter: Arc::new(LiveVenue::new(name, VenueConfig::of_kind("live"))),
        }
    }

    #[test]
    fn first_insert_becomes_primary() {
        let mut registry = Registry::default();
        registry.insert(entry("a"));
        registry.insert(entry("b"));
        assert_eq!(registry.primary(), Some("a"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn removing_primary_promotes_first_remaining() {
        let mut registry = Registry::default();
        registry.insert(entry("a"));
        registry.insert(entry("b"));
        registry.insert(entry("c"));
        assert!(registry.remove("a").is_some());
        assert_eq!(registry.primary(), Some("b"));
        assert!(registry.remove("c").is_some());
        assert_eq!(registry.primary(), Some("b"));
        assert!(registry.remove("b").is_some());
        assert_eq!(registry.primary(), None);
        assert!(registry.remove("b").is_none());
    }
}
