//! Named registry of client factories.

use courier_http::{ClientFactory, ConfigurationError};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Reserved name of the default factory.
pub const DEFAULT_FACTORY: &str = "__defaultFactory";

/// Read-only view of registered factories.
pub trait ClientLookup: Send + Sync {
    /// Whether a factory is registered under `name`.
    fn contains(&self, name: &str) -> bool;

    /// Factory registered under `name`, if any.
    fn get(&self, name: &str) -> Option<ClientFactory>;
}

/// Concurrent mapping from logical name to [`ClientFactory`].
///
/// Cloning yields another handle to the same registry. Readers observe either
/// the previous or the new factory under a name, never anything in between.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    factories: Arc<DashMap<String, ClientFactory>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register(
        &self,
        name: impl Into<String>,
        factory: ClientFactory,
    ) -> Result<&Self, ConfigurationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigurationError::new("name", "must not be blank"));
        }

        let base_url = factory.base_url().to_string();
        let replaced = self.factories.insert(name.clone(), factory);
        debug!(
            name = %name,
            base_url = %base_url,
            replaced = replaced.is_some(),
            "Client factory registered"
        );
        Ok(self)
    }

    /// Remove the factory under `name`, if present.
    pub fn unregister(&self, name: &str) -> &Self {
        if self.factories.remove(name).is_some() {
            debug!(name, "Client factory unregistered");
        }
        self
    }

    /// Factory registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<ClientFactory> {
        let factory = self.factories.get(name).map(|entry| entry.value().clone());
        trace!(name, found = factory.is_some(), "Client factory lookup");
        factory
    }

    /// Whether a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ClientLookup for ClientRegistry {
    fn contains(&self, name: &str) -> bool {
        ClientRegistry::contains(self, name)
    }

    fn get(&self, name: &str) -> Option<ClientFactory> {
        ClientRegistry::get(self, name)
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_http::{ClientConfig, ClientFactoryBuilder};

    fn factory(url: &str) -> ClientFactory {
        let config = ClientConfig::builder(url).async_dispatch(false).build();
        ClientFactoryBuilder::new().build(&config).unwrap()
    }

    #[test]
    fn test_register_then_get() {
        let registry = ClientRegistry::new();
        let f = factory("http://localhost:8080");

        registry.register("calc", f.clone()).unwrap();
        assert!(registry.contains("calc"));
        assert_eq!(registry.get("calc"), Some(f));
    }

    #[test]
    fn test_register_is_idempotent_and_overwrites() {
        let registry = ClientRegistry::new();
        let first = factory("http://localhost:1");
        let second = factory("http://localhost:2");

        registry
            .register("calc", first.clone())
            .unwrap()
            .register("calc", first.clone())
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("calc"), Some(first));

        registry.register("calc", second.clone()).unwrap();
        assert_eq!(registry.get("calc"), Some(second));
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let registry = ClientRegistry::new();
        registry.unregister("missing");
        assert_eq!(registry.get("missing"), None);

        registry.register("calc", factory("http://localhost")).unwrap();
        registry.unregister("calc").unregister("calc");
        assert!(!registry.contains("calc"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_blank_name_rejected() {
        let registry = ClientRegistry::new();
        let err = registry.register("  ", factory("http://localhost")).unwrap_err();
        assert_eq!(err.field, "name");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_names_are_case_sensitive_and_sorted() {
        let registry = ClientRegistry::new();
        let f = factory("http://localhost");
        registry.register("b", f.clone()).unwrap();
        registry.register("B", f.clone()).unwrap();
        registry.register(DEFAULT_FACTORY, f).unwrap();

        assert_eq!(registry.names(), vec!["B", DEFAULT_FACTORY, "b"]);
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = ClientRegistry::new();
        let handle = registry.clone();
        registry.register("calc", factory("http://localhost")).unwrap();
        assert!(handle.contains("calc"));
    }
}
