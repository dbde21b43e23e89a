//! Proxy instantiation for service interfaces.

use crate::UnknownRegistryNameError;
use crate::registry::{ClientLookup, DEFAULT_FACTORY};
use courier_http::{HttpService, ServiceDescriptor};
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry name a service binds to: the declared registry, else the declared
/// name, else the default factory.
pub fn resolve_registry_name(descriptor: &ServiceDescriptor) -> &'static str {
    [descriptor.registry, descriptor.name]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_FACTORY)
}

/// Creates proxies for service interfaces from registered factories.
#[derive(Clone)]
pub struct ServiceProxyFactory {
    lookup: Arc<dyn ClientLookup>,
}

impl ServiceProxyFactory {
    pub fn new<L: ClientLookup + 'static>(lookup: L) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Create a proxy of `S` bound to the factory registered under `registry_name`.
    pub fn create_instance<S: HttpService + ?Sized>(
        &self,
        registry_name: &str,
    ) -> Result<Arc<S>, UnknownRegistryNameError> {
        let service = S::DESCRIPTOR.type_name;
        debug!(service, registry = registry_name, "Resolving client factory");

        let Some(factory) = self.lookup.get(registry_name) else {
            warn!(
                service,
                registry = registry_name,
                "No client factory registered"
            );
            return Err(UnknownRegistryNameError::new(registry_name));
        };

        let instance = factory.create::<S>();
        debug!(
            service,
            registry = registry_name,
            base_url = %factory.base_url(),
            "Service proxy created"
        );
        Ok(instance)
    }

    /// Create a proxy of `S` bound to the registry name its declaration resolves to.
    pub fn create<S: HttpService + ?Sized>(&self) -> Result<Arc<S>, UnknownRegistryNameError> {
        self.create_instance::<S>(resolve_registry_name(&S::DESCRIPTOR))
    }

    /// Whether a factory is registered under `registry_name`.
    pub fn can_create(&self, registry_name: &str) -> bool {
        self.lookup.contains(registry_name)
    }
}

impl std::fmt::Debug for ServiceProxyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProxyFactory").finish_non_exhaustive()
    }
}
