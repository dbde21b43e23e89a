//! One-call wiring of registry, proxies and container.

use crate::bootstrap::RegistryBootstrapper;
use crate::discovery::{ScanOptions, ServiceScanner};
use crate::proxy::ServiceProxyFactory;
use crate::registry::ClientRegistry;
use crate::{Container, Result};
use courier_config::{ClientProperties, ConfigManager, Validate};
use courier_http::{ClientFactory, ClientFactoryBuilder, HttpService, Scheduler};
use std::sync::Arc;
use tracing::info;

/// A bootstrapped client setup: the populated registry, a proxy factory over
/// it and a container holding every discovered service.
///
/// ```rust,no_run
/// use courier_core::{ClientContext, ScanOptions};
/// use courier_config::ConfigService;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConfigService::builder()
///     .add_file("config/courier.toml", courier_config::FileFormat::Toml)
///     .load_env()
///     .build()?;
///
/// let context = ClientContext::builder()
///     .properties(config.client_properties()?)
///     .scan(ScanOptions::new().base_module("my_app::clients"))
///     .build()?;
/// println!("registered: {:?}", context.registry().names());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientContext {
    registry: ClientRegistry,
    proxies: ServiceProxyFactory,
    container: Container,
}

impl ClientContext {
    pub fn builder() -> ClientContextBuilder {
        ClientContextBuilder::default()
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn proxies(&self) -> &ServiceProxyFactory {
        &self.proxies
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Resolve a discovered service.
    pub fn service<S: HttpService + ?Sized>(&self) -> Result<Arc<S>> {
        self.container.resolve::<S>()
    }
}

/// Builder for [`ClientContext`].
#[derive(Default)]
pub struct ClientContextBuilder {
    properties: ClientProperties,
    factory_builder: ClientFactoryBuilder,
    application_factories: Vec<(String, ClientFactory)>,
    scan: ScanOptions,
}

impl ClientContextBuilder {
    pub fn properties(mut self, properties: ClientProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Read the `courier.client` section of `manager`.
    pub fn config(self, manager: &ConfigManager) -> Result<Self> {
        Ok(self.properties(ClientProperties::load(manager)?))
    }

    /// Interceptors, call adapters, converters and the shared scheduler used
    /// for every configured factory.
    pub fn factory_builder(mut self, builder: ClientFactoryBuilder) -> Self {
        self.factory_builder = builder;
        self
    }

    /// Register a factory built by the application.
    pub fn factory(mut self, name: impl Into<String>, factory: ClientFactory) -> Self {
        self.application_factories.push((name.into(), factory));
        self
    }

    pub fn scan(mut self, options: ScanOptions) -> Self {
        self.scan = options;
        self
    }

    /// Validate properties, populate the registry and bind discovered services.
    pub fn build(self) -> Result<ClientContext> {
        self.properties.validate()?;

        let mut builder = self.factory_builder;
        if builder.shared_scheduler().is_none() {
            builder = builder.with_shared_scheduler(Scheduler::shared()?);
        }

        let registry = ClientRegistry::new();
        let bootstrapper = self
            .application_factories
            .into_iter()
            .fold(RegistryBootstrapper::new(builder), |b, (name, factory)| {
                b.with_factory(name, factory)
            });
        bootstrapper.bootstrap(&self.properties, &registry)?;

        let proxies = ServiceProxyFactory::new(registry.clone());
        let container = Container::new();
        let services = ServiceScanner::new(self.scan).register_all(&proxies, &container)?;

        info!(
            factories = registry.len(),
            services,
            "Client context ready"
        );
        Ok(ClientContext {
            registry,
            proxies,
            container,
        })
    }
}
