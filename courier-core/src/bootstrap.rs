//! Populating a registry from client properties.

use crate::registry::{ClientRegistry, DEFAULT_FACTORY};
use courier_config::{ClientProperties, ConnectionProperties};
use courier_http::{ClientConfig, ClientFactory, ClientFactoryBuilder, ConfigurationError};
use tracing::{debug, info};

/// Translate a base URL and a connection block into a [`ClientConfig`].
pub fn client_config(base_url: &str, connection: &ConnectionProperties) -> ClientConfig {
    let mut builder = ClientConfig::builder(base_url)
        .connect_timeout_ms(connection.connect_timeout)
        .read_timeout_ms(connection.read_timeout)
        .write_timeout_ms(connection.write_timeout)
        .debug_request(connection.debug_request)
        .async_dispatch(connection.async_request);

    if connection.scheduler.override_default {
        builder = builder.scheduler(
            connection.scheduler.core_pool_size,
            connection.scheduler.thread_name_prefix.clone(),
        );
    }
    builder.build()
}

/// Builds a factory per configured entry and registers them.
///
/// Application factories added with [`with_factory`](Self::with_factory) are
/// registered last, so they win over a configured entry of the same name.
#[derive(Clone)]
pub struct RegistryBootstrapper {
    builder: ClientFactoryBuilder,
    application_factories: Vec<(String, ClientFactory)>,
}

impl RegistryBootstrapper {
    pub fn new(builder: ClientFactoryBuilder) -> Self {
        Self {
            builder,
            application_factories: Vec::new(),
        }
    }

    /// Register a factory built by the application under `name`.
    pub fn with_factory(mut self, name: impl Into<String>, factory: ClientFactory) -> Self {
        self.application_factories.push((name.into(), factory));
        self
    }

    /// Build every configured factory, then register all of them.
    ///
    /// Nothing is registered unless every entry builds. Errors name the
    /// offending property, e.g. `factories.custom.base-url`.
    pub fn bootstrap(
        &self,
        properties: &ClientProperties,
        registry: &ClientRegistry,
    ) -> Result<(), ConfigurationError> {
        let mut built = Vec::with_capacity(properties.factories.len() + 1);

        match properties.default_url() {
            Some(url) => {
                let config = client_config(url, &properties.connection);
                let factory = self.builder.build(&config).map_err(default_entry_field)?;
                built.push((DEFAULT_FACTORY.to_string(), factory));
            }
            None => debug!("No default URL configured, skipping default factory"),
        }

        for (name, entry) in &properties.factories {
            let config = client_config(&entry.base_url, &entry.connection);
            let factory = self
                .builder
                .build(&config)
                .map_err(|e| e.within(&format!("factories.{}", name)))?;
            built.push((name.clone(), factory));
        }

        let configured = built.len();
        for (name, factory) in built
            .into_iter()
            .chain(self.application_factories.iter().cloned())
        {
            registry.register(name, factory)?;
        }

        info!(
            configured,
            application = self.application_factories.len(),
            names = ?registry.names(),
            "Client registry bootstrapped"
        );
        Ok(())
    }
}

/// The default entry's URL lives at `default-url`, its block at `connection`.
fn default_entry_field(mut error: ConfigurationError) -> ConfigurationError {
    if error.field == "base-url" {
        error.field = "default-url".to_string();
    }
    error
}
