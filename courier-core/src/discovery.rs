//! Service discovery through link-time registration.
//!
//! `#[http_service]` submits one [`ServiceRegistration`] per annotated trait;
//! a [`ServiceScanner`] collects them and binds a proxy for each into a
//! [`Container`].

use crate::proxy::{ServiceProxyFactory, resolve_registry_name};
use crate::{Container, Result};
use courier_http::{HttpService, ServiceDescriptor};
use tracing::{debug, info};

/// Registers one service interface into a container.
pub type RegisterFn = fn(&ServiceProxyFactory, &Container) -> Result<()>;

/// A service interface collected via inventory.
pub struct ServiceRegistration {
    descriptor: &'static ServiceDescriptor,
    register: RegisterFn,
}

inventory::collect!(ServiceRegistration);

impl ServiceRegistration {
    pub const fn new(descriptor: &'static ServiceDescriptor, register: RegisterFn) -> Self {
        Self {
            descriptor,
            register,
        }
    }

    pub fn descriptor(&self) -> &'static ServiceDescriptor {
        self.descriptor
    }

    /// Bind the service into `container`.
    pub fn register(&self, proxies: &ServiceProxyFactory, container: &Container) -> Result<()> {
        (self.register)(proxies, container)
    }
}

impl std::fmt::Debug for ServiceRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistration")
            .field("service", &self.descriptor.qualified_name())
            .finish()
    }
}

/// Bind a proxy for `S` into `container`.
///
/// Singletons are created immediately, so an unknown registry name fails
/// here; per-request services fail on first resolve instead.
pub fn register_service<S: HttpService + ?Sized>(
    proxies: &ServiceProxyFactory,
    container: &Container,
) -> Result<()> {
    let descriptor = &S::DESCRIPTOR;
    let name = descriptor.service_name();
    let registry = resolve_registry_name(descriptor);

    if descriptor.singleton {
        let instance = proxies.create_instance::<S>(registry)?;
        container.register_singleton::<S>(&name, instance)?;
    } else {
        let proxies = proxies.clone();
        container.register_factory::<S, _>(&name, move || {
            Ok(proxies.create_instance::<S>(registry)?)
        })?;
    }

    debug!(
        service = %name,
        registry,
        singleton = descriptor.singleton,
        "Service interface bound"
    );
    Ok(())
}

/// Which declared services a scan picks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Scanning switched on at all.
    pub enabled: bool,
    /// Module path prefixes to include; empty means every module.
    pub base_modules: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            base_modules: Vec::new(),
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            base_modules: Vec::new(),
        }
    }

    /// Restrict the scan to a module and its submodules, e.g. `my_app::clients`.
    pub fn base_module(mut self, module: impl Into<String>) -> Self {
        self.base_modules.push(module.into());
        self
    }

    /// Whether a declared service is in scope.
    pub fn matches(&self, descriptor: &ServiceDescriptor) -> bool {
        if !self.enabled {
            return false;
        }
        if self.base_modules.is_empty() {
            return true;
        }
        let module = descriptor.module_path;
        self.base_modules.iter().any(|base| {
            module == base
                || module
                    .strip_prefix(base.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

/// Finds declared service interfaces and binds them into a container.
#[derive(Debug, Clone, Default)]
pub struct ServiceScanner {
    options: ScanOptions,
}

impl ServiceScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Declared services in scope, ordered by qualified name.
    pub fn discovered(&self) -> Vec<&'static ServiceRegistration> {
        let mut found: Vec<_> = inventory::iter::<ServiceRegistration>
            .into_iter()
            .filter(|registration| self.options.matches(registration.descriptor))
            .collect();
        found.sort_by_key(|registration| registration.descriptor.qualified_name());
        found
    }

    /// Bind every service in scope; returns how many were bound.
    pub fn register_all(&self, proxies: &ServiceProxyFactory, container: &Container) -> Result<usize> {
        if !self.options.enabled {
            info!("Service scanning disabled");
            return Ok(0);
        }

        let found = self.discovered();
        for registration in &found {
            registration.register(proxies, container)?;
        }

        info!(count = found.len(), "Service interfaces registered");
        Ok(found.len())
    }
}
