//! # Courier Core
//!
//! Named registry of HTTP client factories and the machinery that turns
//! `#[http_service]` traits into ready-to-use proxies.
//!
//! - [`ClientRegistry`]: concurrent name → [`ClientFactory`] mapping
//! - [`RegistryBootstrapper`]: builds and registers factories from [`ClientProperties`]
//! - [`ServiceProxyFactory`]: creates a proxy for a service trait from a registry name
//! - [`ServiceScanner`]: binds every declared service into a [`Container`]
//! - [`ClientContext`]: all of the above in one call
//!
//! [`ClientProperties`]: courier_config::ClientProperties

pub mod bootstrap;
pub mod container;
pub mod context;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod registry;

pub use bootstrap::{RegistryBootstrapper, client_config};
pub use container::Container;
pub use context::{ClientContext, ClientContextBuilder};
pub use discovery::{RegisterFn, ScanOptions, ServiceRegistration, ServiceScanner, register_service};
pub use error::{Error, Result, UnknownRegistryNameError};
pub use proxy::{ServiceProxyFactory, resolve_registry_name};
pub use registry::{ClientLookup, ClientRegistry, DEFAULT_FACTORY};

pub use courier_http::{
    CallDescriptor, CallError, CallResult, ClientConfig, ClientFactory, ClientFactoryBuilder,
    ConfigurationError, HttpService, MethodDescriptor, Scheduler, ServiceDescriptor,
};

/// Items referenced by code generated by `#[http_service]`. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use courier_http::{
        CallDescriptor, CallResult, ClientFactory, HttpService, Method, MethodDescriptor,
        ServiceDescriptor,
    };
    pub use inventory;
    pub use std::sync::Arc;

    pub use crate::discovery::{ServiceRegistration, register_service};
}
