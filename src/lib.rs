// Courier - named HTTP client factories with declarative service interfaces
//
// Factories are built from `courier.client` configuration, registered by name,
// and bound to `#[http_service]` traits through their declared registry name.

// Re-export core functionality
pub use courier_core::*;

// Re-export procedural macros
pub use courier_macro::http_service;

// Re-export sibling crates
pub use courier_config;
pub use courier_http;

pub use courier_config::{
    ClientProperties, ConfigError, ConfigManager, ConfigService, ConfigServiceBuilder,
    ConnectionProperties, FactoryProperties, FileFormat, SchedulerProperties,
};
pub use courier_http::{
    AuthInterceptor, BodyLoggingInterceptor, CallAdapter, Interceptor, JsonConverter, Method,
    Next, RequestIdInterceptor, Response, TimeoutAdapter,
};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        CallError, CallResult, ClientContext, ClientFactory, ClientFactoryBuilder,
        ClientProperties, ClientRegistry, ConfigService, Container, DEFAULT_FACTORY, ScanOptions,
        ServiceProxyFactory, http_service,
    };
}
