//! # Courier HTTP
//!
//! Configurable HTTP client factories: one factory per remote endpoint, with a
//! shared interceptor chain, call adapters, body converters and an optional
//! scheduler for async dispatch.
//!
//! ## Features
//!
//! - **Factories from configuration**: base URL normalization, transport timeouts
//!   and eager validation of everything a factory needs
//! - **Interceptors**: ordered request/response interception, with full-body
//!   traffic logging on demand
//! - **Call adapters**: wrap every call, e.g. with [`TimeoutAdapter`]
//! - **Body converters**: JSON, text and form bodies
//! - **Dispatch**: direct, on the shared scheduler, or on a dedicated pool
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_http::{CallDescriptor, ClientConfig, ClientFactoryBuilder, Scheduler};
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let builder = ClientFactoryBuilder::new().with_shared_scheduler(Scheduler::shared()?);
//!     let factory = builder.build(&ClientConfig::builder("http://localhost:8080/api").build())?;
//!
//!     let sum: i64 = factory
//!         .call(
//!             CallDescriptor::new(Method::GET, "calculate/add")
//!                 .query("first", &5)?
//!                 .query("second", &12)?,
//!         )
//!         .await?;
//!
//!     println!("5 + 12 = {}", sum);
//!     Ok(())
//! }
//! ```

mod adapter;
mod builder;
mod call;
mod config;
mod converter;
mod error;
mod factory;
mod interceptor;
mod order;
mod response;
mod scheduler;
mod service;

pub use adapter::{CallAdapter, Dispatch, PendingCall, TimeoutAdapter};
pub use builder::{ClientFactoryBuilder, normalize_base_url};
pub use call::{CallDescriptor, CallInfo};
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_TIMEOUT_MS, SchedulerOverride, TIMEOUT_THRESHOLD_MS,
};
pub use converter::{
    APPLICATION_FORM, APPLICATION_JSON, BodyConverter, FormConverter, JsonConverter, TEXT_PLAIN,
    TextConverter,
};
pub use error::{CallError, CallResult, ConfigurationError};
pub use factory::{ClientFactory, TransportTimeouts};
pub use interceptor::{
    AuthInterceptor, BodyLoggingInterceptor, HTTP_LOG_TARGET, Interceptor, Next,
    RequestIdInterceptor,
};
pub use order::{HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE};
pub use response::Response;
pub use scheduler::{SHARED_SCHEDULER_NAME, Scheduler};
pub use service::{HttpService, MethodDescriptor, ServiceDescriptor};

pub use http::Method;
pub use reqwest::Request;

/// Re-exports of the types most service code needs.
pub mod prelude {
    pub use crate::{
        CallDescriptor, CallError, CallResult, ClientConfig, ClientFactory, ClientFactoryBuilder,
        HttpService, Interceptor, Response, Scheduler,
    };
}
