//! Assembly of client factories from configuration.

use crate::adapter::{CallAdapter, Dispatch};
use crate::converter::{BodyConverter, JsonConverter};
use crate::factory::{Pipeline, TransportTimeouts};
use crate::interceptor::{BodyLoggingInterceptor, Interceptor};
use crate::order::sort_by_order;
use crate::{ClientConfig, ClientFactory, ConfigurationError, Scheduler};
use std::sync::Arc;
use tracing::{debug, info};

/// Builds [`ClientFactory`] instances that share interceptors, call adapters,
/// body converters and the shared scheduler.
///
/// # Examples
///
/// ```rust,no_run
/// use courier_http::{ClientConfig, ClientFactoryBuilder, RequestIdInterceptor, Scheduler};
///
/// # fn main() -> Result<(), courier_http::ConfigurationError> {
/// let builder = ClientFactoryBuilder::new()
///     .with_shared_scheduler(Scheduler::shared()?)
///     .interceptor(RequestIdInterceptor::new());
///
/// let factory = builder.build(&ClientConfig::builder("http://localhost:8080/api").build())?;
/// assert_eq!(factory.base_url().as_str(), "http://localhost:8080/api/");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ClientFactoryBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
    call_adapters: Vec<Arc<dyn CallAdapter>>,
    converters: Vec<Arc<dyn BodyConverter>>,
    shared_scheduler: Option<Scheduler>,
}

impl ClientFactoryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler used by factories with async dispatch and no override.
    pub fn with_shared_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.shared_scheduler = Some(scheduler);
        self
    }

    /// Add an interceptor shared by every built factory.
    pub fn interceptor<I: Interceptor + 'static>(self, interceptor: I) -> Self {
        self.interceptor_arc(Arc::new(interceptor))
    }

    /// Add an already shared interceptor.
    pub fn interceptor_arc(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Add a call adapter shared by every built factory.
    pub fn call_adapter<A: CallAdapter + 'static>(mut self, adapter: A) -> Self {
        self.call_adapters.push(Arc::new(adapter));
        self
    }

    /// Add a body converter shared by every built factory.
    pub fn converter<C: BodyConverter + 'static>(mut self, converter: C) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Shared scheduler, if one was set.
    pub fn shared_scheduler(&self) -> Option<&Scheduler> {
        self.shared_scheduler.as_ref()
    }

    /// Build a factory for one endpoint.
    ///
    /// Everything is validated before anything is started: on error no
    /// transport or scheduler pool is left behind.
    pub fn build(&self, config: &ClientConfig) -> Result<ClientFactory, ConfigurationError> {
        let base_url = normalize_base_url(&config.base_url)?;

        if let Some(adapter) = self.call_adapters.iter().find(|a| !a.supports(&base_url)) {
            return Err(ConfigurationError::new(
                "base-url",
                format!("call adapter `{}` does not support `{}`", adapter.name(), base_url),
            ));
        }

        let mut interceptors = self.interceptors.clone();
        sort_by_order(&mut interceptors, |i| i.order());
        if config.debug_request {
            interceptors.push(Arc::new(BodyLoggingInterceptor));
        }

        let timeouts = TransportTimeouts {
            connect: config.connect_timeout(),
            read: config.read_timeout(),
            write: config.write_timeout(),
        };
        let transport = build_transport(&timeouts)?;

        let mut call_adapters = self.call_adapters.clone();
        sort_by_order(&mut call_adapters, |a| a.order());

        let mut converters = self.converters.clone();
        if converters.is_empty() {
            converters.push(Arc::new(JsonConverter::new()));
        }
        sort_by_order(&mut converters, |c| c.order());

        // Last, so a failure above never leaves a started pool behind.
        let dispatch = self.dispatch_for(config)?;

        info!(
            base_url = %base_url,
            interceptors = interceptors.len(),
            call_adapters = call_adapters.len(),
            async_dispatch = dispatch.is_async(),
            scheduler = dispatch.scheduler().map(Scheduler::name),
            "Built client factory"
        );

        Ok(ClientFactory::new(
            Pipeline {
                base_url,
                transport,
                interceptors,
                converters,
            },
            dispatch,
            call_adapters,
            timeouts,
        ))
    }

    fn dispatch_for(&self, config: &ClientConfig) -> Result<Dispatch, ConfigurationError> {
        if !config.async_dispatch {
            return Ok(Dispatch::Direct);
        }
        let scheduler = match &config.scheduler_override {
            Some(custom) => Scheduler::dedicated(custom.pool_size, &custom.thread_name_prefix)
                .map_err(|e| e.within("connection"))?,
            None => self
                .shared_scheduler
                .clone()
                .or_else(Scheduler::current)
                .ok_or_else(|| {
                    ConfigurationError::new(
                        "connection.scheduler",
                        "async dispatch needs a shared scheduler or an ambient runtime",
                    )
                })?,
        };
        debug!(scheduler = scheduler.name(), "Using scheduled dispatch");
        Ok(Dispatch::Scheduled(scheduler))
    }
}

fn build_transport(timeouts: &TransportTimeouts) -> Result<reqwest::Client, ConfigurationError> {
    let mut builder = reqwest::Client::builder().gzip(true).brotli(true);

    if let Some(timeout) = timeouts.connect {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = timeouts.read {
        builder = builder.read_timeout(timeout);
    }
    if let Some(timeout) = timeouts.write {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| ConfigurationError::new("connection", e.to_string()))
}

/// Normalize a configured base URL: trimmed, absolute `http(s)`, ending with `/`.
pub fn normalize_base_url(raw: &str) -> Result<url::Url, ConfigurationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigurationError::new("base-url", "must not be blank"));
    }

    let candidate = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = url::Url::parse(&candidate).map_err(|e| {
        ConfigurationError::new("base-url", format!("`{}` is not a valid URL: {}", trimmed, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigurationError::new(
            "base-url",
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigurationError::new(
            "base-url",
            format!("`{}` cannot be used as a base URL", trimmed),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigurationError::new(
            "base-url",
            "must not carry a query or fragment",
        ));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PendingCall;
    use crate::{CallInfo, RequestIdInterceptor, TextConverter, TimeoutAdapter};
    use std::time::Duration;

    fn direct(url: &str) -> ClientConfig {
        ClientConfig::builder(url).async_dispatch(false).build()
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8080/default").unwrap().as_str(),
            "http://localhost:8080/default/"
        );
        assert_eq!(
            normalize_base_url("http://localhost:9090/custom/").unwrap().as_str(),
            "http://localhost:9090/custom/"
        );
        assert_eq!(
            normalize_base_url("  https://example.com ").unwrap().as_str(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_normalize_rejects_bad_urls() {
        for raw in ["", "   ", "not a url", "ftp://example.com", "mailto:a@b.c", "http://h/p?q=1"] {
            let err = normalize_base_url(raw).unwrap_err();
            assert_eq!(err.field, "base-url", "for {raw:?}");
        }
    }

    #[test]
    fn test_default_converter_and_timeouts() {
        let config = ClientConfig::builder("http://localhost:8080")
            .async_dispatch(false)
            .connect_timeout_ms(50)
            .read_timeout_ms(2_000)
            .build();
        let factory = ClientFactoryBuilder::new().build(&config).unwrap();

        assert_eq!(factory.converter_media_types(), vec!["application/json"]);
        let timeouts = factory.timeouts();
        assert_eq!(timeouts.connect, None);
        assert_eq!(timeouts.read, Some(Duration::from_millis(2_000)));
        assert_eq!(timeouts.write, Some(Duration::from_millis(30_000)));
        assert!(!factory.dispatch().is_async());
    }

    struct Named(&'static str, i32);

    #[async_trait::async_trait]
    impl Interceptor for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn order(&self) -> i32 {
            self.1
        }

        async fn intercept(
            &self,
            request: reqwest::Request,
            next: crate::Next<'_>,
        ) -> crate::CallResult<crate::Response> {
            next.run(request).await
        }
    }

    #[test]
    fn test_interceptor_order_and_debug_logging_last() {
        let builder = ClientFactoryBuilder::new()
            .interceptor(Named("b", 10))
            .interceptor(Named("a", 1))
            .interceptor(Named("c", 10));

        let factory = builder.build(&direct("http://localhost")).unwrap();
        assert_eq!(factory.interceptor_names(), vec!["a", "b", "c"]);

        let config = ClientConfig::builder("http://localhost")
            .async_dispatch(false)
            .debug_request(true)
            .build();
        let factory = builder
            .clone()
            .interceptor(RequestIdInterceptor::new().with_order(i32::MIN))
            .build(&config)
            .unwrap();
        let names = factory.interceptor_names();
        assert!(names[0].ends_with("RequestIdInterceptor"));
        assert!(names.last().unwrap().ends_with("BodyLoggingInterceptor"));
    }

    struct HttpsOnly;

    impl CallAdapter for HttpsOnly {
        fn supports(&self, base_url: &url::Url) -> bool {
            base_url.scheme() == "https"
        }

        fn adapt(&self, _call: &CallInfo, pending: PendingCall) -> PendingCall {
            pending
        }
    }

    #[test]
    fn test_unsupported_call_adapter_fails_eagerly() {
        let builder = ClientFactoryBuilder::new()
            .call_adapter(TimeoutAdapter::new(Duration::from_secs(1)))
            .call_adapter(HttpsOnly);

        let err = builder.build(&direct("http://localhost")).unwrap_err();
        assert_eq!(err.field, "base-url");
        assert!(err.reason.contains("HttpsOnly"));

        let factory = builder.build(&direct("https://localhost")).unwrap();
        assert_eq!(factory.call_adapter_names().len(), 2);
    }

    #[test]
    fn test_converters_sorted_by_order() {
        let factory = ClientFactoryBuilder::new()
            .converter(TextConverter)
            .converter(JsonConverter::new().with_order(0))
            .build(&direct("http://localhost"))
            .unwrap();
        assert_eq!(
            factory.converter_media_types(),
            vec!["application/json", "text/plain"]
        );
    }

    #[test]
    fn test_async_without_scheduler_outside_runtime() {
        let config = ClientConfig::builder("http://localhost").build();
        let err = ClientFactoryBuilder::new().build(&config).unwrap_err();
        assert_eq!(err.field, "connection.scheduler");
    }

    #[test]
    fn test_dedicated_scheduler() {
        let config = ClientConfig::builder("http://localhost")
            .scheduler(3, "CalcScheduler")
            .build();
        let factory = ClientFactoryBuilder::new().build(&config).unwrap();

        let scheduler = factory.dispatch().scheduler().unwrap();
        assert!(scheduler.is_dedicated());
        assert_eq!(scheduler.worker_threads(), Some(3));
        assert_eq!(scheduler.name(), "CalcScheduler");
    }

    #[test]
    fn test_invalid_scheduler_bounds() {
        let config = ClientConfig::builder("http://localhost")
            .scheduler(0, "CalcScheduler")
            .build();
        let err = ClientFactoryBuilder::new().build(&config).unwrap_err();
        assert_eq!(err.field, "connection.scheduler.core-pool-size");
    }

    #[tokio::test]
    async fn test_async_uses_ambient_runtime() {
        let config = ClientConfig::builder("http://localhost").build();
        let factory = ClientFactoryBuilder::new().build(&config).unwrap();
        let scheduler = factory.dispatch().scheduler().unwrap();
        assert!(!scheduler.is_dedicated());
    }
}
