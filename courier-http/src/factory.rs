//! Client factory implementation.

use crate::adapter::{CallAdapter, Dispatch, PendingCall};
use crate::converter::BodyConverter;
use crate::interceptor::{Interceptor, Next};
use crate::service::HttpService;
use crate::{CallDescriptor, CallError, CallResult, Response};
use http::HeaderValue;
use reqwest::Request;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Transport timeouts a factory was built with; `None` means the transport default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportTimeouts {
    /// Connection establishment timeout.
    pub connect: Option<Duration>,
    /// Per-read timeout.
    pub read: Option<Duration>,
    /// Deadline for the whole exchange, body included, taken from
    /// `write_timeout_ms`. Long downloads need a larger value.
    pub write: Option<Duration>,
}

/// Produces working implementations of service interfaces for one endpoint.
///
/// Cheap to clone; clones share the transport, interceptor chain and scheduler.
/// Built by [`ClientFactoryBuilder`](crate::ClientFactoryBuilder).
#[derive(Clone)]
pub struct ClientFactory {
    inner: Arc<FactoryInner>,
}

struct FactoryInner {
    pipeline: Arc<Pipeline>,
    dispatch: Dispatch,
    call_adapters: Vec<Arc<dyn CallAdapter>>,
    timeouts: TransportTimeouts,
}

/// The part of a factory a dispatched call needs: it never holds the scheduler.
pub(crate) struct Pipeline {
    pub(crate) base_url: url::Url,
    pub(crate) transport: reqwest::Client,
    pub(crate) interceptors: Vec<Arc<dyn Interceptor>>,
    pub(crate) converters: Vec<Arc<dyn BodyConverter>>,
}

impl Pipeline {
    fn prepare(&self, call: CallDescriptor) -> CallResult<Request> {
        let url = call.resolve_url(&self.base_url)?;
        let (method, headers, body, media_type) = call.into_parts();

        let mut request = Request::new(method, url);
        *request.headers_mut() = headers;

        if let Some(value) = body {
            let converter = self.writer(media_type.as_deref())?;
            let encoded = converter.encode(&value)?;
            if !request.headers().contains_key(http::header::CONTENT_TYPE) {
                let content_type = HeaderValue::try_from(converter.media_type())
                    .map_err(|e| CallError::InvalidRequest(e.to_string()))?;
                request
                    .headers_mut()
                    .insert(http::header::CONTENT_TYPE, content_type);
            }
            *request.body_mut() = Some(encoded.into());
        }

        Ok(request)
    }

    fn writer(&self, media_type: Option<&str>) -> CallResult<&Arc<dyn BodyConverter>> {
        match media_type {
            Some(requested) => self
                .converters
                .iter()
                .find(|c| c.media_type().eq_ignore_ascii_case(requested))
                .ok_or_else(|| CallError::UnsupportedMediaType(requested.to_string())),
            None => self
                .converters
                .first()
                .ok_or_else(|| CallError::UnsupportedMediaType("*/*".to_string())),
        }
    }

    fn decode(&self, response: &Response) -> CallResult<Value> {
        if response.bytes().is_empty() {
            return Ok(Value::Null);
        }
        let converter = match response.media_type() {
            Some(media_type) => self
                .converters
                .iter()
                .find(|c| c.can_read(media_type))
                .ok_or_else(|| CallError::UnsupportedMediaType(media_type.to_string()))?,
            None => self
                .converters
                .first()
                .ok_or_else(|| CallError::UnsupportedMediaType("*/*".to_string()))?,
        };
        converter.decode(response.bytes())
    }

    async fn exchange(&self, request: Request) -> CallResult<Response> {
        Next::new(&self.interceptors, &self.transport)
            .run(request)
            .await
    }
}

impl ClientFactory {
    pub(crate) fn new(
        pipeline: Pipeline,
        dispatch: Dispatch,
        call_adapters: Vec<Arc<dyn CallAdapter>>,
        timeouts: TransportTimeouts,
    ) -> Self {
        Self {
            inner: Arc::new(FactoryInner {
                pipeline: Arc::new(pipeline),
                dispatch,
                call_adapters,
                timeouts,
            }),
        }
    }

    /// Normalized base URL, always ending with `/`.
    pub fn base_url(&self) -> &url::Url {
        &self.inner.pipeline.base_url
    }

    /// Create a proxy implementing the service interface `S`.
    pub fn create<S: HttpService + ?Sized>(&self) -> Arc<S> {
        S::bind(self.clone())
    }

    /// How calls are dispatched.
    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    /// Interceptor names in execution order.
    pub fn interceptor_names(&self) -> Vec<&str> {
        self.inner
            .pipeline
            .interceptors
            .iter()
            .map(|i| i.name())
            .collect()
    }

    /// Call adapter names, innermost first.
    pub fn call_adapter_names(&self) -> Vec<&str> {
        self.inner.call_adapters.iter().map(|a| a.name()).collect()
    }

    /// Media types of the body converters in priority order.
    pub fn converter_media_types(&self) -> Vec<&str> {
        self.inner
            .pipeline
            .converters
            .iter()
            .map(|c| c.media_type())
            .collect()
    }

    /// Transport timeouts in effect.
    pub fn timeouts(&self) -> TransportTimeouts {
        self.inner.timeouts
    }

    /// Whether both handles share the same factory.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Execute a call and return the raw response, whatever its status.
    pub async fn execute(&self, call: CallDescriptor) -> CallResult<Response> {
        let info = call.info();
        let request = self.inner.pipeline.prepare(call)?;

        debug!(
            service = info.service,
            operation = info.operation,
            method = %info.method,
            url = %request.url(),
            dispatch = if self.inner.dispatch.is_async() { "scheduled" } else { "direct" },
            "Executing remote call"
        );

        let pipeline = Arc::clone(&self.inner.pipeline);
        let pending: PendingCall = Box::pin(async move { pipeline.exchange(request).await });

        let mut pending = self.inner.dispatch.dispatch(pending);
        for adapter in &self.inner.call_adapters {
            pending = adapter.adapt(&info, pending);
        }
        pending.await
    }

    /// Execute a call and decode a successful response body into `T`.
    ///
    /// An empty body decodes as `null`, so `Option<T>` and `()` accept it.
    pub async fn call<T: DeserializeOwned>(&self, call: CallDescriptor) -> CallResult<T> {
        let response = self.execute(call).await?.error_for_status()?;
        let value = self.inner.pipeline.decode(&response)?;
        serde_json::from_value(value).map_err(|e| CallError::Decode(e.to_string()))
    }

    /// Execute a call and discard a successful response body.
    pub async fn send(&self, call: CallDescriptor) -> CallResult<()> {
        self.execute(call).await?.error_for_status()?;
        Ok(())
    }
}

impl PartialEq for ClientFactory {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ClientFactory {}

impl fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFactory")
            .field("base_url", &self.base_url().as_str())
            .field("dispatch", &self.inner.dispatch)
            .field("interceptors", &self.interceptor_names())
            .field("call_adapters", &self.call_adapter_names())
            .field("converters", &self.converter_media_types())
            .field("timeouts", &self.inner.timeouts)
            .finish()
    }
}
