//! Interceptors around the transport exchange.

use crate::order::LOWEST_PRECEDENCE;
use crate::{CallError, CallResult, Response};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::{AUTHORIZATION, Entry};
use http::{HeaderName, HeaderValue};
use reqwest::Request;
use std::sync::Arc;
use std::time::Instant;

/// Tracing target for HTTP traffic logs.
pub const HTTP_LOG_TARGET: &str = "courier::http";

/// Intercepts a request on its way to the transport and the response on its way back.
///
/// Call [`Next::run`] to continue the chain; returning without calling it
/// short-circuits the exchange.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Priority; lower values run first.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }

    /// Handle the request and produce a response.
    async fn intercept(&self, request: Request, next: Next<'_>) -> CallResult<Response>;
}

/// The remainder of an interceptor chain.
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a reqwest::Client,
}

impl<'a> Next<'a> {
    pub(crate) fn new(interceptors: &'a [Arc<dyn Interceptor>], transport: &'a reqwest::Client) -> Self {
        Self {
            interceptors,
            transport,
        }
    }

    /// Pass the request to the next interceptor, or to the transport at the end.
    pub async fn run(self, request: Request) -> CallResult<Response> {
        match self.interceptors.split_first() {
            Some((current, rest)) => {
                current
                    .intercept(request, Next::new(rest, self.transport))
                    .await
            }
            None => {
                let response = self.transport.execute(request).await?;
                Response::from_reqwest(response).await
            }
        }
    }
}

/// Logs requests and responses with headers and full bodies.
///
/// Appended last when a factory is built with `debug_request`, so it sees the
/// request exactly as every other interceptor left it.
#[derive(Debug, Default)]
pub struct BodyLoggingInterceptor;

#[async_trait]
impl Interceptor for BodyLoggingInterceptor {
    async fn intercept(&self, request: Request, next: Next<'_>) -> CallResult<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        let body = request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();

        tracing::debug!(
            target: HTTP_LOG_TARGET,
            method = %method,
            url = %url,
            headers = ?request.headers(),
            body = %body,
            "--> {} {}",
            method,
            url
        );

        let start = Instant::now();
        let result = next.run(request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => tracing::debug!(
                target: HTTP_LOG_TARGET,
                status = response.status().as_u16(),
                url = %response.url(),
                elapsed_ms,
                headers = ?response.headers(),
                body = %response.text_lossy(),
                "<-- {} {}",
                response.status(),
                response.url()
            ),
            Err(e) => tracing::debug!(
                target: HTTP_LOG_TARGET,
                url = %url,
                elapsed_ms,
                error = %e,
                "<-- HTTP FAILED"
            ),
        }

        result
    }
}

fn header_name(name: &str) -> CallResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| CallError::Interceptor(e.to_string()))
}

fn secret_value(value: String) -> CallResult<HeaderValue> {
    let mut value =
        HeaderValue::try_from(value).map_err(|e| CallError::Interceptor(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Sets a credential header on every request.
///
/// The header is built once, up front; values are marked sensitive so the
/// traffic log never prints them.
#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    name: HeaderName,
    value: HeaderValue,
    order: i32,
}

impl AuthInterceptor {
    /// `Authorization: Bearer <token>`
    pub fn bearer(token: &str) -> CallResult<Self> {
        Self::new(AUTHORIZATION, secret_value(format!("Bearer {}", token))?)
    }

    /// `Authorization: Basic <base64(user:password)>`
    pub fn basic(username: &str, password: &str) -> CallResult<Self> {
        let encoded = STANDARD.encode(format!("{}:{}", username, password));
        Self::new(AUTHORIZATION, secret_value(format!("Basic {}", encoded))?)
    }

    /// A key carried in a custom header such as `X-Api-Key`.
    pub fn api_key(header: &str, key: &str) -> CallResult<Self> {
        Self::new(header_name(header)?, secret_value(key.to_string())?)
    }

    fn new(name: HeaderName, value: HeaderValue) -> CallResult<Self> {
        Ok(Self {
            name,
            value,
            order: LOWEST_PRECEDENCE,
        })
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

#[async_trait]
impl Interceptor for AuthInterceptor {
    fn order(&self) -> i32 {
        self.order
    }

    async fn intercept(&self, mut request: Request, next: Next<'_>) -> CallResult<Response> {
        request
            .headers_mut()
            .insert(self.name.clone(), self.value.clone());
        next.run(request).await
    }
}

/// Tags each request with a fresh UUID unless the caller already set one.
#[derive(Debug, Clone)]
pub struct RequestIdInterceptor {
    name: HeaderName,
    order: i32,
}

impl RequestIdInterceptor {
    /// Uses `x-request-id`.
    pub fn new() -> Self {
        Self {
            name: HeaderName::from_static("x-request-id"),
            order: LOWEST_PRECEDENCE,
        }
    }

    pub fn with_header(header: &str) -> CallResult<Self> {
        Ok(Self {
            name: header_name(header)?,
            ..Self::new()
        })
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl Default for RequestIdInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for RequestIdInterceptor {
    fn order(&self) -> i32 {
        self.order
    }

    async fn intercept(&self, mut request: Request, next: Next<'_>) -> CallResult<Response> {
        if let Entry::Vacant(slot) = request.headers_mut().entry(self.name.clone()) {
            let id = HeaderValue::try_from(uuid::Uuid::new_v4().to_string())
                .map_err(|e| CallError::Interceptor(e.to_string()))?;
            slot.insert(id);
        }
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_are_sensitive() {
        let bearer = AuthInterceptor::bearer("token").unwrap();
        assert_eq!(bearer.name, AUTHORIZATION);
        assert_eq!(bearer.value, "Bearer token");
        assert!(bearer.value.is_sensitive());

        let basic = AuthInterceptor::basic("user", "pass").unwrap();
        assert_eq!(basic.value, "Basic dXNlcjpwYXNz");

        let key = AuthInterceptor::api_key("X-Api-Key", "k").unwrap();
        assert_eq!(key.name.as_str(), "x-api-key");
    }

    #[test]
    fn test_invalid_headers_fail_at_construction() {
        assert!(matches!(
            AuthInterceptor::api_key("bad header", "k"),
            Err(CallError::Interceptor(_))
        ));
        assert!(AuthInterceptor::bearer("line\nbreak").is_err());
        assert!(RequestIdInterceptor::with_header("").is_err());
    }

    #[test]
    fn test_order_and_name() {
        let interceptor = RequestIdInterceptor::new().with_order(5);
        assert_eq!(interceptor.order(), 5);
        assert!(interceptor.name().ends_with("RequestIdInterceptor"));
        assert_eq!(BodyLoggingInterceptor.order(), LOWEST_PRECEDENCE);
    }
}
