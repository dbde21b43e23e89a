//! Remote call descriptors.

use crate::{CallError, CallResult};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde_json::Value;

/// Identity of a call, handed to call adapters.
#[derive(Debug, Clone)]
pub struct CallInfo {
    /// Service the call belongs to.
    pub service: &'static str,
    /// Operation (method) name.
    pub operation: &'static str,
    /// HTTP verb.
    pub method: Method,
    /// Resolved relative path.
    pub path: String,
}

/// One remote call: verb, relative path and parameter bindings.
///
/// Generated service proxies build one descriptor per method invocation; it can
/// also be built by hand and passed to [`ClientFactory::call`](crate::ClientFactory::call).
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    service: &'static str,
    operation: &'static str,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Value>,
    media_type: Option<String>,
}

impl CallDescriptor {
    /// Create a descriptor for `method` on a path relative to the base URL.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            service: "",
            operation: "",
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            media_type: None,
        }
    }

    /// Attach the service and operation names used in logs and adapters.
    pub fn named(mut self, service: &'static str, operation: &'static str) -> Self {
        self.service = service;
        self.operation = operation;
        self
    }

    /// Substitute a `{name}` placeholder in the path.
    pub fn path_param<V: Serialize + ?Sized>(mut self, name: &str, value: &V) -> CallResult<Self> {
        let rendered = scalars(name, value)?;
        let [single] = rendered.as_slice() else {
            return Err(CallError::InvalidRequest(format!(
                "path parameter `{}` must be a single value",
                name
            )));
        };
        let placeholder = format!("{{{}}}", name);
        if !self.path.contains(&placeholder) {
            return Err(CallError::InvalidRequest(format!(
                "path `{}` has no placeholder `{}`",
                self.path, placeholder
            )));
        }
        self.path = self
            .path
            .replace(&placeholder, &urlencoding::encode(single));
        Ok(self)
    }

    /// Add a query parameter. `None` values are skipped, sequences repeat the key.
    pub fn query<V: Serialize + ?Sized>(mut self, name: &str, value: &V) -> CallResult<Self> {
        for rendered in scalars(name, value)? {
            self.query.push((name.to_string(), rendered));
        }
        Ok(self)
    }

    /// Add a header. `None` values are skipped.
    pub fn header<V: Serialize + ?Sized>(mut self, name: &str, value: &V) -> CallResult<Self> {
        let header_name = HeaderName::try_from(name)
            .map_err(|e| CallError::InvalidRequest(format!("header `{}`: {}", name, e)))?;
        for rendered in scalars(name, value)? {
            let header_value = HeaderValue::try_from(rendered.as_str())
                .map_err(|e| CallError::InvalidRequest(format!("header `{}`: {}", name, e)))?;
            self.headers.append(header_name.clone(), header_value);
        }
        Ok(self)
    }

    /// Set the request body. It is encoded by the factory's body converters.
    pub fn body<V: Serialize + ?Sized>(mut self, value: &V) -> CallResult<Self> {
        let value = serde_json::to_value(value).map_err(|e| CallError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Force the media type the body is encoded with.
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// HTTP verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Relative path with placeholders substituted.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Headers set on this call.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body value, before encoding.
    pub fn body_value(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Requested body media type.
    pub fn requested_media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Identity of the call for adapters.
    pub fn info(&self) -> CallInfo {
        CallInfo {
            service: self.service,
            operation: self.operation,
            method: self.method.clone(),
            path: self.path.clone(),
        }
    }

    /// Resolve the full URL against a base URL.
    pub(crate) fn resolve_url(&self, base: &url::Url) -> CallResult<url::Url> {
        if self.path.contains('{') {
            return Err(CallError::InvalidRequest(format!(
                "unresolved placeholder in path `{}`",
                self.path
            )));
        }
        let mut url = base.join(&self.path)?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub(crate) fn into_parts(self) -> (Method, HeaderMap, Option<Value>, Option<String>) {
        (self.method, self.headers, self.body, self.media_type)
    }
}

/// Render a parameter value as zero or more strings.
fn scalars<V: Serialize + ?Sized>(name: &str, value: &V) -> CallResult<Vec<String>> {
    let value = serde_json::to_value(value)
        .map_err(|e| CallError::InvalidRequest(format!("parameter `{}`: {}", name, e)))?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| scalar(name, item))
            .collect(),
        other => scalar(name, other).map(|s| vec![s]),
    }
}

fn scalar(name: &str, value: Value) -> CallResult<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(CallError::InvalidRequest(format!(
            "parameter `{}` must be a scalar or a sequence of scalars",
            name
        ))),
    }
}
