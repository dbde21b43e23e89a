//! Body converters between wire bytes and structured values.

use crate::order::LOWEST_PRECEDENCE;
use crate::{CallError, CallResult};
use serde_json::Value;

/// Media type of JSON bodies.
pub const APPLICATION_JSON: &str = "application/json";
/// Media type of URL-encoded form bodies.
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
/// Media type of plain text bodies.
pub const TEXT_PLAIN: &str = "text/plain";

/// Encodes request bodies and decodes response bodies for one media type.
///
/// Values travel through the pipeline as [`serde_json::Value`] so converters
/// stay object safe; typed (de)serialization happens at the proxy boundary.
pub trait BodyConverter: Send + Sync {
    /// Media type written into `Content-Type` for encoded bodies.
    fn media_type(&self) -> &str;

    /// Priority; lower values are consulted first.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }

    /// Whether responses of `media_type` can be decoded.
    fn can_read(&self, media_type: &str) -> bool {
        media_type.eq_ignore_ascii_case(self.media_type())
    }

    /// Encode a request body.
    fn encode(&self, value: &Value) -> CallResult<Vec<u8>>;

    /// Decode a response body.
    fn decode(&self, body: &[u8]) -> CallResult<Value>;
}

/// JSON converter. Omits null object fields when encoding by default.
#[derive(Debug, Clone)]
pub struct JsonConverter {
    omit_nulls: bool,
    order: i32,
}

impl JsonConverter {
    /// Create a JSON converter that omits null fields.
    pub fn new() -> Self {
        Self {
            omit_nulls: true,
            order: LOWEST_PRECEDENCE,
        }
    }

    /// Keep null fields in encoded bodies.
    pub fn keep_nulls(mut self) -> Self {
        self.omit_nulls = false;
        self
    }

    /// Set the converter priority.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl Default for JsonConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

impl BodyConverter for JsonConverter {
    fn media_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn can_read(&self, media_type: &str) -> bool {
        media_type.eq_ignore_ascii_case(APPLICATION_JSON) || media_type.ends_with("+json")
    }

    fn encode(&self, value: &Value) -> CallResult<Vec<u8>> {
        let result = if self.omit_nulls {
            let mut value = value.clone();
            strip_nulls(&mut value);
            serde_json::to_vec(&value)
        } else {
            serde_json::to_vec(value)
        };
        result.map_err(|e| CallError::Encode(e.to_string()))
    }

    fn decode(&self, body: &[u8]) -> CallResult<Value> {
        serde_json::from_slice(body).map_err(|e| CallError::Decode(e.to_string()))
    }
}

/// Plain text converter; reads any `text/*` response as a string.
#[derive(Debug, Clone, Default)]
pub struct TextConverter;

impl BodyConverter for TextConverter {
    fn media_type(&self) -> &str {
        TEXT_PLAIN
    }

    fn can_read(&self, media_type: &str) -> bool {
        media_type.to_ascii_lowercase().starts_with("text/")
    }

    fn encode(&self, value: &Value) -> CallResult<Vec<u8>> {
        Ok(match value {
            Value::String(s) => s.clone().into_bytes(),
            other => other.to_string().into_bytes(),
        })
    }

    fn decode(&self, body: &[u8]) -> CallResult<Value> {
        Ok(Value::String(String::from_utf8_lossy(body).into_owned()))
    }
}

/// URL-encoded form converter for flat objects.
#[derive(Debug, Clone, Default)]
pub struct FormConverter;

impl BodyConverter for FormConverter {
    fn media_type(&self) -> &str {
        APPLICATION_FORM
    }

    fn encode(&self, value: &Value) -> CallResult<Vec<u8>> {
        let Value::Object(map) = value else {
            return Err(CallError::Encode("form body must be an object".to_string()));
        };
        let mut pairs = Vec::with_capacity(map.len());
        for (key, field) in map {
            let rendered = match field {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(CallError::Encode(format!(
                        "form field `{}` must be a scalar",
                        key
                    )));
                }
            };
            pairs.push((key.as_str(), rendered));
        }
        serde_urlencoded::to_string(&pairs)
            .map(String::into_bytes)
            .map_err(|e| CallError::Encode(e.to_string()))
    }

    fn decode(&self, body: &[u8]) -> CallResult<Value> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(body).map_err(|e| CallError::Decode(e.to_string()))?;
        Ok(Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        ))
    }
}
