//! Error types for factory construction and remote calls.

use std::time::Duration;
use thiserror::Error;

/// Result type for remote call operations.
pub type CallResult<T> = std::result::Result<T, CallError>;

/// Raised when a client configuration cannot produce a usable factory.
///
/// Always detected eagerly, while the factory is being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid client configuration for `{field}`: {reason}")]
pub struct ConfigurationError {
    /// Offending configuration field.
    pub field: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl ConfigurationError {
    /// Create a new configuration error.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the field with the path of the enclosing configuration entry.
    pub fn within(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.field = format!("{}.{}", prefix, self.field);
        }
        self
    }
}

/// Errors produced while executing a call through a client factory.
#[derive(Debug, Error)]
pub enum CallError {
    /// The remote endpoint answered with a non-success status.
    #[error("Remote call failed with status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    /// The call did not complete in time.
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    /// The call descriptor could not be turned into a request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request body could not be encoded.
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// The response body could not be decoded.
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// No converter accepts the response media type.
    #[error("No body converter for media type `{0}`")]
    UnsupportedMediaType(String),

    /// An interceptor rejected or failed the exchange.
    #[error("Interceptor error: {0}")]
    Interceptor(String),

    /// The scheduler could not run the call to completion.
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Underlying transport error.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl CallError {
    /// True for adapter deadlines and transport timeouts alike.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Transport(e) if e.is_timeout())
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// Get the HTTP status code if the remote answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::new("base-url", "must not be blank");
        assert_eq!(
            err.to_string(),
            "Invalid client configuration for `base-url`: must not be blank"
        );
    }

    #[test]
    fn test_configuration_error_within() {
        let err = ConfigurationError::new("base-url", "bad").within("factories.custom");
        assert_eq!(err.field, "factories.custom.base-url");

        let err = ConfigurationError::new("base-url", "bad").within("");
        assert_eq!(err.field, "base-url");
    }

    #[test]
    fn test_status_code() {
        let err = CallError::Status {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.status_code(), Some(503));
        assert!(!err.is_timeout());
        assert!(CallError::Timeout(Duration::from_secs(1)).is_timeout());
    }
}
