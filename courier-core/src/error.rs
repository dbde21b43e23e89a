// Error types for registry, proxy and container operations

use courier_config::ConfigError;
use courier_http::ConfigurationError;
use thiserror::Error;

/// No client factory is registered under the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No client factory registered under `{requested_name}`")]
pub struct UnknownRegistryNameError {
    /// The name that was looked up.
    pub requested_name: String,
}

impl UnknownRegistryNameError {
    pub fn new(requested_name: impl Into<String>) -> Self {
        Self {
            requested_name: requested_name.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    UnknownRegistryName(#[from] UnknownRegistryNameError),

    #[error("Configuration source error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Service `{name}` is already registered by {existing}, cannot register {duplicate}")]
    DuplicateService {
        name: String,
        existing: &'static str,
        duplicate: &'static str,
    },

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
