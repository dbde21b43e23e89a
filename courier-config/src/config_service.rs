//! Layered configuration assembled from files, `.env` and the environment.

use crate::{ClientProperties, ConfigManager, FileFormat, Result};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::info;

/// Read-only view over a loaded [`ConfigManager`].
#[derive(Clone, Default)]
pub struct ConfigService {
    manager: ConfigManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manager(manager: ConfigManager) -> Self {
        Self { manager }
    }

    pub fn builder() -> ConfigServiceBuilder {
        ConfigServiceBuilder::new()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.manager.get(key)
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.manager.get_or(key, default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.manager.has(key)
    }

    /// The validated `courier.client` section.
    pub fn client_properties(&self) -> Result<ClientProperties> {
        ClientProperties::load(&self.manager)
    }

    pub fn manager(&self) -> &ConfigManager {
        &self.manager
    }
}

enum Source {
    File(PathBuf, FileFormat),
    AutoFile(PathBuf),
    Dotenv(Option<String>),
    Env,
}

/// Collects configuration sources and applies them in a fixed order.
///
/// Files are applied in the order they were added, then `.env`, then the
/// process environment, so the environment always has the last word.
#[derive(Default)]
pub struct ConfigServiceBuilder {
    prefix: Option<String>,
    files: Vec<Source>,
    dotenv: Option<Source>,
    env: bool,
}

impl ConfigServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only read environment variables named `PREFIX__*`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn load_env(mut self) -> Self {
        self.env = true;
        self
    }

    /// Export a `.env` file before reading the environment. Implies
    /// [`load_env`](Self::load_env).
    pub fn load_dotenv(mut self, path: Option<String>) -> Self {
        self.dotenv = Some(Source::Dotenv(path));
        self.env = true;
        self
    }

    pub fn add_file(mut self, path: impl Into<PathBuf>, format: FileFormat) -> Self {
        self.files.push(Source::File(path.into(), format));
        self
    }

    /// Add a file whose format is detected from its name.
    pub fn add_auto_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(Source::AutoFile(path.into()));
        self
    }

    fn sources(self) -> (ConfigManager, Vec<Source>) {
        let manager = match self.prefix {
            Some(prefix) => ConfigManager::with_prefix(prefix),
            None => ConfigManager::new(),
        };
        let mut sources = self.files;
        match self.dotenv {
            Some(dotenv) => sources.push(dotenv),
            None if self.env => sources.push(Source::Env),
            None => {}
        }
        (manager, sources)
    }

    pub fn build(self) -> Result<ConfigService> {
        let (manager, sources) = self.sources();
        for source in &sources {
            match source {
                Source::File(path, format) => manager.load_file(path, *format)?,
                Source::AutoFile(path) => manager.load_auto(path)?,
                Source::Dotenv(path) => manager.load_dotenv(path.as_deref())?,
                Source::Env => manager.load_env()?,
            }
        }
        info!(
            sources = sources.len(),
            keys = manager.keys().len(),
            "Configuration loaded"
        );
        Ok(ConfigService::from_manager(manager))
    }
}
