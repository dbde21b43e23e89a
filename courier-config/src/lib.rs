// Configuration management for Courier

pub mod config_service;
pub mod env;
pub mod error;
pub mod loader;
pub mod properties;
pub mod tree;
pub mod validation;

pub use config_service::{ConfigService, ConfigServiceBuilder};
pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::FileFormat;
pub use properties::{
    CLIENT_PROPERTIES_PREFIX, ClientProperties, ConnectionProperties, FactoryProperties,
    SchedulerProperties,
};
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

type Entries = BTreeMap<String, Value>;

/// Layered configuration store.
///
/// Values are stored by dotted key (`courier.client.default-url`). Nested
/// sources are flattened on load and [`ConfigManager::section`] nests them
/// back. Each load overwrites the keys it carries, so the last source wins.
/// Clones share the same store.
#[derive(Clone, Default)]
pub struct ConfigManager {
    entries: Arc<RwLock<Entries>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only read environment variables named `PREFIX__*`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    fn absorb<I>(&self, source: &str, values: I) -> usize
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut entries = self.entries.write();
        let mut count = 0;
        for (key, value) in values {
            match entries.get_mut(&key) {
                Some(existing) => tree::merge(existing, value),
                None => {
                    entries.insert(key, value);
                }
            }
            count += 1;
        }
        debug!(source, count, "Configuration source applied");
        count
    }

    /// Apply matching process environment variables.
    pub fn load_env(&self) -> Result<()> {
        let vars = EnvLoader::new(self.env_prefix.clone()).load()?;
        self.absorb(
            "environment",
            vars.into_iter().map(|(key, value)| (key, Value::String(value))),
        );
        Ok(())
    }

    /// Export a `.env` file into the process environment, then apply the
    /// environment. Without a path a missing `./.env` is not an error.
    pub fn load_dotenv(&self, path: Option<&str>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::Dotenv(e.to_string()))?;
            }
            None => {
                if let Err(e) = dotenvy::dotenv() {
                    if !e.not_found() {
                        return Err(ConfigError::Dotenv(e.to_string()));
                    }
                }
            }
        }
        self.load_env()
    }

    /// Apply a file in the given format.
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let path = path.as_ref();
        let tree = format.read(path)?;
        debug!(path = %path.display(), ?format, "Configuration file read");
        self.load_value(tree)
    }

    /// Apply a file, detecting its format from the name.
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.load_file(path, FileFormat::detect(path)?)
    }

    /// Apply a nested tree; leaves are stored under their dotted keys.
    pub fn load_value(&self, tree: Value) -> Result<()> {
        if !tree.is_object() {
            return Err(ConfigError::parse(
                "value",
                "configuration root must be an object",
            ));
        }
        self.absorb("value", tree::flatten(tree));
        Ok(())
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| ConfigError::Store {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
        serde_json::from_value(value).map_err(|e| ConfigError::type_mismatch(key, e))
    }

    /// Like [`get`](Self::get), falling back to `default` when the key is
    /// missing or has the wrong type.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Every key, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Copy every entry of `other` over this store.
    pub fn merge(&self, other: &ConfigManager) {
        if Arc::ptr_eq(&self.entries, &other.entries) {
            return;
        }
        let snapshot = other.entries.read().clone();
        self.absorb("merge", snapshot);
    }

    /// Deserialize every key under `prefix` as one nested tree.
    ///
    /// A missing section deserializes from an empty object, so types with
    /// `#[serde(default)]` come back with their defaults.
    pub fn section<T: DeserializeOwned>(&self, prefix: &str) -> Result<T> {
        let start = format!("{}.", prefix);
        let tree = {
            let entries = self.entries.read();
            tree::nest(
                entries
                    .range(start.clone()..)
                    .take_while(|(key, _)| key.starts_with(&start))
                    .map(|(key, value)| (&key[start.len()..], value)),
            )
        };
        serde_json::from_value(tree).map_err(|e| ConfigError::type_mismatch(prefix, e))
    }

    /// Load a section and validate it.
    pub fn load_validated<T: DeserializeOwned + Validate>(&self, prefix: &str) -> Result<T> {
        let section: T = self.section(prefix)?;
        section.validate()?;
        Ok(section)
    }
}
