//! Typed client properties under the `courier.client` prefix.

use crate::validation::{ConfigValidator, Validate};
use crate::{ConfigManager, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key prefix of the client properties.
pub const CLIENT_PROPERTIES_PREFIX: &str = "courier.client";

/// Default connect, read and write timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default worker count of a dedicated scheduler.
pub const DEFAULT_CORE_POOL_SIZE: usize = 100;

/// Default thread name prefix of a dedicated scheduler.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "CustomScheduler";

/// Client configuration tree: a default entry plus named factories.
///
/// ```toml
/// [courier.client]
/// default-url = "http://localhost:8080/default"
///
/// [courier.client.connection]
/// read-timeout = 5000
///
/// [courier.client.factories.custom]
/// base-url = "http://localhost:9090/custom/"
/// connection = { async-request = false }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientProperties {
    /// Base URL of the default factory; no default factory when absent.
    pub default_url: Option<String>,
    /// Connection settings of the default factory.
    pub connection: ConnectionProperties,
    /// Named factories.
    pub factories: BTreeMap<String, FactoryProperties>,
}

/// One named factory.
///
/// Its connection block starts from the built-in defaults, not from the
/// top-level block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FactoryProperties {
    pub base_url: String,
    pub connection: ConnectionProperties,
}

/// Transport and dispatch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConnectionProperties {
    #[serde(deserialize_with = "coerce::deserialize")]
    pub connect_timeout: u64,
    #[serde(deserialize_with = "coerce::deserialize")]
    pub read_timeout: u64,
    #[serde(deserialize_with = "coerce::deserialize")]
    pub write_timeout: u64,
    #[serde(deserialize_with = "coerce::deserialize")]
    pub debug_request: bool,
    #[serde(deserialize_with = "coerce::deserialize")]
    pub async_request: bool,
    pub scheduler: SchedulerProperties,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_TIMEOUT_MS,
            read_timeout: DEFAULT_TIMEOUT_MS,
            write_timeout: DEFAULT_TIMEOUT_MS,
            debug_request: false,
            async_request: true,
            scheduler: SchedulerProperties::default(),
        }
    }
}

/// Dedicated scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SchedulerProperties {
    /// Use a dedicated pool instead of the shared scheduler.
    #[serde(deserialize_with = "coerce::deserialize")]
    pub override_default: bool,
    #[serde(alias = "core-poll-size", deserialize_with = "coerce::deserialize")]
    pub core_pool_size: usize,
    pub thread_name_prefix: String,
}

impl Default for SchedulerProperties {
    fn default() -> Self {
        Self {
            override_default: true,
            core_pool_size: DEFAULT_CORE_POOL_SIZE,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl ClientProperties {
    /// Read and validate the `courier.client` section.
    pub fn load(manager: &ConfigManager) -> Result<Self> {
        let properties: Self = manager.section(CLIENT_PROPERTIES_PREFIX)?;
        properties.validate()?;
        Ok(properties)
    }

    /// Default URL, ignoring a blank value.
    pub fn default_url(&self) -> Option<&str> {
        self.default_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }
}

impl ConnectionProperties {
    /// Whether these settings ask for a dedicated scheduler.
    pub fn uses_dedicated_scheduler(&self) -> bool {
        self.async_request && self.scheduler.override_default
    }

    fn validate_at(&self, prefix: &str) -> Result<()> {
        if self.uses_dedicated_scheduler() {
            ConfigValidator::at_least(
                self.scheduler.core_pool_size,
                1,
                &format!("{}.scheduler.core-pool-size", prefix),
            )?;
            ConfigValidator::not_blank(
                &self.scheduler.thread_name_prefix,
                &format!("{}.scheduler.thread-name-prefix", prefix),
            )?;
        }
        Ok(())
    }
}

impl Validate for ClientProperties {
    fn validate(&self) -> Result<()> {
        if let Some(url) = self.default_url() {
            ConfigValidator::is_url(url, "default-url")?;
        }
        self.connection.validate_at("connection")?;

        for (name, factory) in &self.factories {
            let prefix = format!("factories.{}", name);
            ConfigValidator::not_blank(&factory.base_url, &format!("{}.base-url", prefix))?;
            ConfigValidator::is_url(&factory.base_url, &format!("{}.base-url", prefix))?;
            factory
                .connection
                .validate_at(&format!("{}.connection", prefix))?;
        }
        Ok(())
    }
}

/// Accepts either a typed value or its string form, as `.env` files and
/// environment variables only carry strings.
mod coerce {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::fmt::Display;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Typed(T),
        Text(String),
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        match Raw::<T>::deserialize(deserializer)? {
            Raw::Typed(value) => Ok(value),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map_err(|e| D::Error::custom(format!("`{}`: {}", text, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ClientProperties {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let properties = parse(json!({}));
        assert_eq!(properties.default_url(), None);
        assert!(properties.factories.is_empty());

        let connection = &properties.connection;
        assert_eq!(connection.connect_timeout, 30_000);
        assert_eq!(connection.read_timeout, 30_000);
        assert_eq!(connection.write_timeout, 30_000);
        assert!(!connection.debug_request);
        assert!(connection.async_request);
        assert!(connection.scheduler.override_default);
        assert_eq!(connection.scheduler.core_pool_size, 100);
        assert_eq!(connection.scheduler.thread_name_prefix, "CustomScheduler");
    }

    #[test]
    fn test_kebab_case_and_alias() {
        let properties = parse(json!({
            "default-url": "http://localhost:8080/default",
            "connection": {
                "read-timeout": 5000,
                "scheduler": {"core-poll-size": 8, "thread-name-prefix": "Calc"}
            },
            "factories": {
                "custom": {"base-url": "http://localhost:9090/custom/"}
            }
        }));

        assert_eq!(properties.default_url(), Some("http://localhost:8080/default"));
        assert_eq!(properties.connection.read_timeout, 5000);
        assert_eq!(properties.connection.scheduler.core_pool_size, 8);

        let custom = &properties.factories["custom"];
        assert_eq!(custom.base_url, "http://localhost:9090/custom/");
        // Named entries do not inherit the top-level block.
        assert_eq!(custom.connection, ConnectionProperties::default());
    }

    #[test]
    fn test_string_values_are_coerced() {
        let properties = parse(json!({
            "connection": {
                "connect-timeout": "250",
                "async-request": "false",
                "scheduler": {"core-pool-size": " 4 "}
            }
        }));
        assert_eq!(properties.connection.connect_timeout, 250);
        assert!(!properties.connection.async_request);
        assert_eq!(properties.connection.scheduler.core_pool_size, 4);

        let result: std::result::Result<ClientProperties, _> =
            serde_json::from_value(json!({"connection": {"read-timeout": "soon"}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_reports_field_path() {
        let properties = parse(json!({
            "factories": {"custom": {"base-url": " "}}
        }));
        match properties.validate() {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "factories.custom.base-url")
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let properties = parse(json!({
            "connection": {"scheduler": {"core-pool-size": 0}}
        }));
        match properties.validate() {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "connection.scheduler.core-pool-size")
            }
            other => panic!("unexpected result: {other:?}"),
        }

        // Pool bounds do not matter when no dedicated pool is used.
        let properties = parse(json!({
            "connection": {"async-request": false, "scheduler": {"core-pool-size": 0}}
        }));
        assert!(properties.validate().is_ok());
    }
}
