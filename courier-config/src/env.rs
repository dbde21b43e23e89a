// Environment variable loading
//
// Variables map onto dotted keys: `__` separates segments and `_` becomes `-`,
// so `COURIER__CLIENT__DEFAULT_URL` is `courier.client.default-url`.

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Segment separator in variable names.
pub const ENV_SEPARATOR: &str = "__";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader. With a prefix only `PREFIX__*` variables are read.
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix.map(|p| p.to_uppercase()),
        }
    }

    /// Load matching environment variables keyed by dotted path.
    pub fn load(&self) -> Result<HashMap<String, String>> {
        Ok(self.collect(env::vars()))
    }

    /// Load variables from `name=value` pairs, e.g. parsed from a `.env` file.
    pub fn collect<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter(|(key, _)| self.matches(key))
            .map(|(key, value)| (env_key_to_path(&key), value))
            .collect()
    }

    fn matches(&self, key: &str) -> bool {
        match &self.prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with(ENV_SEPARATOR)),
            None => true,
        }
    }

    /// Load a specific variable by dotted path, e.g. `client.default-url`.
    pub fn load_var(&self, path: &str) -> Result<String> {
        let name = match &self.prefix {
            Some(prefix) => format!("{}{}{}", prefix, ENV_SEPARATOR, path_to_env_key(path)),
            None => path_to_env_key(path),
        };

        env::var(&name).map_err(ConfigError::Env)
    }

    /// Load with default value
    pub fn load_var_or(&self, path: &str, default: &str) -> String {
        self.load_var(path).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

/// `COURIER__CLIENT__DEFAULT_URL` -> `courier.client.default-url`
pub fn env_key_to_path(key: &str) -> String {
    key.split(ENV_SEPARATOR)
        .map(|segment| segment.to_lowercase().replace('_', "-"))
        .collect::<Vec<_>>()
        .join(".")
}

/// `client.default-url` -> `CLIENT__DEFAULT_URL`
pub fn path_to_env_key(path: &str) -> String {
    path.split('.')
        .map(|segment| segment.to_uppercase().replace('-', "_"))
        .collect::<Vec<_>>()
        .join(ENV_SEPARATOR)
}
