// Configuration file formats

use crate::env::env_key_to_path;
use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Formats a configuration file can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Nested JSON object.
    Json,
    /// Nested TOML tables.
    Toml,
    /// `KEY=value` lines using the environment variable key mapping.
    Env,
}

impl FileFormat {
    /// Pick a format from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "env" => Some(Self::Env),
            _ => None,
        }
    }

    /// Pick a format from a path. `.env` itself has no extension and is
    /// recognised by name.
    pub fn detect(path: &Path) -> Result<Self> {
        if path.file_name().is_some_and(|name| name == ".env") {
            return Ok(Self::Env);
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| ConfigError::UnknownFormat(path.to_path_buf()))
    }

    fn label(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Toml => "TOML",
            Self::Env => "env",
        }
    }

    /// Parse file content into a value tree.
    ///
    /// JSON and TOML yield a nested tree; env content yields a flat object
    /// keyed by dotted path.
    pub fn parse(self, content: &str) -> Result<Value> {
        match self {
            Self::Json => serde_json::from_str(content).map_err(|e| ConfigError::parse(self.label(), e)),
            Self::Toml => {
                let table: toml::Table =
                    toml::from_str(content).map_err(|e| ConfigError::parse(self.label(), e))?;
                serde_json::to_value(table).map_err(|e| ConfigError::parse(self.label(), e))
            }
            Self::Env => Ok(parse_env_lines(content)),
        }
    }

    /// Read and parse a file.
    pub fn read(self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&content)
    }
}

fn parse_env_lines(content: &str) -> Value {
    let entries: Map<String, Value> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.strip_prefix("export ").unwrap_or(line))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = unquote(value.trim());
            (env_key_to_path(key.trim()), Value::String(value.to_string()))
        })
        .collect();
    Value::Object(entries)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
