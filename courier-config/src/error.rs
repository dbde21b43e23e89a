// Errors raised while loading or reading configuration

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration key `{0}`")]
    MissingKey(String),

    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot detect configuration format of {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error("Malformed {format} configuration: {reason}")]
    Parse { format: &'static str, reason: String },

    #[error("Invalid value for `{field}`: {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Cannot store `{key}`: {reason}")]
    Store { key: String, reason: String },

    #[error("Cannot deserialize `{key}`: {reason}")]
    Type { key: String, reason: String },

    #[error("Cannot load .env file: {0}")]
    Dotenv(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(format: &'static str, reason: impl ToString) -> Self {
        Self::Parse {
            format,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn type_mismatch(key: &str, reason: impl ToString) -> Self {
        Self::Type {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
