//! Logging setup for Courier applications
//!
//! Installs a `tracing-subscriber` fmt subscriber. HTTP traffic logged by
//! factories built with `debug_request` goes to the `courier::http` target;
//! `http-traffic = true` switches that target on at debug level.
//!
//! The same settings can come from the `courier.logging` configuration
//! section:
//!
//! ```toml
//! [courier.logging]
//! level = "debug"
//! format = "json"
//! http-traffic = true
//! output = { daily = { directory = "logs", prefix = "courier.log" } }
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use courier_core::logging::*;
//!
//! let _guard = LogConfig::new()
//!     .level(Level::INFO)
//!     .format(LogFormat::Compact)
//!     .with_http_traffic(true)
//!     .init()
//!     .expect("logging already initialized");
//!
//! info!("Clients configured");
//! ```

use crate::{Error, Result};
use courier_config::ConfigManager;
use courier_http::HTTP_LOG_TARGET;
use serde::Deserialize;
use std::path::PathBuf;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::{self, MakeWriter, format::FmtSpan};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

pub use tracing::{Level, debug, error, info, trace, warn};

/// Configuration section read by [`LogConfig::from_config`].
pub const LOGGING_PREFIX: &str = "courier.logging";

/// How each event is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-line, for development
    Pretty,
    #[default]
    Compact,
}

/// Where events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Append to one file
    File(PathBuf),
    /// One file per day in `directory`
    Daily { directory: PathBuf, prefix: String },
}

impl LogOutput {
    fn writer(&self) -> Result<(NonBlocking, WorkerGuard)> {
        Ok(match self {
            Self::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            Self::Stderr => tracing_appender::non_blocking(std::io::stderr()),
            Self::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| Error::Logging(format!("cannot open {}: {}", path.display(), e)))?;
                tracing_appender::non_blocking(file)
            }
            Self::Daily { directory, prefix } => {
                tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, prefix))
            }
        })
    }
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LogConfig {
    /// Base level, used when neither `filter` nor `RUST_LOG` is set
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Include worker thread names, e.g. `CalcScheduler-3`
    pub thread_names: bool,
    pub targets: bool,
    /// Emit an event when each span closes
    pub span_events: bool,
    pub ansi: bool,
    /// Add `courier::http=debug` on top of the filter
    pub http_traffic: bool,
    /// Full filter directives; takes precedence over `level` and `RUST_LOG`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            thread_names: false,
            targets: true,
            span_events: false,
            ansi: false,
            http_traffic: false,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the `courier.logging` section; missing keys keep their defaults.
    pub fn from_config(config: &ConfigManager) -> Result<Self> {
        Ok(config.section(LOGGING_PREFIX)?)
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level.as_str().to_ascii_lowercase();
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_thread_names(mut self, enable: bool) -> Self {
        self.thread_names = enable;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_span_events(mut self, enable: bool) -> Self {
        self.span_events = enable;
        self
    }

    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.ansi = enable;
        self
    }

    pub fn with_http_traffic(mut self, enable: bool) -> Self {
        self.http_traffic = enable;
        self
    }

    /// Filter directives, e.g. `courier_core=debug,reqwest=info`.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Filter directives this configuration installs.
    pub fn directives(&self) -> String {
        let base = self
            .filter
            .clone()
            .or_else(|| {
                std::env::var(EnvFilter::DEFAULT_ENV)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
            })
            .unwrap_or_else(|| self.level.clone());
        if self.http_traffic {
            format!("{},{}=debug", base, HTTP_LOG_TARGET)
        } else {
            base
        }
    }

    fn layer<W>(&self, writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let span_events = if self.span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(self.targets)
            .with_thread_names(self.thread_names)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Json => layer
                .json()
                .with_current_span(self.span_events)
                .with_span_list(self.span_events)
                .boxed(),
            LogFormat::Pretty => layer.pretty().with_ansi(self.ansi).boxed(),
            LogFormat::Compact => layer.compact().with_ansi(self.ansi).boxed(),
        }
    }

    /// Install the global subscriber.
    ///
    /// Keep the returned guard alive for the life of the program; dropping it
    /// flushes buffered output. Fails if a global subscriber is already set.
    pub fn init(self) -> Result<WorkerGuard> {
        let filter =
            EnvFilter::try_new(self.directives()).map_err(|e| Error::Logging(e.to_string()))?;
        let (writer, guard) = self.output.writer()?;

        tracing_subscriber::registry()
            .with(self.layer(writer))
            .with(filter)
            .try_init()
            .map_err(|e| Error::Logging(e.to_string()))?;
        Ok(guard)
    }
}
