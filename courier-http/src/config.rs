//! Client factory configuration.

use std::time::Duration;

/// Timeouts at or below this many milliseconds are treated as unset.
pub const TIMEOUT_THRESHOLD_MS: u64 = 100;

/// Default timeout for connect, read and write, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Dedicated scheduler settings for async dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerOverride {
    /// Number of worker threads in the dedicated pool.
    pub pool_size: usize,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
}

impl SchedulerOverride {
    /// Create a new scheduler override.
    pub fn new(pool_size: usize, thread_name_prefix: impl Into<String>) -> Self {
        Self {
            pool_size,
            thread_name_prefix: thread_name_prefix.into(),
        }
    }
}

/// Configuration of one named remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, as configured. Normalized when the factory is built.
    pub base_url: String,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Write timeout in milliseconds.
    ///
    /// Applied as a deadline on the whole exchange, from sending the request
    /// to reading the last byte of the body. It is not a per-write timeout: a
    /// download that takes longer than this is cut off even while data keeps
    /// arriving. For long transfers raise it, or set it at or below
    /// [`TIMEOUT_THRESHOLD_MS`] to leave the exchange unbounded.
    pub write_timeout_ms: u64,
    /// Log all traffic with full bodies.
    pub debug_request: bool,
    /// Dispatch calls onto a scheduler.
    pub async_dispatch: bool,
    /// Dedicated pool for async dispatch; the shared scheduler is used when absent.
    pub scheduler_override: Option<SchedulerOverride>,
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                base_url: base_url.into(),
                connect_timeout_ms: DEFAULT_TIMEOUT_MS,
                read_timeout_ms: DEFAULT_TIMEOUT_MS,
                write_timeout_ms: DEFAULT_TIMEOUT_MS,
                debug_request: false,
                async_dispatch: true,
                scheduler_override: None,
            },
        }
    }

    /// Effective connect timeout, `None` when the transport default applies.
    pub fn connect_timeout(&self) -> Option<Duration> {
        effective_timeout(self.connect_timeout_ms)
    }

    /// Effective read timeout, `None` when the transport default applies.
    pub fn read_timeout(&self) -> Option<Duration> {
        effective_timeout(self.read_timeout_ms)
    }

    /// Effective write timeout, `None` when the transport default applies.
    pub fn write_timeout(&self) -> Option<Duration> {
        effective_timeout(self.write_timeout_ms)
    }
}

/// Sub-threshold values are placeholders, not meaningful timeouts.
fn effective_timeout(ms: u64) -> Option<Duration> {
    (ms > TIMEOUT_THRESHOLD_MS).then(|| Duration::from_millis(ms))
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the connection timeout in milliseconds.
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout in milliseconds.
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout in milliseconds. It bounds the whole exchange;
    /// see [`ClientConfig::write_timeout_ms`].
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Enable or disable full-body traffic logging.
    pub fn debug_request(mut self, enable: bool) -> Self {
        self.config.debug_request = enable;
        self
    }

    /// Enable or disable async dispatch.
    pub fn async_dispatch(mut self, enable: bool) -> Self {
        self.config.async_dispatch = enable;
        self
    }

    /// Use a dedicated scheduler for async dispatch.
    pub fn scheduler(mut self, pool_size: usize, thread_name_prefix: impl Into<String>) -> Self {
        self.config.scheduler_override = Some(SchedulerOverride::new(pool_size, thread_name_prefix));
        self
    }

    /// Use the shared scheduler for async dispatch.
    pub fn shared_scheduler(mut self) -> Self {
        self.config.scheduler_override = None;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
