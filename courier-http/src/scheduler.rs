//! Schedulers for async call dispatch.

use crate::adapter::PendingCall;
use crate::{CallError, ConfigurationError};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

/// Thread name prefix of the shared scheduler when it owns its own pool.
pub const SHARED_SCHEDULER_NAME: &str = "courier-io";

/// Handle to a tokio runtime that executes dispatched calls.
///
/// Cloning is cheap. A scheduler either borrows an existing runtime through its
/// [`Handle`] or owns a dedicated pool; an owned pool is shut down when the last
/// clone is dropped.
#[derive(Clone)]
pub struct Scheduler {
    name: Arc<str>,
    handle: Handle,
    pool: Option<Arc<DedicatedPool>>,
}

struct DedicatedPool {
    runtime: Option<Runtime>,
    worker_threads: usize,
}

impl Drop for DedicatedPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            debug!(workers = self.worker_threads, "Releasing dedicated scheduler pool");
            // Never blocks, so the last handle may be dropped from async code.
            runtime.shutdown_background();
        }
    }
}

impl Scheduler {
    /// Wrap an existing runtime handle.
    pub fn from_handle(name: impl Into<Arc<str>>, handle: Handle) -> Self {
        Self {
            name: name.into(),
            handle,
            pool: None,
        }
    }

    /// The runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current()
            .ok()
            .map(|handle| Self::from_handle("current", handle))
    }

    /// Process-wide scheduler for I/O-bound dispatch.
    ///
    /// Uses the ambient runtime when called from one, otherwise starts an owned
    /// multi-thread runtime. Construct it once and share the clones.
    pub fn shared() -> Result<Self, ConfigurationError> {
        if let Some(current) = Self::current() {
            return Ok(current);
        }
        let runtime = Builder::new_multi_thread()
            .thread_name(SHARED_SCHEDULER_NAME)
            .enable_all()
            .build()
            .map_err(|e| ConfigurationError::new("scheduler", e.to_string()))?;
        let workers = runtime.metrics().num_workers();
        Ok(Self::owning(SHARED_SCHEDULER_NAME, runtime, workers))
    }

    /// Start a dedicated pool of `pool_size` workers named `<prefix>-<n>`.
    pub fn dedicated(pool_size: usize, thread_name_prefix: &str) -> Result<Self, ConfigurationError> {
        if pool_size < 1 {
            return Err(ConfigurationError::new(
                "scheduler.core-pool-size",
                "must be at least 1",
            ));
        }
        if thread_name_prefix.trim().is_empty() {
            return Err(ConfigurationError::new(
                "scheduler.thread-name-prefix",
                "must not be blank",
            ));
        }

        let prefix = thread_name_prefix.to_string();
        let counter = AtomicUsize::new(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(pool_size)
            .thread_name_fn(move || {
                let id = counter.fetch_add(1, Ordering::Relaxed);
                format!("{}-{}", prefix, id)
            })
            .enable_all()
            .build()
            .map_err(|e| ConfigurationError::new("scheduler", e.to_string()))?;

        debug!(
            workers = pool_size,
            prefix = thread_name_prefix,
            "Started dedicated scheduler pool"
        );
        Ok(Self::owning(thread_name_prefix, runtime, pool_size))
    }

    fn owning(name: &str, runtime: Runtime, worker_threads: usize) -> Self {
        Self {
            name: name.into(),
            handle: runtime.handle().clone(),
            pool: Some(Arc::new(DedicatedPool {
                runtime: Some(runtime),
                worker_threads,
            })),
        }
    }

    /// Scheduler name (thread prefix for owned pools).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this scheduler owns its pool.
    pub fn is_dedicated(&self) -> bool {
        self.pool.is_some()
    }

    /// Worker count of an owned pool.
    pub fn worker_threads(&self) -> Option<usize> {
        self.pool.as_ref().map(|p| p.worker_threads)
    }

    /// Runtime handle calls are spawned on.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Run `pending` on this scheduler; the returned future completes with its result.
    pub(crate) fn run(&self, pending: PendingCall) -> PendingCall {
        // The clone keeps an owned pool alive while the call is in flight.
        let scheduler = self.clone();
        Box::pin(async move {
            scheduler
                .handle
                .spawn(pending)
                .await
                .map_err(|e| CallError::Dispatch(e.to_string()))?
        })
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.name)
            .field("dedicated", &self.is_dedicated())
            .field("worker_threads", &self.worker_threads())
            .finish()
    }
}
