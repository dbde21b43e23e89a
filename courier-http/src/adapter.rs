//! Call adapters wrapped around each remote call.

use crate::order::LOWEST_PRECEDENCE;
use crate::{CallError, CallInfo, CallResult, Response, Scheduler};
use futures::future::BoxFuture;
use std::time::Duration;

/// A call that has been assembled but not yet driven.
pub type PendingCall = BoxFuture<'static, CallResult<Response>>;

/// Wraps the execution of every call made through a factory.
///
/// Adapters run after the dispatch adapter, in priority order; each one wraps
/// the previous, so the adapter with the highest `order` is outermost.
pub trait CallAdapter: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Priority; lower values are applied first.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }

    /// Whether this adapter can be paired with a factory for `base_url`.
    fn supports(&self, base_url: &url::Url) -> bool {
        let _ = base_url;
        true
    }

    /// Wrap a pending call.
    fn adapt(&self, call: &CallInfo, pending: PendingCall) -> PendingCall;
}

/// How calls are driven once assembled.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Complete on the caller's execution context.
    Direct,
    /// Spawn on a scheduler and await completion.
    Scheduled(Scheduler),
}

impl Dispatch {
    /// Whether calls leave the caller's context.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }

    /// Scheduler used for async dispatch.
    pub fn scheduler(&self) -> Option<&Scheduler> {
        match self {
            Self::Direct => None,
            Self::Scheduled(scheduler) => Some(scheduler),
        }
    }

    pub(crate) fn dispatch(&self, pending: PendingCall) -> PendingCall {
        match self {
            Self::Direct => pending,
            Self::Scheduled(scheduler) => scheduler.run(pending),
        }
    }
}

/// Fails calls that take longer than a fixed duration.
#[derive(Debug, Clone)]
pub struct TimeoutAdapter {
    timeout: Duration,
    order: i32,
}

impl TimeoutAdapter {
    /// Create a new timeout adapter.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            order: LOWEST_PRECEDENCE,
        }
    }

    /// Set the adapter priority.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl CallAdapter for TimeoutAdapter {
    fn order(&self) -> i32 {
        self.order
    }

    fn adapt(&self, call: &CallInfo, pending: PendingCall) -> PendingCall {
        let timeout = self.timeout;
        let operation = call.operation;
        Box::pin(async move {
            match tokio::time::timeout(timeout, pending).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::debug!(operation, ?timeout, "Call exceeded adapter timeout");
                    Err(CallError::Timeout(timeout))
                }
            }
        })
    }
}
