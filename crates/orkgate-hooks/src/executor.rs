//! Fan-out hook executor.
//!
//! Runs every handler registered for an event concurrently and waits for all
//! of them to settle. A handler fails by returning `Err`, by panicking, or by
//! overrunning its deadline; all three are contained the same way:
//!
//! - the failure becomes a failed [`HandlerOutcome`],
//! - it is reported to the [`ErrorSink`],
//! - one `warn` event summarizes the failures of the dispatch.
//!
//! Failures never change the aggregate result. Only a handler that succeeds
//! with `Block` can stop the host.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::join_all;
use orkgate_core::{ErrorSink, SuppressedError};
use tracing::{debug, instrument, warn};

use crate::errors::HookError;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::registry::HookRegistry;
use crate::types::{HandlerOutcome, HookAction, HookResult};

const COMPONENT: &str = "dispatch";

/// Everything one dispatch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    /// One entry per handler, in registration order.
    pub outcomes: Vec<HandlerOutcome>,
    /// Aggregate result for the host.
    pub result: HookResult,
}

impl DispatchReport {
    /// Number of handlers that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    /// Names of the handlers that failed.
    #[must_use]
    pub fn failed_handlers(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.handler_name.as_str())
            .collect()
    }
}

/// Concurrent, fault-isolated hook dispatcher.
#[derive(Debug)]
pub struct FanOutExecutor {
    registry: HookRegistry,
    default_timeout: Duration,
    sink: Arc<dyn ErrorSink>,
}

impl FanOutExecutor {
    /// Executor over `registry`. Handlers without their own deadline get
    /// `default_timeout`.
    pub fn new(
        registry: HookRegistry,
        default_timeout: Duration,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            registry,
            default_timeout,
            sink,
        }
    }

    /// The registry being dispatched from.
    #[must_use]
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Dispatch `event` to every handler registered for its type.
    #[instrument(
        skip_all,
        fields(event_type = %event.hook_type(), session_id = %event.session_id())
    )]
    pub async fn dispatch(&self, event: &HookEvent) -> DispatchReport {
        let handlers = self.registry.handlers_for(event.hook_type());
        if handlers.is_empty() {
            debug!("no handlers registered");
            return DispatchReport {
                outcomes: Vec::new(),
                result: HookResult::continue_(),
            };
        }

        let start = Instant::now();
        let outcomes = join_all(handlers.iter().map(|h| self.run_handler(h.as_ref(), event))).await;

        let report = DispatchReport {
            result: aggregate(&outcomes),
            outcomes,
        };

        let failures = report.failure_count();
        if failures > 0 {
            let total = report.outcomes.len();
            warn!(
                failures,
                total,
                handlers = %report.failed_handlers().join(", "),
                "{failures} of {total} hook handlers failed"
            );
        }
        debug!(
            handlers = report.outcomes.len(),
            duration_ms = start.elapsed().as_millis(),
            action = ?report.result.action,
            "dispatch complete"
        );
        report
    }

    async fn run_handler(&self, handler: &dyn HookHandler, event: &HookEvent) -> HandlerOutcome {
        let name = handler.name();
        match self.settle(handler, event).await {
            Ok(result) => HandlerOutcome::success(name, result),
            Err(e) => {
                self.sink.report(SuppressedError::new(COMPONENT, name, &e));
                HandlerOutcome::failure(name, &e)
            }
        }
    }

    /// Run one handler to completion, folding panics and timeouts into errors.
    async fn settle(
        &self,
        handler: &dyn HookHandler,
        event: &HookEvent,
    ) -> Result<HookResult, HookError> {
        let timeout = handler
            .timeout_ms()
            .map_or(self.default_timeout, Duration::from_millis);
        let guarded = AssertUnwindSafe(handler.handle(event)).catch_unwind();

        match tokio::time::timeout(timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(HookError::Panicked {
                name: handler.name().to_owned(),
                message: panic_message(panic.as_ref()),
            }),
            Err(_) => Err(HookError::Timeout {
                name: handler.name().to_owned(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// Combine successful results.
///
/// The first `Block` in registration order wins. Otherwise `Warn` messages
/// are joined with newlines. Failed handlers contribute nothing.
#[must_use]
pub fn aggregate(outcomes: &[HandlerOutcome]) -> HookResult {
    let results = || outcomes.iter().filter_map(|o| o.payload.as_ref());

    if let Some(block) = results().find(|r| r.is_blocked()) {
        return block.clone();
    }

    let warnings: Vec<&str> = results()
        .filter(|r| r.action == HookAction::Warn)
        .filter_map(|r| r.message.as_deref())
        .collect();
    if warnings.is_empty() {
        HookResult::continue_()
    } else {
        HookResult::warn(warnings.join("\n"))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
