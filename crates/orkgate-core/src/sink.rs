//! Suppressed-error sink.
//!
//! Storage and handler failures are never surfaced to the host, but they are
//! not dropped silently either: every swallowed error is handed to an
//! [`ErrorSink`] so operators can audit failure rates.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

/// One swallowed error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressedError {
    /// Subsystem that swallowed the error (`ledger`, `state`, `dispatch`, …).
    pub component: &'static str,
    /// Operation that failed (`append`, `read`, `save`, handler name, …).
    pub operation: String,
    /// Rendered error.
    pub message: String,
}

impl SuppressedError {
    /// Build a report from any displayable error.
    pub fn new(
        component: &'static str,
        operation: impl Into<String>,
        error: &dyn fmt::Display,
    ) -> Self {
        Self {
            component,
            operation: operation.into(),
            message: error.to_string(),
        }
    }
}

/// Destination for errors that are deliberately not propagated.
pub trait ErrorSink: Send + Sync + fmt::Debug {
    /// Record one suppressed error.
    fn report(&self, error: SuppressedError);

    /// Number of errors reported so far.
    fn suppressed_count(&self) -> u64;
}

/// Sink that emits a `warn` event per report and keeps a running count.
#[derive(Debug, Default)]
pub struct TracingErrorSink {
    count: AtomicU64,
}

impl TracingErrorSink {
    /// Create a sink with a zeroed counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorSink for TracingErrorSink {
    fn report(&self, error: SuppressedError) {
        let total = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(
            component = error.component,
            operation = %error.operation,
            error = %error.message,
            suppressed_total = total,
            "suppressed error"
        );
    }

    fn suppressed_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Sink that keeps every report in memory. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryErrorSink {
    reports: Mutex<Vec<SuppressedError>>,
}

impl MemoryErrorSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all reports.
    pub fn reports(&self) -> Vec<SuppressedError> {
        self.reports.lock().clone()
    }

    /// Reports filed by `component`.
    pub fn reports_for(&self, component: &str) -> Vec<SuppressedError> {
        self.reports
            .lock()
            .iter()
            .filter(|r| r.component == component)
            .cloned()
            .collect()
    }

    /// Drop all stored reports.
    pub fn clear(&self) {
        self.reports.lock().clear();
    }
}

impl ErrorSink for MemoryErrorSink {
    fn report(&self, error: SuppressedError) {
        self.reports.lock().push(error);
    }

    fn suppressed_count(&self) -> u64 {
        self.reports.lock().len() as u64
    }
}
