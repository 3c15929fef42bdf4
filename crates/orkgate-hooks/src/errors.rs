//! Hook error types.

use thiserror::Error;

/// Errors a hook handler, or the dispatch around it, can produce.
///
/// None of these reach the host. The executor turns each into a failed
/// [`HandlerOutcome`](crate::types::HandlerOutcome) and reports it to the
/// error sink.
#[derive(Debug, Error)]
pub enum HookError {
    /// Handler returned an error.
    #[error("hook handler '{name}' failed: {message}")]
    Handler {
        /// Handler name.
        name: String,
        /// Error message from the handler.
        message: String,
    },

    /// Handler did not finish before its deadline.
    #[error("hook handler '{name}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Handler name.
        name: String,
        /// Deadline in milliseconds.
        timeout_ms: u64,
    },

    /// Handler panicked.
    #[error("hook handler '{name}' panicked: {message}")]
    Panicked {
        /// Handler name.
        name: String,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// Event payload did not parse.
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

impl HookError {
    /// Handler error from any displayable cause.
    pub fn handler(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Handler {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let err = HookError::Timeout {
            name: "desktop-alert".to_string(),
            timeout_ms: 250,
        };
        assert_eq!(
            err.to_string(),
            "hook handler 'desktop-alert' timed out after 250ms"
        );
    }

    #[test]
    fn invalid_event_from_json() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: HookError = source.into();
        assert!(err.to_string().starts_with("invalid event"));
    }
}
