//! Hook handler trait.
//!
//! Defines the [`HookHandler`] trait every lifecycle handler implements.
//! Handlers are registered with the [`HookRegistry`](crate::registry::HookRegistry)
//! and run by the [`FanOutExecutor`](crate::executor::FanOutExecutor).

use async_trait::async_trait;

use crate::errors::HookError;
use crate::event::HookEvent;
use crate::types::{HookResult, HookType};

/// A lifecycle hook handler.
///
/// Handlers for the same event run concurrently and must not depend on each
/// other's side effects. Each receives the same immutable event.
///
/// # Failure
///
/// Returning `Err`, panicking, or overrunning the deadline are all handled
/// the same way: the handler is marked failed, the failure is reported, and
/// the other handlers' results stand.
#[async_trait]
pub trait HookHandler: Send + Sync {
    /// Unique name within its hook type.
    fn name(&self) -> &str;

    /// Event type this handler responds to.
    fn hook_type(&self) -> HookType;

    /// Listing order. Higher first. Default: 0.
    fn priority(&self) -> i32 {
        0
    }

    /// Optional human-readable description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Deadline in milliseconds. `None` uses the dispatcher default.
    fn timeout_ms(&self) -> Option<u64> {
        None
    }

    /// Handle one event.
    async fn handle(&self, event: &HookEvent) -> Result<HookResult, HookError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use orkgate_core::SessionId;

    struct Fixed {
        result: HookResult,
    }

    #[async_trait]
    impl HookHandler for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn hook_type(&self) -> HookType {
            HookType::Notification
        }
        async fn handle(&self, _event: &HookEvent) -> Result<HookResult, HookError> {
            Ok(self.result.clone())
        }
    }

    fn event() -> HookEvent {
        HookEvent::Notification {
            session_id: SessionId::from("s1"),
            timestamp: None,
            title: "Build finished".to_string(),
            message: "All green".to_string(),
            level: None,
            extensions: serde_json::Map::new(),
        }
    }

    #[test]
    fn defaults() {
        let handler = Fixed {
            result: HookResult::continue_(),
        };
        assert_eq!(handler.priority(), 0);
        assert!(handler.description().is_none());
        assert!(handler.timeout_ms().is_none());
    }

    #[tokio::test]
    async fn returns_result() {
        let handler = Fixed {
            result: HookResult::block("unsafe"),
        };
        let result = handler.handle(&event()).await.unwrap();
        assert!(result.is_blocked());
        assert_eq!(result.reason.as_deref(), Some("unsafe"));
    }
}
