//! Core types for the hook system.
//!
//! Hook types, handler results, and per-handler outcomes. Everything on the
//! wire uses `camelCase` so the host can read reports without translation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::HookError;

/// Lifecycle event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookType {
    /// The host wants to spawn a worker agent.
    SpawnRequested,
    /// A worker agent finished.
    AgentCompleted,
    /// The host asks for a desktop alert.
    Notification,
    /// The host session is ending.
    SessionEnd,
}

impl HookType {
    /// All variants, in lifecycle order.
    #[must_use]
    pub fn all() -> &'static [HookType] {
        &[
            Self::SpawnRequested,
            Self::AgentCompleted,
            Self::Notification,
            Self::SessionEnd,
        ]
    }

    /// Wire name, identical to the event's `eventType` tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpawnRequested => "spawnRequested",
            Self::AgentCompleted => "agentCompleted",
            Self::Notification => "notification",
            Self::SessionEnd => "sessionEnd",
        }
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookType {
    type Err = String;

    /// Accepts the wire name in any case, with or without `-`/`_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| !matches!(c, '-' | '_')).collect();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown event type: {s}"))
    }
}

/// Action a handler asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookAction {
    /// Proceed.
    #[default]
    Continue,
    /// Proceed, with a message for the caller.
    Warn,
    /// Refuse the operation.
    Block,
}

/// Result returned by a hook handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResult {
    /// Action to take.
    pub action: HookAction,
    /// Why the operation is blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Warning or informational text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Handler-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl HookResult {
    /// A `Continue` result.
    #[must_use]
    pub fn continue_() -> Self {
        Self::default()
    }

    /// A `Warn` result carrying `message`.
    #[must_use]
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            action: HookAction::Warn,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// A `Block` result with a reason.
    #[must_use]
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            action: HookAction::Block,
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Attach structured data.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Whether this result blocks the operation.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.action == HookAction::Block
    }
}

/// What happened to one handler during a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerOutcome {
    /// Handler name.
    pub handler_name: String,
    /// Whether the handler returned a result.
    pub succeeded: bool,
    /// Rendered failure, when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The handler's result, when it succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<HookResult>,
}

impl HandlerOutcome {
    /// Successful outcome.
    #[must_use]
    pub fn success(handler_name: impl Into<String>, result: HookResult) -> Self {
        Self {
            handler_name: handler_name.into(),
            succeeded: true,
            error: None,
            payload: Some(result),
        }
    }

    /// Failed outcome.
    #[must_use]
    pub fn failure(handler_name: impl Into<String>, error: &HookError) -> Self {
        Self {
            handler_name: handler_name.into(),
            succeeded: false,
            error: Some(error.to_string()),
            payload: None,
        }
    }
}

/// Registered handler, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookInfo {
    /// Handler name.
    pub name: String,
    /// Event type it handles.
    pub hook_type: HookType,
    /// Ordering priority (higher first).
    pub priority: i32,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Per-handler deadline, if it declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}
