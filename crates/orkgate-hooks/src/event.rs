//! Lifecycle events.
//!
//! One variant per [`HookType`], tagged by `eventType`. Each variant has a
//! typed core; anything else the host sends lands in `extensions` untouched.
//!
//! ```json
//! {
//!   "eventType": "spawnRequested",
//!   "sessionId": "abc123",
//!   "agentTag": "security-auditor",
//!   "description": "Audit the authentication module",
//!   "background": "true"
//! }
//! ```

use orkgate_core::SessionId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::HookError;
use crate::types::HookType;

/// A lifecycle event as received from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum HookEvent {
    /// See [`HookType::SpawnRequested`].
    #[serde(rename_all = "camelCase")]
    SpawnRequested {
        /// Owning session.
        #[serde(default)]
        session_id: SessionId,
        /// Host timestamp, passed through as given.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
        /// Requested worker kind, when the host names it.
        #[serde(default, alias = "subagentType", skip_serializing_if = "Option::is_none")]
        agent_tag: Option<String>,
        /// Short human-readable purpose.
        #[serde(default)]
        description: String,
        /// Full prompt text, scanned when no tag is given.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
        /// Background flag, normalized by [`normalize_flag`].
        #[serde(default, alias = "runInBackground", deserialize_with = "deserialize_flag")]
        background: bool,
        /// Provider-specific keys.
        #[serde(flatten)]
        extensions: Map<String, Value>,
    },
    /// See [`HookType::AgentCompleted`].
    #[serde(rename_all = "camelCase")]
    AgentCompleted {
        /// Owning session.
        #[serde(default)]
        session_id: SessionId,
        /// Host timestamp, passed through as given.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
        /// Worker kind that finished.
        #[serde(default, alias = "subagentType", skip_serializing_if = "Option::is_none")]
        agent_tag: Option<String>,
        /// Whether the worker reported success.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        success: Option<bool>,
        /// Provider-specific keys.
        #[serde(flatten)]
        extensions: Map<String, Value>,
    },
    /// See [`HookType::Notification`].
    #[serde(rename_all = "camelCase")]
    Notification {
        /// Owning session.
        #[serde(default)]
        session_id: SessionId,
        /// Host timestamp, passed through as given.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
        /// Alert title.
        #[serde(default)]
        title: String,
        /// Alert body.
        #[serde(default)]
        message: String,
        /// Severity hint (`info`, `warning`, ...).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<String>,
        /// Provider-specific keys.
        #[serde(flatten)]
        extensions: Map<String, Value>,
    },
    /// See [`HookType::SessionEnd`].
    #[serde(rename_all = "camelCase")]
    SessionEnd {
        /// Owning session.
        #[serde(default)]
        session_id: SessionId,
        /// Host timestamp, passed through as given.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
        /// Provider-specific keys.
        #[serde(flatten)]
        extensions: Map<String, Value>,
    },
}

impl HookEvent {
    /// Parse one event from JSON text.
    pub fn from_json(text: &str) -> Result<Self, HookError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The [`HookType`] this event dispatches to.
    #[must_use]
    pub fn hook_type(&self) -> HookType {
        match self {
            Self::SpawnRequested { .. } => HookType::SpawnRequested,
            Self::AgentCompleted { .. } => HookType::AgentCompleted,
            Self::Notification { .. } => HookType::Notification,
            Self::SessionEnd { .. } => HookType::SessionEnd,
        }
    }

    /// Owning session.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::SpawnRequested { session_id, .. }
            | Self::AgentCompleted { session_id, .. }
            | Self::Notification { session_id, .. }
            | Self::SessionEnd { session_id, .. } => session_id,
        }
    }

    /// Keys outside the typed core.
    #[must_use]
    pub fn extensions(&self) -> &Map<String, Value> {
        match self {
            Self::SpawnRequested { extensions, .. }
            | Self::AgentCompleted { extensions, .. }
            | Self::Notification { extensions, .. }
            | Self::SessionEnd { extensions, .. } => extensions,
        }
    }
}

/// Interpret a host-supplied flag.
///
/// `true`, `1`, and the strings `"true"` / `"1"` (trimmed, any case) are set.
/// Everything else, including `null` and absent values, is unset.
#[must_use]
pub fn normalize_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64() == Some(1),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_flag(&value))
}
