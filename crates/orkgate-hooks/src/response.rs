//! Host-facing decision output.

use orkgate_admission::Outcome;
use serde::{Deserialize, Serialize};

use crate::types::{HookAction, HookResult};

/// The JSON object written to stdout for the host.
///
/// `continue` is `false` only when a spawn was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    /// Whether the host should proceed.
    #[serde(rename = "continue")]
    pub continue_: bool,
    /// Deny reason shown to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Warning text injected into the caller's context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    /// Machine-readable decision for the host's permission layer.
    pub decision: DecisionBody,
}

/// Structured decision field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBody {
    /// `allow`, `warn`, or `deny`.
    pub decision: Outcome,
    /// Explanation, for warn and deny.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_text: Option<String>,
}

impl HookResponse {
    /// Plain "go ahead".
    #[must_use]
    pub fn proceed() -> Self {
        Self {
            continue_: true,
            reason: None,
            system_message: None,
            decision: DecisionBody {
                decision: Outcome::Allow,
                reason_text: None,
            },
        }
    }

    /// Response for an aggregated dispatch result.
    #[must_use]
    pub fn from_result(result: &HookResult) -> Self {
        match result.action {
            HookAction::Block => Self {
                continue_: false,
                reason: result.reason.clone(),
                system_message: None,
                decision: DecisionBody {
                    decision: Outcome::Deny,
                    reason_text: result.reason.clone(),
                },
            },
            HookAction::Warn => Self {
                continue_: true,
                reason: None,
                system_message: result.message.clone(),
                decision: DecisionBody {
                    decision: Outcome::Warn,
                    reason_text: result.message.clone(),
                },
            },
            HookAction::Continue => Self {
                system_message: result.message.clone(),
                ..Self::proceed()
            },
        }
    }
}
