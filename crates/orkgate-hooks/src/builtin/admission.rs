//! Admission handlers: gate spawns, release finished agents.

use std::sync::Arc;

use async_trait::async_trait;
use orkgate_admission::tags::resolve_tag;
use orkgate_admission::{AdmissionController, Outcome, SpawnRequest};
use orkgate_core::AgentTag;
use serde_json::json;
use tracing::debug;

use crate::errors::HookError;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::types::{HookResult, HookType};

/// Runs every spawn request through the admission controller.
#[derive(Debug)]
pub struct SpawnAdmissionHook {
    controller: Arc<AdmissionController>,
}

impl SpawnAdmissionHook {
    /// Handler backed by `controller`.
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl HookHandler for SpawnAdmissionHook {
    fn name(&self) -> &str {
        "spawn-admission"
    }

    fn hook_type(&self) -> HookType {
        HookType::SpawnRequested
    }

    fn priority(&self) -> i32 {
        100
    }

    fn description(&self) -> Option<&str> {
        Some("Allow, warn, or deny worker spawns under burst and background limits")
    }

    async fn handle(&self, event: &HookEvent) -> Result<HookResult, HookError> {
        let HookEvent::SpawnRequested {
            session_id,
            agent_tag,
            description,
            prompt,
            background,
            ..
        } = event
        else {
            return Err(unexpected(self.name(), event));
        };

        let texts = [description.as_str(), prompt.as_deref().unwrap_or_default()];
        let request = SpawnRequest {
            session_id: session_id.clone(),
            agent_tag: resolve_tag(
                agent_tag.as_deref(),
                &texts,
                &self.controller.settings().expensive_tags,
            ),
            description: description.clone(),
            background: *background,
        };

        let decision = self.controller.evaluate(&request).await;
        let reason = decision.reason.clone().unwrap_or_default();
        let result = match decision.outcome {
            Outcome::Allow => HookResult::continue_(),
            Outcome::Warn => HookResult::warn(reason),
            Outcome::Deny => HookResult::block(reason),
        };
        Ok(result.with_payload(json!({
            "agentTag": request.agent_tag,
            "background": request.background,
            "decision": decision,
        })))
    }
}

/// Drops a finished agent from the session's active background set.
#[derive(Debug)]
pub struct AgentReleaseHook {
    controller: Arc<AdmissionController>,
}

impl AgentReleaseHook {
    /// Handler backed by `controller`.
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl HookHandler for AgentReleaseHook {
    fn name(&self) -> &str {
        "agent-release"
    }

    fn hook_type(&self) -> HookType {
        HookType::AgentCompleted
    }

    async fn handle(&self, event: &HookEvent) -> Result<HookResult, HookError> {
        let HookEvent::AgentCompleted {
            session_id,
            agent_tag,
            ..
        } = event
        else {
            return Err(unexpected(self.name(), event));
        };

        let Some(tag) = agent_tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            debug!(session_id = %session_id, "completion without agent tag, nothing to release");
            return Ok(HookResult::continue_());
        };

        let released = self
            .controller
            .release(session_id, &AgentTag::from(tag))
            .await;
        Ok(HookResult::continue_().with_payload(json!({ "released": released })))
    }
}

pub(super) fn unexpected(name: &str, event: &HookEvent) -> HookError {
    HookError::handler(name, format!("unexpected {} event", event.hook_type()))
}
