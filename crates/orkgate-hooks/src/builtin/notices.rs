//! Informational handlers. They log and never block.

use std::sync::Arc;

use async_trait::async_trait;
use orkgate_admission::AdmissionController;
use serde_json::json;
use tracing::info;

use super::admission::unexpected;
use crate::errors::HookError;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::types::{HookResult, HookType};

/// Logs agent completions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionNoticeHook;

#[async_trait]
impl HookHandler for CompletionNoticeHook {
    fn name(&self) -> &str {
        "completion-notice"
    }

    fn hook_type(&self) -> HookType {
        HookType::AgentCompleted
    }

    async fn handle(&self, event: &HookEvent) -> Result<HookResult, HookError> {
        let HookEvent::AgentCompleted {
            session_id,
            agent_tag,
            success,
            ..
        } = event
        else {
            return Err(unexpected(self.name(), event));
        };
        info!(
            session_id = %session_id,
            agent_tag = agent_tag.as_deref().unwrap_or("unknown"),
            success = success.unwrap_or(true),
            "agent completed"
        );
        Ok(HookResult::continue_())
    }
}

/// Logs per-session totals when a session ends.
#[derive(Debug)]
pub struct SessionSummaryHook {
    controller: Arc<AdmissionController>,
}

impl SessionSummaryHook {
    /// Handler reading state through `controller`.
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl HookHandler for SessionSummaryHook {
    fn name(&self) -> &str {
        "session-summary"
    }

    fn hook_type(&self) -> HookType {
        HookType::SessionEnd
    }

    async fn handle(&self, event: &HookEvent) -> Result<HookResult, HookError> {
        let HookEvent::SessionEnd { session_id, .. } = event else {
            return Err(unexpected(self.name(), event));
        };

        let state = self.controller.state_store().load(session_id).await;
        let attempts = self.controller.ledger(session_id).entries().await.len();
        info!(
            session_id = %session_id,
            session_total = state.session_total,
            blocked_count = state.blocked_count,
            active_background = state.active_background.len(),
            ledger_entries = attempts,
            "session summary"
        );
        Ok(HookResult::continue_().with_payload(json!({
            "sessionTotal": state.session_total,
            "blockedCount": state.blocked_count,
            "activeBackground": state.active_background.keys().collect::<Vec<_>>(),
            "ledgerEntries": attempts,
        })))
    }
}
