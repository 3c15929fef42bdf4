//! Desktop notifications through a local command.

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info};

use super::admission::unexpected;
use crate::command_cache::CommandCache;
use crate::errors::HookError;
use crate::event::HookEvent;
use crate::handler::HookHandler;
use crate::types::{HookResult, HookType};

/// Shows a desktop alert with the first notifier found on this machine.
#[derive(Debug)]
pub struct DesktopAlertHook {
    commands: Vec<String>,
    cache: CommandCache,
}

impl DesktopAlertHook {
    /// Try `commands` in order, resolving them through `cache`.
    #[must_use]
    pub fn new(commands: Vec<String>, cache: CommandCache) -> Self {
        Self { commands, cache }
    }

    /// The availability cache this handler owns.
    #[must_use]
    pub fn cache(&self) -> &CommandCache {
        &self.cache
    }
}

#[async_trait]
impl HookHandler for DesktopAlertHook {
    fn name(&self) -> &str {
        "desktop-alert"
    }

    fn hook_type(&self) -> HookType {
        HookType::Notification
    }

    fn timeout_ms(&self) -> Option<u64> {
        Some(5_000)
    }

    async fn handle(&self, event: &HookEvent) -> Result<HookResult, HookError> {
        let HookEvent::Notification { title, message, .. } = event else {
            return Err(unexpected(self.name(), event));
        };

        let Some((command, program)) = self.cache.first_available(&self.commands) else {
            debug!(candidates = ?self.commands, "no notification command available");
            return Ok(HookResult::continue_());
        };

        let output = Command::new(&program)
            .args(notifier_args(command, title, message))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HookError::handler(self.name(), format!("failed to run {command}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HookError::handler(
                self.name(),
                format!("{command} exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        info!(command, title = %title, "desktop alert sent");
        Ok(HookResult::continue_().with_payload(json!({ "command": command })))
    }
}

/// Arguments for the known notifiers. Unknown commands get `title message`.
fn notifier_args(command: &str, title: &str, message: &str) -> Vec<String> {
    let program = std::path::Path::new(command)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(command);
    match program {
        "osascript" => vec![
            "-e".to_owned(),
            format!(
                "display notification {} with title {}",
                applescript_string(message),
                applescript_string(title)
            ),
        ],
        "terminal-notifier" => vec![
            "-title".to_owned(),
            title.to_owned(),
            "-message".to_owned(),
            message.to_owned(),
        ],
        _ => vec![title.to_owned(), message.to_owned()],
    }
}

fn applescript_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
