//! Built-in handlers and the default wiring.
//!
//! | Event | Handlers |
//! |---|---|
//! | `spawnRequested` | `spawn-admission` |
//! | `agentCompleted` | `agent-release`, `completion-notice` |
//! | `notification` | `desktop-alert` |
//! | `sessionEnd` | `session-summary` |

mod admission;
mod desktop_alert;
mod notices;

use std::sync::Arc;

use orkgate_admission::AdmissionController;
use orkgate_settings::DispatchSettings;

pub use admission::{AgentReleaseHook, SpawnAdmissionHook};
pub use desktop_alert::DesktopAlertHook;
pub use notices::{CompletionNoticeHook, SessionSummaryHook};

use crate::command_cache::CommandCache;
use crate::registry::HookRegistry;

/// Registry with every built-in handler wired to its event.
pub fn default_registry(
    controller: Arc<AdmissionController>,
    dispatch: &DispatchSettings,
) -> HookRegistry {
    let mut registry = HookRegistry::new();
    registry.register(Arc::new(SpawnAdmissionHook::new(controller.clone())));
    registry.register(Arc::new(AgentReleaseHook::new(controller.clone())));
    registry.register(Arc::new(CompletionNoticeHook));
    registry.register(Arc::new(DesktopAlertHook::new(
        dispatch.notify_commands.clone(),
        CommandCache::from_env(),
    )));
    registry.register(Arc::new(SessionSummaryHook::new(controller)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HookType;
    use orkgate_core::{MemoryErrorSink, SystemClock};
    use orkgate_settings::AdmissionSettings;

    #[test]
    fn default_wiring() {
        let dir = tempfile::tempdir().unwrap();
        let controller = Arc::new(AdmissionController::new(
            AdmissionSettings::default(),
            dir.path(),
            Arc::new(SystemClock),
            Arc::new(MemoryErrorSink::new()),
        ));
        let registry = default_registry(controller, &DispatchSettings::default());

        assert_eq!(registry.count(), 5);
        assert_eq!(
            registry.registered_hook_names(HookType::SpawnRequested),
            vec!["spawn-admission"]
        );
        assert_eq!(
            registry.registered_hook_names(HookType::AgentCompleted),
            vec!["agent-release", "completion-notice"]
        );
        assert_eq!(
            registry.registered_hook_names(HookType::Notification),
            vec!["desktop-alert"]
        );
        assert_eq!(
            registry.registered_hook_names(HookType::SessionEnd),
            vec!["session-summary"]
        );
    }
}
