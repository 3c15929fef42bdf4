//! Fan-out dispatch settings.

use serde::{Deserialize, Serialize};

/// Settings for the hook dispatcher and its built-in handlers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchSettings {
    /// Deadline for a handler that declares none, in milliseconds.
    pub handler_timeout_ms: u64,
    /// Desktop notification commands, tried in order.
    pub notify_commands: Vec<String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            handler_timeout_ms: 10_000,
            notify_commands: vec![
                "notify-send".to_string(),
                "osascript".to_string(),
                "terminal-notifier".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = DispatchSettings::default();
        assert_eq!(s.handler_timeout_ms, 10_000);
        assert_eq!(s.notify_commands[0], "notify-send");
    }

    #[test]
    fn notify_commands_replace() {
        let s: DispatchSettings =
            serde_json::from_str(r#"{"notifyCommands": ["my-notifier"]}"#).unwrap();
        assert_eq!(s.notify_commands, vec!["my-notifier".to_string()]);
        assert_eq!(s.handler_timeout_ms, 10_000);
    }
}
