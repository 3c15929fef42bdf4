//! Admission-control limits.
//!
//! These are config-time constants: they are read once per process and are
//! never tuned per request.

use serde::{Deserialize, Serialize};

/// Limits applied by the spawn admission controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdmissionSettings {
    /// Spawns allowed inside the burst window before denying.
    pub burst_cap: u32,
    /// Burst window length in seconds.
    pub burst_window_secs: u64,
    /// Background spawns allowed inside the background window.
    pub background_cap: u32,
    /// Background window length in seconds.
    pub background_window_secs: u64,
    /// Background count at which a warning is attached.
    pub warn_threshold: u32,
    /// Agent tags whose spawns are costly enough to flag.
    pub expensive_tags: Vec<String>,
    /// Expensive spawns already in the window before flagging another.
    pub expensive_active_threshold: u32,
    /// Whether denied attempts count toward later window totals.
    pub count_denied_attempts: bool,
    /// Age after which an active background entry is considered stale.
    pub stale_after_secs: u64,
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self {
            burst_cap: 8,
            burst_window_secs: 5,
            background_cap: 6,
            background_window_secs: 300,
            warn_threshold: 5,
            expensive_tags: vec![
                "workflow-architect".to_string(),
                "system-design-reviewer".to_string(),
                "backend-system-architect".to_string(),
                "llm-integrator".to_string(),
            ],
            expensive_active_threshold: 2,
            count_denied_attempts: true,
            stale_after_secs: 1800,
        }
    }
}

impl AdmissionSettings {
    /// Whether `tag` is in the expensive set (case-insensitive).
    #[must_use]
    pub fn is_expensive(&self, tag: &str) -> bool {
        self.expensive_tags
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag))
    }
}
