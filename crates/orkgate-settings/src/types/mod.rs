//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so a settings file may name only the values it overrides.

mod admission;
mod dispatch;
mod storage;

pub use admission::*;
pub use dispatch::*;
pub use storage::*;

pub use orkgate_core::logging::LogFormat;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Longest window accepted for any sliding-window limit (one week).
pub const MAX_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Root settings type.
///
/// Loaded from `~/.orkgate/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// ```json
/// {
///   "admission": { "burstCap": 4, "expensiveTags": ["ml-engineer"] },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrkgateSettings {
    /// Spawn admission limits.
    pub admission: AdmissionSettings,
    /// Hook dispatch settings.
    pub dispatch: DispatchSettings,
    /// Storage locations.
    pub storage: StorageSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl OrkgateSettings {
    /// Check the invariants the admission controller relies on.
    pub fn validate(&self) -> Result<()> {
        let a = &self.admission;
        if a.burst_cap == 0 || a.background_cap == 0 {
            return Err(SettingsError::InvalidValue(
                "admission caps must be at least 1".to_string(),
            ));
        }
        for (name, secs) in [
            ("burstWindowSecs", a.burst_window_secs),
            ("backgroundWindowSecs", a.background_window_secs),
            ("staleAfterSecs", a.stale_after_secs),
        ] {
            if secs == 0 || secs > MAX_WINDOW_SECS {
                return Err(SettingsError::InvalidValue(format!(
                    "{name} must be between 1 and {MAX_WINDOW_SECS}, got {secs}"
                )));
            }
        }
        if a.warn_threshold > a.background_cap {
            return Err(SettingsError::InvalidValue(format!(
                "warnThreshold ({}) exceeds backgroundCap ({})",
                a.warn_threshold, a.background_cap
            )));
        }
        if self.dispatch.handler_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "handlerTimeoutMs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}
