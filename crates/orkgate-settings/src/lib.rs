//! # orkgate-settings
//!
//! Layered configuration for orkgate.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`OrkgateSettings::default()`]
//! 2. **User file**: `~/.orkgate/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `ORKGATE_*` overrides (highest priority)
//!
//! The admission limits are read once per process. Nothing here is tunable
//! per request.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings_from_path, orkgate_home, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
