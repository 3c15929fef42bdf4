//! Storage locations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where per-session ledgers and state files live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Data directory. Relative paths resolve against `~/.orkgate`.
    pub data_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "sessions".to_string(),
        }
    }
}

impl StorageSettings {
    /// Absolute data directory.
    #[must_use]
    pub fn resolve_data_dir(&self) -> PathBuf {
        let dir = PathBuf::from(&self.data_dir);
        if dir.is_absolute() {
            dir
        } else {
            crate::loader::orkgate_home().join(dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_dir_is_kept() {
        let s = StorageSettings {
            data_dir: "/var/lib/orkgate".to_string(),
        };
        assert_eq!(s.resolve_data_dir(), PathBuf::from("/var/lib/orkgate"));
    }

    #[test]
    fn relative_dir_joins_home() {
        let s = StorageSettings::default();
        let resolved = s.resolve_data_dir();
        assert!(resolved.ends_with(".orkgate/sessions"));
    }
}
