//! Storage error types.
//!
//! These never reach the host. Ledger and state operations convert them
//! into [`SuppressedError`](orkgate_core::SuppressedError) reports.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing ledger and state files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File-system operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Stored JSON could not be parsed.
    #[error("corrupt record in {}: {source}", path.display())]
    Corrupt {
        /// File holding the bad record.
        path: PathBuf,
        /// Parse error.
        source: serde_json::Error,
    },

    /// A record could not be serialized.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_display_names_path() {
        let err = StorageError::io(
            "/data/s1/spawns.jsonl",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("/data/s1/spawns.jsonl"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn corrupt_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StorageError::Corrupt {
            path: PathBuf::from("agent-state.json"),
            source,
        };
        assert!(err.to_string().starts_with("corrupt record in agent-state.json"));
    }
}
