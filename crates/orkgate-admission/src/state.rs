//! Per-session agent state store.
//!
//! One JSON object per session, replaced on every admission decision. Each
//! write goes to its own uniquely named sibling temp file and is renamed
//! into place, so a reader never sees a half-written object and concurrent
//! writers never collide on the temp path. No cross-process locking is
//! attempted: the last rename wins.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use orkgate_core::{ErrorSink, SessionId, SuppressedError};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::StorageError;
use crate::types::AgentState;

/// State file name inside a session directory.
pub const STATE_FILE: &str = "agent-state.json";

const COMPONENT: &str = "state";

/// File-backed store of [`AgentState`] records.
#[derive(Debug, Clone)]
pub struct AgentStateStore {
    data_dir: PathBuf,
    sink: Arc<dyn ErrorSink>,
}

impl AgentStateStore {
    /// Store rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            data_dir: data_dir.into(),
            sink,
        }
    }

    /// State file path for `session`.
    #[must_use]
    pub fn path_for(&self, session: &SessionId) -> PathBuf {
        self.data_dir.join(session.file_stem()).join(STATE_FILE)
    }

    /// Load the state for `session`.
    ///
    /// Missing, unreadable, or corrupt files all yield a zeroed state; the
    /// latter two are reported to the sink.
    pub async fn load(&self, session: &SessionId) -> AgentState {
        let path = self.path_for(session);
        match read_state(&path).await {
            Ok(Some(state)) => state,
            Ok(None) => AgentState::default(),
            Err(e) => {
                self.sink.report(SuppressedError::new(COMPONENT, "load", &e));
                AgentState::default()
            }
        }
    }

    /// Persist `state` for `session`. Failures are reported, never returned.
    pub async fn save(&self, session: &SessionId, state: &AgentState) {
        let path = self.path_for(session);
        if let Err(e) = write_state(&path, state).await {
            self.sink.report(SuppressedError::new(COMPONENT, "save", &e));
        } else {
            debug!(
                path = %path.display(),
                session_total = state.session_total,
                blocked_count = state.blocked_count,
                "saved agent state"
            );
        }
    }
}

async fn read_state(path: &Path) -> Result<Option<AgentState>, StorageError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_state(path: &Path, state: &AgentState) -> Result<(), StorageError> {
    let body = serde_json::to_vec_pretty(state)?;
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || persist_atomically(&target, &body))
        .await
        .map_err(|e| StorageError::io(path, std::io::Error::other(e)))?
}

/// Write `body` to a fresh temp file next to `path`, then rename it over
/// `path`. Every call gets its own temp file.
fn persist_atomically(path: &Path, body: &[u8]) -> Result<(), StorageError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| StorageError::io(parent, e))?;
    tmp.write_all(body)
        .map_err(|e| StorageError::io(tmp.path(), e))?;
    let _ = tmp
        .persist(path)
        .map_err(|e| StorageError::io(path, e.error))?;
    Ok(())
}
