//! Append-only spawn ledger.
//!
//! One newline-delimited JSON file per session. Every spawn attempt is
//! appended, including denied ones. Corruption is handled per line: a
//! truncated or garbled line is skipped and the lines around it still count.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use orkgate_core::{ErrorSink, SessionId, SuppressedError};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::StorageError;
use crate::types::SpawnRecord;

/// Ledger file name inside a session directory.
pub const LEDGER_FILE: &str = "spawns.jsonl";

/// Sink component name for ledger failures.
const COMPONENT: &str = "ledger";

/// Append-only record of spawn attempts for one session.
#[derive(Debug, Clone)]
pub struct SpawnLedger {
    path: PathBuf,
    sink: Arc<dyn ErrorSink>,
}

impl SpawnLedger {
    /// Ledger stored at an explicit path.
    pub fn new(path: impl Into<PathBuf>, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            path: path.into(),
            sink,
        }
    }

    /// Ledger for `session` under the data directory.
    pub fn for_session(data_dir: &Path, session: &SessionId, sink: Arc<dyn ErrorSink>) -> Self {
        Self::new(data_dir.join(session.file_stem()).join(LEDGER_FILE), sink)
    }

    /// Ledger file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Failures are reported to the sink, never returned.
    pub async fn record(&self, entry: &SpawnRecord) {
        if let Err(e) = self.append(entry).await {
            self.sink.report(SuppressedError::new(COMPONENT, "append", &e));
        }
    }

    async fn append(&self, entry: &SpawnRecord) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }

    /// All parsable records, oldest first.
    ///
    /// A missing ledger is empty. An unreadable one is reported and treated
    /// as empty, so admission fails open.
    pub async fn entries(&self) -> Vec<SpawnRecord> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                let err = StorageError::io(&self.path, e);
                self.sink.report(SuppressedError::new(COMPONENT, "read", &err));
                return Vec::new();
            }
        };

        let (records, skipped) = parse_lines(&String::from_utf8_lossy(&bytes));
        if skipped > 0 {
            debug!(path = %self.path.display(), skipped, "skipped malformed ledger lines");
        }
        records
    }

    /// Count records inside `[now - window, now]` that satisfy `predicate`.
    pub async fn count_within<F>(&self, window: Duration, now: DateTime<Utc>, predicate: F) -> u64
    where
        F: Fn(&SpawnRecord) -> bool,
    {
        count_in_window(&self.entries().await, window, now, predicate)
    }
}

/// Parse ledger content line by line.
///
/// Returns the valid records and the number of non-blank lines skipped.
pub fn parse_lines(content: &str) -> (Vec<SpawnRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<SpawnRecord>(line) {
            Ok(record) => records.push(record),
            Err(_) => skipped += 1,
        }
    }
    (records, skipped)
}

/// Count `records` inside `[now - window, now]` that satisfy `predicate`.
pub fn count_in_window<F>(
    records: &[SpawnRecord],
    window: Duration,
    now: DateTime<Utc>,
    predicate: F,
) -> u64
where
    F: Fn(&SpawnRecord) -> bool,
{
    let start = now - window;
    records
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp <= now)
        .filter(|r| predicate(r))
        .count() as u64
}
