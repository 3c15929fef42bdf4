//! Admission data model.
//!
//! All persisted types use `camelCase` JSON so ledger lines and state files
//! stay readable by the host's own tooling.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use orkgate_core::{AgentTag, SessionId};
use serde::{Deserialize, Serialize};

/// Result class of one admission check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Proceed silently.
    #[default]
    Allow,
    /// Proceed, but surface a warning to the caller.
    Warn,
    /// Refuse the spawn.
    Deny,
}

impl Outcome {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::Deny => "deny",
        }
    }

    /// Whether the spawn was refused.
    #[must_use]
    pub fn is_denied(self) -> bool {
        self == Self::Deny
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which hard limit produced a deny.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Limit {
    /// Too many spawns inside the burst window.
    Burst,
    /// Too many background spawns inside the background window.
    BackgroundConcurrency,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Burst => f.write_str("burst limit"),
            Self::BackgroundConcurrency => f.write_str("background concurrency limit"),
        }
    }
}

/// A spawn request as seen by the controller, already normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Owning session.
    pub session_id: SessionId,
    /// Requested worker kind.
    pub agent_tag: AgentTag,
    /// Short human-readable purpose.
    pub description: String,
    /// Whether the caller will not wait on the result.
    pub background: bool,
}

/// One ledger line.
///
/// Records are append-only. Old entries age out of the windows at read time;
/// the file is never rewritten.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnRecord {
    /// When the spawn was attempted.
    pub timestamp: DateTime<Utc>,
    /// Requested worker kind.
    pub agent_tag: AgentTag,
    /// Short human-readable purpose.
    #[serde(default)]
    pub description: String,
    /// Owning session.
    pub session_id: SessionId,
    /// Background spawn flag.
    #[serde(default)]
    pub background: bool,
    /// Outcome the attempt received.
    #[serde(default)]
    pub outcome: Outcome,
}

impl SpawnRecord {
    /// Ledger record for `request` decided at `timestamp`.
    #[must_use]
    pub fn from_request(
        request: &SpawnRequest,
        outcome: Outcome,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            agent_tag: request.agent_tag.clone(),
            description: request.description.clone(),
            session_id: request.session_id.clone(),
            background: request.background,
            outcome,
        }
    }
}

/// Durable per-session agent bookkeeping.
///
/// `session_total` counts every attempt, denied ones included, so
/// `session_total >= blocked_count` always holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentState {
    /// Background tags believed to be running, with their last spawn time.
    pub active_background: BTreeMap<String, DateTime<Utc>>,
    /// Spawn attempts this session.
    pub session_total: u64,
    /// Denied attempts this session.
    pub blocked_count: u64,
    /// Last stale-entry sweep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cleanup: Option<DateTime<Utc>>,
}

impl AgentState {
    /// Apply the side effects of one decided attempt.
    pub fn apply(&mut self, request: &SpawnRequest, outcome: Outcome, now: DateTime<Utc>) {
        self.session_total += 1;
        if outcome.is_denied() {
            self.blocked_count += 1;
        } else if request.background {
            let _ = self
                .active_background
                .insert(request.agent_tag.as_str().to_owned(), now);
        }
    }

    /// Whether a stale sweep is due.
    #[must_use]
    pub fn needs_sweep(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.last_cleanup
            .is_none_or(|last| now.signed_duration_since(last) >= stale_after)
    }

    /// Drop active entries older than `stale_after`. Returns how many were removed.
    pub fn sweep_stale(&mut self, now: DateTime<Utc>, stale_after: Duration) -> usize {
        let before = self.active_background.len();
        self.active_background
            .retain(|_, started| now.signed_duration_since(*started) < stale_after);
        self.last_cleanup = Some(now);
        before - self.active_background.len()
    }

    /// Forget a background tag. Returns `true` if it was tracked.
    pub fn release(&mut self, tag: &str) -> bool {
        self.active_background.remove(tag).is_some()
    }
}

/// The counts an admission decision was based on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountersSnapshot {
    /// Attempts inside the burst window.
    pub burst_count: u64,
    /// Configured burst cap.
    pub burst_cap: u32,
    /// Background attempts inside the background window.
    pub background_count: u64,
    /// Configured background cap.
    pub background_cap: u32,
    /// Expensive-tag attempts inside the background window.
    pub expensive_active: u64,
    /// Session attempts before this one.
    pub session_total: u64,
    /// Session denials before this one.
    pub blocked_count: u64,
}

/// Result of one admission check. Computed fresh per request, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Allow, warn, or deny.
    pub outcome: Outcome,
    /// Explanation; always present for warn and deny.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Limit hit, for denies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
    /// Counts behind the decision.
    pub counters: CountersSnapshot,
}

impl Decision {
    /// Silent allow.
    #[must_use]
    pub fn allow(counters: CountersSnapshot) -> Self {
        Self {
            outcome: Outcome::Allow,
            reason: None,
            limit: None,
            counters,
        }
    }

    /// Allow with a warning.
    #[must_use]
    pub fn warn(reason: impl Into<String>, counters: CountersSnapshot) -> Self {
        Self {
            outcome: Outcome::Warn,
            reason: Some(reason.into()),
            limit: None,
            counters,
        }
    }

    /// Deny because `limit` was hit.
    #[must_use]
    pub fn deny(limit: Limit, reason: impl Into<String>, counters: CountersSnapshot) -> Self {
        Self {
            outcome: Outcome::Deny,
            reason: Some(reason.into()),
            limit: Some(limit),
            counters,
        }
    }

    /// Whether the spawn was refused.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        self.outcome.is_denied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tag: &str, background: bool) -> SpawnRequest {
        SpawnRequest {
            session_id: SessionId::from("s1"),
            agent_tag: AgentTag::from(tag),
            description: "Audit the authentication module".to_string(),
            background,
        }
    }

    #[test]
    fn record_serializes_camel_case() {
        let ts = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record =
            SpawnRecord::from_request(&request("security-auditor", true), Outcome::Deny, ts);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["agentTag"], "security-auditor");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["background"], true);
        assert_eq!(json["outcome"], "deny");
    }

    #[test]
    fn record_tolerates_missing_optional_fields() {
        let line = r#"{"timestamp":"2026-01-01T00:00:00Z","agentTag":"x","sessionId":"s1"}"#;
        let record: SpawnRecord = serde_json::from_str(line).unwrap();
        assert!(!record.background);
        assert_eq!(record.outcome, Outcome::Allow);
        assert!(record.description.is_empty());
    }

    #[test]
    fn apply_counts_every_attempt() {
        let now = Utc::now();
        let mut state = AgentState::default();
        state.apply(&request("a", true), Outcome::Allow, now);
        state.apply(&request("b", false), Outcome::Warn, now);
        state.apply(&request("c", true), Outcome::Deny, now);

        assert_eq!(state.session_total, 3);
        assert_eq!(state.blocked_count, 1);
        assert!(state.active_background.contains_key("a"));
        assert!(!state.active_background.contains_key("b"));
        assert!(!state.active_background.contains_key("c"));
    }

    #[test]
    fn sweep_drops_only_stale_entries() {
        let now = Utc::now();
        let mut state = AgentState::default();
        let _ = state
            .active_background
            .insert("old".to_string(), now - Duration::minutes(45));
        let _ = state
            .active_background
            .insert("fresh".to_string(), now - Duration::minutes(5));

        assert!(state.needs_sweep(now, Duration::minutes(30)));
        let removed = state.sweep_stale(now, Duration::minutes(30));
        assert_eq!(removed, 1);
        assert!(state.active_background.contains_key("fresh"));
        assert_eq!(state.last_cleanup, Some(now));
        assert!(!state.needs_sweep(now + Duration::minutes(10), Duration::minutes(30)));
    }

    #[test]
    fn release_reports_presence() {
        let mut state = AgentState::default();
        state.apply(&request("a", true), Outcome::Allow, Utc::now());
        assert!(state.release("a"));
        assert!(!state.release("a"));
    }

    #[test]
    fn decision_constructors() {
        let allow = Decision::allow(CountersSnapshot::default());
        assert_eq!(allow.outcome, Outcome::Allow);
        assert!(allow.reason.is_none());

        let deny = Decision::deny(Limit::Burst, "too many", CountersSnapshot::default());
        assert!(deny.is_denied());
        assert_eq!(deny.limit, Some(Limit::Burst));
        assert_eq!(Limit::Burst.to_string(), "burst limit");
    }
}
