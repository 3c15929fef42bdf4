//! Spawn admission controller.
//!
//! Every spawn request is checked against two sliding windows read from the
//! session's ledger:
//!
//! 1. **Burst**: all spawns in the short window. At the cap, deny.
//! 2. **Background**: background spawns in the long window. At the cap, deny
//!    background requests. Foreground requests are never denied by it.
//!
//! Below the hard limits, a request may still be flagged: when background
//! load reaches the warning threshold, or when an expensive agent is asked
//! for while other expensive agents are still in the window. Both warnings
//! can fire together.
//!
//! Every attempt is recorded, whatever its outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use orkgate_core::{AgentTag, Clock, ErrorSink, SessionId};
use orkgate_settings::{AdmissionSettings, MAX_WINDOW_SECS};
use tracing::{debug, info, instrument, warn};

use crate::ledger::{SpawnLedger, count_in_window};
use crate::state::AgentStateStore;
use crate::types::{CountersSnapshot, Decision, Limit, Outcome, SpawnRecord, SpawnRequest};

/// Decides allow / warn / deny for spawn requests.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    settings: AdmissionSettings,
    data_dir: PathBuf,
    state: AgentStateStore,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ErrorSink>,
}

impl AdmissionController {
    /// Controller storing ledgers and state under `data_dir`.
    pub fn new(
        settings: AdmissionSettings,
        data_dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        let data_dir = data_dir.into();
        Self {
            state: AgentStateStore::new(data_dir.clone(), sink.clone()),
            settings,
            data_dir,
            clock,
            sink,
        }
    }

    /// Limits in force.
    #[must_use]
    pub fn settings(&self) -> &AdmissionSettings {
        &self.settings
    }

    /// Root data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Ledger for `session`.
    pub fn ledger(&self, session: &SessionId) -> SpawnLedger {
        SpawnLedger::for_session(&self.data_dir, session, self.sink.clone())
    }

    /// State store shared by all sessions.
    #[must_use]
    pub fn state_store(&self) -> &AgentStateStore {
        &self.state
    }

    /// Evaluate one spawn request and record it.
    ///
    /// Never fails. Storage problems are reported to the sink and the
    /// decision is made from whatever could be read.
    #[instrument(
        skip_all,
        fields(session_id = %request.session_id, agent_tag = %request.agent_tag)
    )]
    pub async fn evaluate(&self, request: &SpawnRequest) -> Decision {
        let now = self.clock.now();
        let session = &request.session_id;

        let mut state = self.state.load(session).await;
        let stale_after = window(self.settings.stale_after_secs);
        if state.needs_sweep(now, stale_after) {
            let removed = state.sweep_stale(now, stale_after);
            if removed > 0 {
                debug!(removed, "swept stale background agents");
            }
        }

        let ledger = self.ledger(session);
        let records = ledger.entries().await;
        let mut counters = self.tally(&records, now);
        counters.session_total = state.session_total;
        counters.blocked_count = state.blocked_count;

        let decision = self.decide(request, counters);

        ledger
            .record(&SpawnRecord::from_request(request, decision.outcome, now))
            .await;
        state.apply(request, decision.outcome, now);
        self.state.save(session, &state).await;

        let c = &decision.counters;
        match decision.outcome {
            Outcome::Deny => warn!(
                background = request.background,
                burst_count = c.burst_count,
                background_count = c.background_count,
                limit = ?decision.limit,
                "spawn denied"
            ),
            Outcome::Warn => info!(
                background = request.background,
                background_count = c.background_count,
                expensive_active = c.expensive_active,
                "spawn allowed with warning"
            ),
            Outcome::Allow => debug!(
                background = request.background,
                burst_count = c.burst_count,
                "spawn allowed"
            ),
        }
        decision
    }

    /// Forget a completed background agent. Returns `true` if it was tracked.
    #[instrument(skip_all, fields(session_id = %session, agent_tag = %tag))]
    pub async fn release(&self, session: &SessionId, tag: &AgentTag) -> bool {
        let mut state = self.state.load(session).await;
        if !state.release(tag.as_str()) {
            debug!("agent not tracked as active background");
            return false;
        }
        self.state.save(session, &state).await;
        debug!(remaining = state.active_background.len(), "released background agent");
        true
    }

    /// Window counts for `records` as of `now`.
    fn tally(&self, records: &[SpawnRecord], now: DateTime<Utc>) -> CountersSnapshot {
        let s = &self.settings;
        let counted = |r: &SpawnRecord| s.count_denied_attempts || !r.outcome.is_denied();
        let burst_window = window(s.burst_window_secs);
        let background_window = window(s.background_window_secs);

        CountersSnapshot {
            burst_count: count_in_window(records, burst_window, now, counted),
            burst_cap: s.burst_cap,
            background_count: count_in_window(records, background_window, now, |r| {
                r.background && counted(r)
            }),
            background_cap: s.background_cap,
            expensive_active: count_in_window(records, background_window, now, |r| {
                s.is_expensive(r.agent_tag.as_str()) && counted(r)
            }),
            ..CountersSnapshot::default()
        }
    }

    /// Apply the checks in order. First deny wins; warnings accumulate.
    fn decide(&self, request: &SpawnRequest, counters: CountersSnapshot) -> Decision {
        let s = &self.settings;

        if counters.burst_count >= u64::from(s.burst_cap) {
            let reason = format!(
                "{} denied: burst limit reached ({}/{} spawns in the last {}s). \
                 Reduce the number of concurrent agent requests in this turn, \
                 or wait for existing agents to finish.",
                subject(request),
                counters.burst_count,
                s.burst_cap,
                s.burst_window_secs,
            );
            return Decision::deny(Limit::Burst, reason, counters);
        }

        if request.background && counters.background_count >= u64::from(s.background_cap) {
            let reason = format!(
                "{} denied: background concurrency limit reached ({}/{} background \
                 spawns in the last {}). Run this agent in the foreground, or retry \
                 once earlier background spawns age out of that window.",
                subject(request),
                counters.background_count,
                s.background_cap,
                human_window(s.background_window_secs),
            );
            return Decision::deny(Limit::BackgroundConcurrency, reason, counters);
        }

        let mut warnings = Vec::new();
        if counters.background_count >= u64::from(s.warn_threshold)
            && counters.background_count < u64::from(s.background_cap)
        {
            warnings.push(format!(
                "{}/{} background spawns in the last {}; approaching the background \
                 concurrency limit.",
                counters.background_count,
                s.background_cap,
                human_window(s.background_window_secs),
            ));
        }
        if s.is_expensive(request.agent_tag.as_str())
            && counters.expensive_active >= u64::from(s.expensive_active_threshold)
        {
            warnings.push(format!(
                "'{}' is an expensive agent and {} expensive spawns already ran in \
                 the last {}; consider waiting for them to finish.",
                request.agent_tag,
                counters.expensive_active,
                human_window(s.background_window_secs),
            ));
        }

        if warnings.is_empty() {
            Decision::allow(counters)
        } else {
            Decision::warn(warnings.join("\n"), counters)
        }
    }
}

/// Window length, clamped to the longest accepted window.
fn window(secs: u64) -> Duration {
    let secs = i64::try_from(secs.min(MAX_WINDOW_SECS)).unwrap_or(i64::MAX);
    Duration::seconds(secs)
}

fn human_window(secs: u64) -> String {
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{secs}s")
    }
}

fn subject(request: &SpawnRequest) -> String {
    let description = request.description.trim();
    if description.is_empty() {
        format!("Spawn of '{}'", request.agent_tag)
    } else {
        format!("Spawn of '{}' (\"{description}\")", request.agent_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use orkgate_core::{FixedClock, MemoryErrorSink};
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        controller: AdmissionController,
        clock: Arc<FixedClock>,
        sink: Arc<MemoryErrorSink>,
    }

    fn harness_with(settings: AdmissionSettings) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::new(
            DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        ));
        let sink = Arc::new(MemoryErrorSink::new());
        let controller =
            AdmissionController::new(settings, dir.path(), clock.clone(), sink.clone());
        Harness {
            _dir: dir,
            controller,
            clock,
            sink,
        }
    }

    fn harness() -> Harness {
        harness_with(AdmissionSettings::default())
    }

    fn request(tag: &str, description: &str, background: bool) -> SpawnRequest {
        SpawnRequest {
            session_id: SessionId::from("session-1"),
            agent_tag: AgentTag::from(tag),
            description: description.to_string(),
            background,
        }
    }

    /// Write `n` records directly to the ledger, `age` before the clock.
    async fn seed(h: &Harness, n: usize, age: Duration, tag: &str, background: bool) {
        let ledger = h.controller.ledger(&SessionId::from("session-1"));
        let at = h.clock.now() - age;
        for _ in 0..n {
            let record =
                SpawnRecord::from_request(&request(tag, "seeded", background), Outcome::Allow, at);
            ledger.record(&record).await;
        }
    }

    #[tokio::test]
    async fn first_spawn_is_allowed_and_counted() {
        let h = harness();
        let session = SessionId::from("session-1");

        let decision = h
            .controller
            .evaluate(&request("test-generator", "write tests", false))
            .await;
        assert_eq!(decision.outcome, Outcome::Allow);
        assert!(decision.reason.is_none());

        let state = h.controller.state_store().load(&session).await;
        assert_eq!(state.session_total, 1);
        assert_eq!(state.blocked_count, 0);
        assert_eq!(h.controller.ledger(&session).entries().await.len(), 1);
        assert_eq!(h.sink.suppressed_count(), 0);
    }

    #[tokio::test]
    async fn burst_cap_denies_with_tag_and_description() {
        let h = harness();
        seed(&h, 8, Duration::seconds(2), "code-reviewer", false).await;

        let decision = h
            .controller
            .evaluate(&request("security-auditor", "Audit the authentication module", false))
            .await;

        assert_eq!(decision.outcome, Outcome::Deny);
        assert_matches!(decision.limit, Some(Limit::Burst));
        let reason = decision.reason.unwrap();
        assert!(reason.contains("security-auditor"));
        assert!(reason.contains("Audit the authentication module"));
        assert!(reason.contains("8/8"));
        assert_eq!(decision.counters.burst_count, 8);

        let state = h
            .controller
            .state_store()
            .load(&SessionId::from("session-1"))
            .await;
        assert_eq!(state.blocked_count, 1);
        assert_eq!(state.session_total, 1);
    }

    #[tokio::test]
    async fn burst_window_slides() {
        let h = harness();
        seed(&h, 8, Duration::seconds(2), "a", false).await;
        h.clock.advance(Duration::seconds(4));

        let decision = h.controller.evaluate(&request("a", "later", false)).await;
        assert_eq!(decision.outcome, Outcome::Allow);
        assert_eq!(decision.counters.burst_count, 0);
    }

    #[tokio::test]
    async fn foreground_is_exempt_from_background_cap() {
        let h = harness();
        seed(&h, 6, Duration::minutes(2), "researcher", true).await;

        let decision = h.controller.evaluate(&request("researcher", "look it up", false)).await;
        assert_ne!(decision.outcome, Outcome::Deny);
        assert_eq!(decision.counters.background_count, 6);
    }

    #[tokio::test]
    async fn background_cap_denies_background_request() {
        let h = harness();
        seed(&h, 6, Duration::minutes(2), "researcher", true).await;

        let decision = h.controller.evaluate(&request("researcher", "look it up", true)).await;
        assert_eq!(decision.outcome, Outcome::Deny);
        assert_matches!(decision.limit, Some(Limit::BackgroundConcurrency));
        assert!(decision.reason.unwrap().contains("6/6"));

        let state = h
            .controller
            .state_store()
            .load(&SessionId::from("session-1"))
            .await;
        assert!(state.active_background.is_empty());
    }

    #[tokio::test]
    async fn warn_threshold_warns_below_cap() {
        let h = harness();
        seed(&h, 5, Duration::minutes(1), "researcher", true).await;

        let decision = h.controller.evaluate(&request("researcher", "dig", true)).await;
        assert_eq!(decision.outcome, Outcome::Warn);
        assert!(decision.reason.unwrap().contains("5/6"));

        let state = h
            .controller
            .state_store()
            .load(&SessionId::from("session-1"))
            .await;
        assert!(state.active_background.contains_key("researcher"));
    }

    #[tokio::test]
    async fn expensive_tag_warns() {
        let h = harness();
        seed(&h, 2, Duration::minutes(1), "llm-integrator", false).await;

        let decision = h
            .controller
            .evaluate(&request("workflow-architect", "plan", false))
            .await;
        assert_eq!(decision.outcome, Outcome::Warn);
        assert!(decision.reason.unwrap().contains("workflow-architect"));
        assert_eq!(decision.counters.expensive_active, 2);
    }

    #[tokio::test]
    async fn cheap_tag_ignores_expensive_load() {
        let h = harness();
        seed(&h, 3, Duration::minutes(1), "llm-integrator", false).await;

        let decision = h.controller.evaluate(&request("test-generator", "tests", false)).await;
        assert_eq!(decision.outcome, Outcome::Allow);
    }

    #[tokio::test]
    async fn both_warnings_are_joined() {
        let h = harness();
        seed(&h, 5, Duration::minutes(1), "system-design-reviewer", true).await;

        let decision = h
            .controller
            .evaluate(&request("backend-system-architect", "design", true))
            .await;
        assert_eq!(decision.outcome, Outcome::Warn);
        let reason = decision.reason.unwrap();
        let lines: Vec<&str> = reason.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("5/6"));
        assert!(lines[1].contains("backend-system-architect"));
    }

    #[tokio::test]
    async fn denied_attempts_count_by_default() {
        let h = harness_with(AdmissionSettings {
            burst_cap: 2,
            ..AdmissionSettings::default()
        });
        for _ in 0..2 {
            let _ = h.controller.evaluate(&request("a", "x", false)).await;
        }
        let denied = h.controller.evaluate(&request("a", "x", false)).await;
        assert_eq!(denied.outcome, Outcome::Deny);

        // Three records in the window now, including the denied one
        let again = h.controller.evaluate(&request("a", "x", false)).await;
        assert_eq!(again.counters.burst_count, 3);
    }

    #[tokio::test]
    async fn denied_attempts_can_be_excluded() {
        let h = harness_with(AdmissionSettings {
            burst_cap: 2,
            count_denied_attempts: false,
            ..AdmissionSettings::default()
        });
        for _ in 0..3 {
            let _ = h.controller.evaluate(&request("a", "x", false)).await;
        }
        let again = h.controller.evaluate(&request("a", "x", false)).await;
        assert_eq!(again.outcome, Outcome::Deny);
        assert_eq!(again.counters.burst_count, 2);

        let state = h
            .controller
            .state_store()
            .load(&SessionId::from("session-1"))
            .await;
        assert_eq!(state.session_total, 4);
        assert_eq!(state.blocked_count, 2);
    }

    #[tokio::test]
    async fn background_cap_clears_only_as_window_slides() {
        let h = harness();
        let session = SessionId::from("session-1");
        seed(&h, 6, Duration::minutes(2), "researcher", true).await;

        let denied = h.controller.evaluate(&request("researcher", "again", true)).await;
        assert!(denied.reason.unwrap().contains("age out of that window"));

        // Completion does not free capacity; the ledger window does.
        let _ = h.controller.release(&session, &AgentTag::from("researcher")).await;
        let still = h.controller.evaluate(&request("researcher", "again", true)).await;
        assert_eq!(still.outcome, Outcome::Deny);

        h.clock.advance(Duration::minutes(4));
        let after = h.controller.evaluate(&request("researcher", "again", true)).await;
        assert_ne!(after.outcome, Outcome::Deny);
    }

    #[tokio::test]
    async fn release_drops_active_tag() {
        let h = harness();
        let session = SessionId::from("session-1");
        let _ = h.controller.evaluate(&request("researcher", "dig", true)).await;

        assert!(h.controller.release(&session, &AgentTag::from("researcher")).await);
        assert!(!h.controller.release(&session, &AgentTag::from("researcher")).await);
        let state = h.controller.state_store().load(&session).await;
        assert!(state.active_background.is_empty());
        assert_eq!(state.session_total, 1);
    }

    #[tokio::test]
    async fn stale_background_entries_are_swept() {
        let h = harness();
        let session = SessionId::from("session-1");
        let _ = h.controller.evaluate(&request("researcher", "dig", true)).await;

        h.clock.advance(Duration::minutes(31));
        let _ = h.controller.evaluate(&request("other", "fg", false)).await;

        let state = h.controller.state_store().load(&session).await;
        assert!(!state.active_background.contains_key("researcher"));
        assert_eq!(state.last_cleanup, Some(h.clock.now()));
    }

    #[tokio::test]
    async fn unwritable_storage_still_decides() {
        let h = harness();
        std::fs::write(h.controller.data_dir().join("session-1"), "blocker").unwrap();

        let decision = h.controller.evaluate(&request("a", "x", false)).await;
        assert_eq!(decision.outcome, Outcome::Allow);
        assert!(!h.sink.reports_for("ledger").is_empty());
        assert!(!h.sink.reports_for("state").is_empty());
    }

    #[tokio::test]
    async fn deny_is_logged_at_warn() {
        let (logs, _guard) = orkgate_core::logging::capture_logs();
        let h = harness_with(AdmissionSettings {
            burst_cap: 1,
            ..AdmissionSettings::default()
        });
        let _ = h.controller.evaluate(&request("a", "x", false)).await;
        let _ = h.controller.evaluate(&request("a", "x", false)).await;

        let event = logs.find(tracing::Level::WARN, "spawn denied").unwrap();
        assert_eq!(event.field("burst_count"), Some("1"));
    }

    #[test]
    fn window_clamps_huge_values() {
        assert_eq!(window(u64::MAX), Duration::seconds(MAX_WINDOW_SECS as i64));
        assert_eq!(window(5), Duration::seconds(5));
    }

    #[test]
    fn human_window_prefers_minutes() {
        assert_eq!(human_window(300), "5 min");
        assert_eq!(human_window(90), "90s");
    }
}
