//! # orkgate-admission
//!
//! Spawn admission control for worker agents.
//!
//! - [`ledger::SpawnLedger`]: append-only JSONL record of every spawn attempt
//! - [`state::AgentStateStore`]: per-session counters and active background tags
//! - [`controller::AdmissionController`]: allow / warn / deny under sliding windows
//! - [`tags`]: fallback agent-tag detection from free text
//!
//! Storage is best-effort throughout: unreadable files count as empty,
//! failed writes are reported to the [`ErrorSink`](orkgate_core::ErrorSink)
//! and the decision is still returned.

#![deny(unsafe_code)]

pub mod controller;
pub mod errors;
pub mod ledger;
pub mod state;
pub mod tags;
pub mod types;

pub use controller::AdmissionController;
pub use errors::StorageError;
pub use ledger::SpawnLedger;
pub use state::AgentStateStore;
pub use types::{
    AgentState, CountersSnapshot, Decision, Limit, Outcome, SpawnRecord, SpawnRequest,
};
