//! # orkgate-hooks
//!
//! Lifecycle event dispatch for orkgate.
//!
//! The host sends one [`HookEvent`](event::HookEvent) per lifecycle point.
//! The [`FanOutExecutor`](executor::FanOutExecutor) looks up the handlers
//! registered for that event type in the [`HookRegistry`](registry::HookRegistry)
//! and runs them all concurrently.
//!
//! ## Fault isolation
//!
//! A handler that errors, panics, or overruns its deadline is contained:
//! its siblings still run, the failure is reported to the error sink and
//! summarized in one `warn` event, and the host still gets an answer. Only
//! a *successful* `Block` result (a denied spawn) stops the host.
//!
//! ## Built-in handlers
//!
//! [`builtin::default_registry`] wires spawn admission, background-agent
//! release, completion and session logging, and desktop alerts.

#![deny(unsafe_code)]

pub mod builtin;
pub mod command_cache;
pub mod errors;
pub mod event;
pub mod executor;
pub mod handler;
pub mod registry;
pub mod response;
pub mod types;

pub use builtin::default_registry;
pub use command_cache::CommandCache;
pub use errors::HookError;
pub use event::{HookEvent, normalize_flag};
pub use executor::{DispatchReport, FanOutExecutor};
pub use handler::HookHandler;
pub use registry::HookRegistry;
pub use response::HookResponse;
pub use types::{HandlerOutcome, HookAction, HookInfo, HookResult, HookType};
