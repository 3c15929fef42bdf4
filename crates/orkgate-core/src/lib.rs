//! # orkgate-core
//!
//! Foundation types shared by every orkgate crate:
//!
//! - **Branded IDs**: [`SessionId`](ids::SessionId) and [`AgentTag`](ids::AgentTag)
//! - **Clock**: injectable time source for sliding-window evaluation
//! - **Error sink**: the single destination for deliberately swallowed errors
//! - **Logging**: `tracing` subscriber bootstrap and log capture for tests

#![deny(unsafe_code)]

pub mod clock;
pub mod ids;
pub mod logging;
pub mod sink;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{AgentTag, SessionId};
pub use sink::{ErrorSink, MemoryErrorSink, SuppressedError, TracingErrorSink};
