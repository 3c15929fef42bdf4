//! # orkgate
//!
//! Invoked by the host once per lifecycle event. Reads one event as JSON,
//! dispatches it to the registered handlers, and prints the decision JSON on
//! stdout. Diagnostics go to stderr.
//!
//! An unreadable or malformed event never blocks the host: it is logged and
//! answered with a plain "continue".

#![deny(unsafe_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orkgate_admission::AdmissionController;
use orkgate_core::logging::init_subscriber;
use orkgate_core::{ErrorSink, SessionId, SystemClock, TracingErrorSink};
use orkgate_hooks::{FanOutExecutor, HookEvent, HookResponse, HookType, default_registry};
use orkgate_settings::OrkgateSettings;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Spawn admission gate and lifecycle hook dispatcher.
#[derive(Parser, Debug)]
#[command(name = "orkgate", version, about)]
struct Cli {
    /// Settings file (default: `~/.orkgate/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Data directory for ledgers and state (overrides settings).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch one lifecycle event and print the host response.
    Dispatch {
        /// Read the event from this file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// List registered handlers.
    Hooks {
        /// Only this event type (e.g. `spawnRequested`).
        #[arg(long)]
        event: Option<HookType>,
    },
    /// Show a session's agent state.
    Status {
        /// Session ID.
        #[arg(long)]
        session: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    session_id: SessionId,
    session_dir: PathBuf,
    ledger_entries: usize,
    state: orkgate_admission::AgentState,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Settings first: they carry the log level
    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(orkgate_settings::settings_path);
    let loaded = orkgate_settings::load_settings_from_path(&settings_path);
    let settings = loaded.as_ref().cloned().unwrap_or_default();

    init_subscriber(&settings.logging.level, settings.logging.format);
    if let Err(e) = &loaded {
        warn!(path = %settings_path.display(), error = %e, "invalid settings, using defaults");
    }

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| settings.storage.resolve_data_dir());
    let sink: Arc<dyn ErrorSink> = Arc::new(TracingErrorSink::new());
    let controller = Arc::new(AdmissionController::new(
        settings.admission.clone(),
        data_dir,
        Arc::new(SystemClock),
        sink.clone(),
    ));

    match args.command {
        Command::Dispatch { input } => {
            let executor = build_executor(&settings, controller, sink);
            let response = dispatch(&executor, input.as_deref()).await;
            emit(&response)
        }
        Command::Hooks { event } => {
            let executor = build_executor(&settings, controller, sink);
            let hooks: Vec<_> = executor
                .registry()
                .list_all()
                .into_iter()
                .filter(|h| event.is_none_or(|t| h.hook_type == t))
                .collect();
            emit(&hooks)
        }
        Command::Status { session } => {
            let session = SessionId::from(session);
            let report = StatusReport {
                ledger_entries: controller.ledger(&session).entries().await.len(),
                state: controller.state_store().load(&session).await,
                session_dir: controller.data_dir().join(session.file_stem()),
                session_id: session,
            };
            emit(&report)
        }
    }
}

fn build_executor(
    settings: &OrkgateSettings,
    controller: Arc<AdmissionController>,
    sink: Arc<dyn ErrorSink>,
) -> FanOutExecutor {
    let registry = default_registry(controller, &settings.dispatch);
    FanOutExecutor::new(
        registry,
        Duration::from_millis(settings.dispatch.handler_timeout_ms),
        sink,
    )
}

/// Read, parse, and dispatch one event. Never fails.
async fn dispatch(executor: &FanOutExecutor, input: Option<&Path>) -> HookResponse {
    let event = match read_event(input).await {
        Ok(event) => event,
        Err(e) => {
            warn!(error = format!("{e:#}"), "ignoring unreadable event");
            return HookResponse::proceed();
        }
    };
    debug!(event_type = %event.hook_type(), session_id = %event.session_id(), "dispatching");
    let report = executor.dispatch(&event).await;
    HookResponse::from_result(&report.result)
}

async fn read_event(input: Option<&Path>) -> Result<HookEvent> {
    let text = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            let _ = tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            buf
        }
    };
    HookEvent::from_json(&text).context("malformed event")
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value).context("failed to encode output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write stdout")?;
    Ok(())
}
