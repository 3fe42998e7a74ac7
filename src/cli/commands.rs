//! CLI command implementations
//!
//! `init` and `check` are one-shot. `run` boots the engine, starts the
//! background sweeper and then serves one JSON request per stdin line until
//! EOF, when the sweeper is stopped before returning.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::engine::{ApplyOutcome, Engine, SystemClock};
use crate::model::{ConsistencyState, Operation, ReplicaKey};
use crate::observability::Event;
use crate::registry::{CoherenceError, RegistrySnapshot};
use crate::sweeper::StalenessSweeper;
use crate::topology::{ecommerce, TopologyConfig};
use crate::transition::TransitionRecord;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_response};

/// Parse args, install logging and run the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(&cli.log_level)?;
    run_command(cli.command)
}

/// Install the stderr subscriber; stdout carries responses only.
pub fn init_logging(level: &str) -> CliResult<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| CliError::boot_failed(format!("Invalid log level '{}': {}", level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| CliError::boot_failed(format!("Failed to install logger: {}", e)))
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { topology } => init(&topology),
        Command::Check { topology } => check(&topology),
        Command::Run {
            topology,
            sweep_interval_ms,
        } => start(&topology, sweep_interval_ms),
    }
}

/// Write the built-in e-commerce topology to `path`.
///
/// Never overwrites an existing file.
pub fn init(path: &Path) -> CliResult<()> {
    if path.exists() {
        return Err(CliError::already_exists(path.display()));
    }

    let json = ecommerce().to_json()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;

    info!(event = Event::TopologyLoaded.as_str(), path = %path.display(), "wrote e-commerce topology");
    Ok(())
}

/// Validate a topology and print its bootstrap snapshot.
pub fn check(path: &Path) -> CliResult<()> {
    let engine = boot(path)?;
    let mut stdout = io::stdout().lock();
    write_response(&mut stdout, &engine.snapshot())
}

/// Boot, serve stdin, shut down on EOF.
pub fn start(path: &Path, sweep_interval_ms: Option<u64>) -> CliResult<()> {
    let config = load_topology(path)?;
    let period = match sweep_interval_ms {
        Some(0) => return Err(CliError::config_error("sweep interval must be > 0")),
        Some(ms) => Duration::from_millis(ms),
        None => config.sweep_interval(),
    };
    let engine = Arc::new(Engine::bootstrap(&config, Arc::new(SystemClock))?);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;
    let sweeper = StalenessSweeper::new(Arc::clone(&engine), period).spawn_on(rt.handle());

    let served = serve(&engine, io::stdin().lock(), &mut io::stdout().lock());

    info!(event = Event::ShutdownStart.as_str(), "stdin closed; stopping sweeper");
    let passes = rt.block_on(sweeper.stop());
    info!(event = Event::ShutdownComplete.as_str(), passes, "shutdown complete");

    served
}

fn load_topology(path: &Path) -> CliResult<TopologyConfig> {
    let config = TopologyConfig::load(path)
        .map_err(|e| CliError::config_error(format!("{}: {} ({})", path.display(), e, e.code())))?;
    info!(
        event = Event::TopologyLoaded.as_str(),
        path = %path.display(),
        replicas = config.replicas.len(),
        "topology loaded"
    );
    Ok(config)
}

fn boot(path: &Path) -> CliResult<Engine> {
    let config = load_topology(path)?;
    Ok(Engine::bootstrap(&config, Arc::new(SystemClock))?)
}

// =============================================================================
// REQUEST LOOP
// =============================================================================

/// One request line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Apply {
        service: String,
        component: String,
        operation: Operation,
        #[serde(default)]
        is_source: bool,
        /// Expected resulting state; reported, never enforced.
        #[serde(default)]
        expect: Option<ConsistencyState>,
    },
    Sweep,
    Resolve {
        component: String,
    },
    Snapshot,
    History {
        #[serde(default)]
        drain: bool,
    },
    Metrics,
    Model {
        id: String,
    },
}

/// Expected vs. actual state of an `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Expectation {
    pub expected: ConsistencyState,
    pub actual: ConsistencyState,
    pub matched: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl From<CoherenceError> for ErrorBody {
    fn from(e: CoherenceError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApplyResponse {
    state: ConsistencyState,
    version: u64,
    transitions: Vec<TransitionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unresolved_source: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expectation: Option<Expectation>,
}

impl ApplyResponse {
    fn new(outcome: ApplyOutcome, expect: Option<ConsistencyState>) -> Self {
        let expectation = expect.map(|expected| Expectation {
            expected,
            actual: outcome.state,
            matched: expected == outcome.state,
        });
        Self {
            state: outcome.state,
            version: outcome.version,
            transitions: outcome.transitions,
            unresolved_source: outcome.unresolved_source.map(ErrorBody::from),
            expectation,
        }
    }
}

/// Serve requests from `reader` until EOF.
///
/// Malformed lines and engine rejections produce an error response and the
/// loop continues; only a broken stdin/stdout ends it early.
pub fn serve<R: BufRead, W: Write>(engine: &Engine, reader: R, out: &mut W) -> CliResult<()> {
    for line in read_requests(reader) {
        let line = line?;
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                let err = CliError::invalid_request(format!("Invalid request: {}", e));
                warn!(code = err.code_str(), "rejected request line");
                write_error(out, err.code_str(), err.message())?;
                continue;
            }
        };

        match handle_request(engine, request) {
            Ok(data) => write_response(out, &data)?,
            Err(err) => {
                warn!(code = err.code_str(), "request failed");
                write_error(out, err.code_str(), err.message())?;
            }
        }
    }
    Ok(())
}

/// Execute one request against `engine`.
///
/// Engine rejections come back as `EngineError` carrying the engine's own
/// code in the message.
pub fn handle_request(engine: &Engine, request: Request) -> CliResult<Value> {
    let data = match request {
        Request::Apply {
            service,
            component,
            operation,
            is_source,
            expect,
        } => {
            let outcome = engine.apply(&service, &component, operation, is_source)?;
            to_value(&ApplyResponse::new(outcome, expect))?
        }
        Request::Sweep => to_value(&engine.sweep_now())?,
        Request::Resolve { component } => {
            let source: ReplicaKey = engine.resolve(&component)?;
            json!({ "component": component, "source": source })
        }
        Request::Snapshot => to_value(&engine.snapshot())?,
        Request::History { drain } => {
            let records = if drain {
                engine.drain_history()
            } else {
                engine.history()
            };
            to_value(&records)?
        }
        Request::Metrics => to_value(&engine.metrics())?,
        Request::Model { id } => {
            let view: RegistrySnapshot = engine.operation_model_view(&id).ok_or_else(|| {
                CliError::invalid_request(format!("Unknown operation model: {}", id))
            })?;
            to_value(&view)?
        }
    };
    Ok(data)
}

fn to_value<T: Serialize>(data: &T) -> CliResult<Value> {
    Ok(serde_json::to_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliErrorCode;
    use crate::engine::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;

    fn engine() -> Engine {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        Engine::bootstrap(&ecommerce(), clock).unwrap()
    }

    fn responses(input: &str) -> Vec<Value> {
        let engine = engine();
        let mut out = Vec::new();
        serve(&engine, Cursor::new(input.to_string()), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_apply_with_expectation() {
        let out = responses(
            r#"{"op":"apply","service":"OrderService","component":"OrderModel","operation":"update","is_source":true,"expect":"m"}"#,
        );

        assert_eq!(out[0]["status"], "ok");
        assert_eq!(out[0]["data"]["state"], "modified");
        assert_eq!(out[0]["data"]["version"], 1);
        assert_eq!(out[0]["data"]["expectation"]["matched"], true);
    }

    #[test]
    fn test_mismatch_reported_not_patched() {
        let out = responses(
            r#"{"op":"apply","service":"OrderService","component":"InventoryModel","operation":"read","expect":"s+"}"#,
        );

        assert_eq!(out[0]["data"]["state"], "shared_minus");
        assert_eq!(out[0]["data"]["expectation"]["matched"], false);
    }

    #[test]
    fn test_handle_request_errors_are_cli_errors() {
        let engine = engine();

        let err = handle_request(
            &engine,
            Request::Resolve {
                component: "ShippingModel".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), CliErrorCode::EngineError);
        assert!(err.message().contains("MEGAMODEL_"));

        let err = handle_request(&engine, Request::Model { id: "gom9".into() }).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::InvalidRequest);
    }

    #[test]
    fn test_errors_do_not_stop_loop() {
        let out = responses(concat!(
            "not json\n",
            r#"{"op":"apply","service":"ShippingService","component":"OrderModel","operation":"update"}"#,
            "\n",
            r#"{"op":"model","id":"gom9"}"#,
            "\n",
            r#"{"op":"resolve","component":"InventoryModel"}"#,
            "\n",
        ));

        assert_eq!(out.len(), 4);
        assert_eq!(out[0]["code"], "MEGAMODEL_CLI_INVALID_REQUEST");
        assert_eq!(out[1]["code"], "MEGAMODEL_CLI_ENGINE_ERROR");
        assert!(out[1]["message"]
            .as_str()
            .unwrap()
            .contains("MEGAMODEL_UNKNOWN_REPLICA"));
        assert_eq!(out[2]["code"], "MEGAMODEL_CLI_INVALID_REQUEST");
        assert_eq!(out[3]["data"]["source"]["service"], "InventoryService");
    }

    #[test]
    fn test_history_drain() {
        let out = responses(concat!(
            r#"{"op":"apply","service":"PaymentService","component":"PaymentModel","operation":"update","is_source":true}"#,
            "\n",
            r#"{"op":"history","drain":true}"#,
            "\n",
            r#"{"op":"history"}"#,
            "\n",
        ));

        assert_eq!(out[1]["data"].as_array().unwrap().len(), 1);
        assert!(out[2]["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.json");

        init(&path).unwrap();
        let loaded = TopologyConfig::load(&path).unwrap();
        assert_eq!(loaded, ecommerce());

        let err = init(&path).unwrap_err();
        assert_eq!(err.code_str(), "MEGAMODEL_CLI_ALREADY_EXISTS");
    }
}
