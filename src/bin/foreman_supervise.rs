//! Starts configured services, runs a foreground command, and tears the
//! services down again.
//!
//! Usage:
//!
//! ```text
//! foreman_supervise <config-path> [command [args...]]
//! ```
//!
//! Services from the JSON document at `config-path` (see
//! [`foreman::config`]) are started in order and health-checked. The
//! optional command then runs with inherited stdio and its exit code becomes
//! the supervisor's exit code. Without a command the supervisor waits for
//! `SIGINT` or `SIGTERM`. Services are stopped in reverse order on every
//! exit path. Set `FOREMAN_DRY_RUN=1` to log the plan without spawning
//! anything.

use camino::Utf8PathBuf;
use foreman::cleanup::{CleanupRegistry, SignalBridge};
use foreman::config::{ConfigError, SupervisorConfig};
use foreman::supervision::adapters::TcpPortProbe;
use foreman::supervision::services::{ServiceLauncher, ServiceSet, StartError};
use foreman::telemetry::{TelemetryError, init_tracing};
use mockable::DefaultClock;
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio::runtime::Builder;
use tracing::{error, info, warn};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Exit code reported when the foreground command was killed by a signal.
const SIGNALLED_EXIT_CODE: i32 = 1;

/// Errors that end a supervision run.
#[derive(Debug, Error)]
enum SupervisorError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
    #[error(transparent)]
    Start(#[from] StartError),
    #[error("failed to run {command}: {source}")]
    Command {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
struct Invocation {
    config_path: Utf8PathBuf,
    command: Vec<String>,
}

fn main() -> Result<(), BoxError> {
    let invocation = parse_args(collect_args()?.into_iter())?;
    init_tracing().map_err(SupervisorError::from)?;
    let code = run(invocation)?;
    std::process::exit(code);
}

fn collect_args() -> Result<Vec<String>, SupervisorError> {
    env::args_os()
        .map(|arg_os| {
            arg_os
                .into_string()
                .map_err(|_| SupervisorError::InvalidArgs("argument is not valid UTF-8".into()))
        })
        .collect()
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Invocation, SupervisorError> {
    let _program = args.next();
    let config_path = args
        .next()
        .map(Utf8PathBuf::from)
        .ok_or_else(|| SupervisorError::InvalidArgs("missing config path argument".into()))?;
    Ok(Invocation {
        config_path,
        command: args.collect(),
    })
}

fn run(invocation: Invocation) -> Result<i32, SupervisorError> {
    let config = SupervisorConfig::load(&invocation.config_path)?
        .with_env_overrides(|key| env::var(key).ok());
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SupervisorError::RuntimeInit)?;
    runtime.block_on(supervise(config, invocation.command))
}

async fn supervise(config: SupervisorConfig, command: Vec<String>) -> Result<i32, SupervisorError> {
    let clock = Arc::new(DefaultClock);
    let registry = CleanupRegistry::new();
    let _bridge = SignalBridge::install(registry.clone()).map_err(SupervisorError::Signals)?;

    let services = ServiceSet::new();
    let stopping = services.clone();
    let stop_clock = Arc::clone(&clock);
    registry.register_async("stop services", move || async move {
        let report = stopping.stop_all(&*stop_clock).await;
        for entry in report.failures() {
            warn!(service = %entry.name(), "service did not stop cleanly");
        }
        Ok(())
    });

    let probe = Arc::new(TcpPortProbe::new(config.probe_connect_timeout()));
    let launcher =
        ServiceLauncher::new(probe, clock).with_probe_interval(config.probe_interval());
    if config.dry_run() {
        info!(services = config.services().len(), "dry run: services will not be spawned");
    }

    registry
        .run_then_drain(async {
            launcher
                .start_all_into(&services, config.services(), config.dry_run())
                .await?;
            info!(services = services.len(), "all services started");
            run_foreground(&command).await
        })
        .await
}

async fn run_foreground(command: &[String]) -> Result<i32, SupervisorError> {
    let Some((program, args)) = command.split_first() else {
        info!("no command given; waiting for a shutdown signal");
        return std::future::pending().await;
    };

    let rendered = command.join(" ");
    info!(command = %rendered, "running foreground command");
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|source| SupervisorError::Command {
            command: rendered.clone(),
            source,
        })?;
    let code = status.code().unwrap_or_else(|| {
        error!(command = %rendered, %status, "foreground command was terminated");
        SIGNALLED_EXIT_CODE
    });
    info!(command = %rendered, code, "foreground command finished");
    Ok(code)
}
