//! Shared process and port fixtures for integration tests.

use eyre::{Result, WrapErr, eyre};
use foreman::supervision::domain::{ServiceCommand, ServiceName, ServiceSpec};
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

/// Shell loop that records `start:<name>` and, on `SIGTERM`, `stop:<name>`
/// into the log file passed as `$0`.
const LOGGED_SERVICE_SCRIPT: &str = r#"echo "start:$1" >> "$0"; trap 'echo "stop:$1" >> "$0"; exit 0' TERM; while true; do sleep 0.1; done"#;

/// Builds a spec for a long-running shell service that logs its lifecycle.
pub fn logged_service(name: &str, log: &Path, port: Option<u16>) -> Result<ServiceSpec> {
    let log_path = log
        .to_str()
        .ok_or_else(|| eyre!("log path is not valid UTF-8"))?;
    let command = ServiceCommand::new("sh")
        .wrap_err("build shell command")?
        .with_args(["-c", LOGGED_SERVICE_SCRIPT, log_path, name]);
    let spec = ServiceSpec::new(ServiceName::new(name).wrap_err("service name")?, command)
        .with_port(port.unwrap_or_default())
        .with_health_timeout(Duration::from_millis(500))
        .wrap_err("health timeout")?
        .with_grace_period(Duration::from_secs(2));
    Ok(spec)
}

/// Builds a spec whose process exits immediately.
pub fn short_lived_service(name: &str) -> Result<ServiceSpec> {
    let command = ServiceCommand::new("true").wrap_err("build command")?;
    Ok(ServiceSpec::new(
        ServiceName::new(name).wrap_err("service name")?,
        command,
    ))
}

/// Binds a loopback listener standing in for a healthy service port.
pub fn open_port() -> Result<(TcpListener, u16)> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).wrap_err("bind listener")?;
    let port = listener.local_addr().wrap_err("listener address")?.port();
    Ok((listener, port))
}

/// Returns a loopback port that nothing is listening on.
pub fn closed_port() -> Result<u16> {
    let (listener, port) = open_port()?;
    drop(listener);
    Ok(port)
}

/// Reads the lifecycle log, one entry per line.
pub fn read_log(log: &Path) -> Result<Vec<String>> {
    if !log.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(log).wrap_err("read lifecycle log")?;
    Ok(contents.lines().map(str::to_owned).collect())
}

/// Returns the log entries with the given prefix, in order.
pub fn entries_with_prefix(log: &[String], prefix: &str) -> Vec<String> {
    log.iter()
        .filter(|line| line.starts_with(prefix))
        .cloned()
        .collect()
}
