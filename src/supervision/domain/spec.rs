//! Immutable description of one auxiliary service process.

use super::{ServiceCommand, ServiceName, SupervisionDomainError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default budget for a service to become healthy.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default window between the graceful signal and a forced kill.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

const fn default_health_timeout_secs() -> u64 {
    DEFAULT_HEALTH_TIMEOUT.as_secs()
}

const fn default_grace_period_secs() -> u64 {
    DEFAULT_GRACE_PERIOD.as_secs()
}

/// Serialized form of a [`ServiceSpec`] as it appears in configuration.
///
/// A `port` of zero means the service is health-checked by liveness only.
/// A `*_millis` budget, when present, replaces its `*_secs` counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSpecDocument {
    /// Unique service name.
    pub name: String,
    /// Executable path.
    pub command: String,
    /// Command-line arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// TCP port probed for health, or zero.
    #[serde(default)]
    pub port: u16,
    /// Health-check budget in seconds.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    /// Graceful shutdown window in seconds.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
    /// Health-check budget in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_timeout_millis: Option<u64>,
    /// Graceful shutdown window in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_millis: Option<u64>,
}

fn budget(secs: u64, millis: Option<u64>) -> Duration {
    millis.map_or_else(|| Duration::from_secs(secs), Duration::from_millis)
}

fn sub_second_millis(duration: Duration) -> Option<u64> {
    (duration.subsec_nanos() != 0)
        .then(|| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Immutable description of one auxiliary service process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ServiceSpecDocument", into = "ServiceSpecDocument")]
pub struct ServiceSpec {
    name: ServiceName,
    command: ServiceCommand,
    port: Option<u16>,
    health_timeout: Duration,
    grace_period: Duration,
}

impl ServiceSpec {
    /// Creates a spec with no health port and default timeouts.
    #[must_use]
    pub const fn new(name: ServiceName, command: ServiceCommand) -> Self {
        Self {
            name,
            command,
            port: None,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Sets the TCP port used for health checks. Zero clears it.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = if port == 0 { None } else { Some(port) };
        self
    }

    /// Sets the health-check budget.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisionDomainError::ZeroHealthTimeout`] for a zero
    /// duration.
    pub fn with_health_timeout(mut self, timeout: Duration) -> Result<Self, SupervisionDomainError> {
        if timeout.is_zero() {
            return Err(SupervisionDomainError::ZeroHealthTimeout(
                self.name.as_str().to_owned(),
            ));
        }
        self.health_timeout = timeout;
        Ok(self)
    }

    /// Sets the graceful shutdown window. Zero escalates immediately.
    #[must_use]
    pub const fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Returns the service name.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Returns the command to spawn.
    #[must_use]
    pub const fn command(&self) -> &ServiceCommand {
        &self.command
    }

    /// Returns the health-check port, if any.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the health-check budget.
    #[must_use]
    pub const fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    /// Returns the graceful shutdown window.
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        self.grace_period
    }
}

impl TryFrom<ServiceSpecDocument> for ServiceSpec {
    type Error = SupervisionDomainError;

    fn try_from(document: ServiceSpecDocument) -> Result<Self, Self::Error> {
        let name = ServiceName::new(document.name)?;
        let command = ServiceCommand::new(document.command)?.with_args(document.args);
        Self::new(name, command)
            .with_port(document.port)
            .with_grace_period(budget(
                document.grace_period_secs,
                document.grace_period_millis,
            ))
            .with_health_timeout(budget(
                document.health_timeout_secs,
                document.health_timeout_millis,
            ))
    }
}

impl From<ServiceSpec> for ServiceSpecDocument {
    fn from(spec: ServiceSpec) -> Self {
        Self {
            name: spec.name.into(),
            command: spec.command.executable().to_owned(),
            args: spec.command.args().to_vec(),
            port: spec.port.unwrap_or_default(),
            health_timeout_secs: spec.health_timeout.as_secs(),
            grace_period_secs: spec.grace_period.as_secs(),
            health_timeout_millis: sub_second_millis(spec.health_timeout),
            grace_period_millis: sub_second_millis(spec.grace_period),
        }
    }
}
