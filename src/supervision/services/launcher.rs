//! Ordered, health-checked service startup with rollback on failure.

use super::{
    health::DEFAULT_PROBE_INTERVAL,
    health::wait_for_port,
    set::{Admission, ServiceSet},
};
use crate::supervision::{
    adapters::SpawnError,
    domain::{ServiceName, ServiceSpec},
    ports::{HealthCheckError, PortProbe},
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned when a set of services cannot be started.
#[derive(Debug, Error)]
pub enum StartError {
    /// A service process could not be spawned.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// A service was spawned but did not become healthy in time.
    #[error("service {service} ({command}) failed its health check: {source}")]
    Unhealthy {
        /// Service that failed.
        service: ServiceName,
        /// Rendered command line.
        command: String,
        /// Health-check failure.
        #[source]
        source: HealthCheckError,
    },

    /// Shutdown began while services were still starting.
    #[error("startup of service {service} ({command}) was cancelled by shutdown")]
    Cancelled {
        /// Service that was starting, or about to start.
        service: ServiceName,
        /// Rendered command line.
        command: String,
    },
}

impl StartError {
    /// Returns the name of the service that failed.
    #[must_use]
    pub const fn service_name(&self) -> &ServiceName {
        match self {
            Self::Spawn(err) => &err.service,
            Self::Unhealthy { service, .. } | Self::Cancelled { service, .. } => service,
        }
    }

    /// Returns the command line of the service that failed.
    #[must_use]
    pub fn command_line(&self) -> &str {
        match self {
            Self::Spawn(err) => &err.command,
            Self::Unhealthy { command, .. } | Self::Cancelled { command, .. } => command,
        }
    }
}

/// Starts services one at a time, health-checking each before the next.
#[derive(Clone)]
pub struct ServiceLauncher<P, C>
where
    P: PortProbe,
    C: Clock + Send + Sync,
{
    probe: Arc<P>,
    clock: Arc<C>,
    probe_interval: Duration,
}

impl<P, C> ServiceLauncher<P, C>
where
    P: PortProbe,
    C: Clock + Send + Sync,
{
    /// Creates a launcher polling ports every [`DEFAULT_PROBE_INTERVAL`].
    #[must_use]
    pub const fn new(probe: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            probe,
            clock,
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    /// Sets the pause between health probes.
    ///
    /// For services without a port this is also how long a process must
    /// stay alive after spawning to count as healthy.
    #[must_use]
    pub const fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Starts `specs` in order and returns the resulting set.
    ///
    /// An empty `specs` yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`StartError`] naming the failing service after every service
    /// already started has been stopped again.
    pub async fn start_all(
        &self,
        specs: &[ServiceSpec],
        dry_run: bool,
    ) -> Result<ServiceSet, StartError> {
        let services = ServiceSet::new();
        self.start_all_into(&services, specs, dry_run).await?;
        Ok(services)
    }

    /// Starts `specs` in order, appending each to `services` as it spawns.
    ///
    /// Filling a caller-owned set lets a shutdown path that already holds a
    /// clone of `services` stop whatever has started so far. Once that
    /// happens the set is closed and startup stops spawning.
    ///
    /// # Errors
    ///
    /// Returns [`StartError::Cancelled`] when `services` is stopped during
    /// startup. Otherwise returns [`StartError`] naming the failing service
    /// after every service in `services` has been stopped and removed.
    pub async fn start_all_into(
        &self,
        services: &ServiceSet,
        specs: &[ServiceSpec],
        dry_run: bool,
    ) -> Result<(), StartError> {
        for spec in specs {
            let simulated = match services.start_service(spec, dry_run, &*self.clock) {
                Ok(Admission::Started { simulated }) => simulated,
                Ok(Admission::Closed) => return Err(cancelled(spec)),
                Err(err) => {
                    self.roll_back(services, spec.name()).await;
                    return Err(err.into());
                }
            };
            if simulated {
                continue;
            }

            let health = tokio::select! {
                result = self.wait_for_health(services, spec) => result,
                () = services.closed() => return Err(cancelled(spec)),
            };
            if let Err(source) = health {
                if services.is_closed() {
                    return Err(cancelled(spec));
                }
                self.roll_back(services, spec.name()).await;
                return Err(StartError::Unhealthy {
                    service: spec.name().clone(),
                    command: spec.command().command_line(),
                    source,
                });
            }
        }
        Ok(())
    }

    async fn wait_for_health(
        &self,
        services: &ServiceSet,
        spec: &ServiceSpec,
    ) -> Result<(), HealthCheckError> {
        let timeout = spec.health_timeout();
        if let Some(port) = spec.port() {
            info!(service = %spec.name(), port, ?timeout, "waiting for service port");
            wait_for_port(&*self.probe, port, timeout, self.probe_interval).await?;
        } else {
            tokio::time::sleep(self.probe_interval.min(timeout)).await;
            if !services.is_running(spec.name()) {
                return Err(HealthCheckError::NotRunning {
                    service: spec.name().clone(),
                });
            }
        }
        info!(service = %spec.name(), "service is healthy");
        Ok(())
    }

    async fn roll_back(&self, services: &ServiceSet, failed: &ServiceName) {
        warn!(service = %failed, started = services.len(), "startup failed; stopping started services");
        let report = services.stop_all(&*self.clock).await;
        for entry in report.failures() {
            warn!(service = %entry.name(), "service could not be stopped during rollback");
        }
    }
}

fn cancelled(spec: &ServiceSpec) -> StartError {
    warn!(service = %spec.name(), "shutdown began during startup; not starting further services");
    StartError::Cancelled {
        service: spec.name().clone(),
        command: spec.command().command_line(),
    }
}
