//! Reverse-order, best-effort shutdown of started services.

use crate::supervision::{
    adapters::{ProcessHandle, StopError},
    domain::ServiceName,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

/// Outcome of stopping one service.
#[derive(Debug)]
pub struct StoppedService {
    name: ServiceName,
    outcome: Result<(), StopError>,
    stopped_at: DateTime<Utc>,
}

impl StoppedService {
    /// Returns the service name.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Returns the stop failure, if the service did not stop cleanly.
    #[must_use]
    pub const fn error(&self) -> Option<&StopError> {
        match &self.outcome {
            Ok(()) => None,
            Err(err) => Some(err),
        }
    }

    /// Returns when the stop attempt finished.
    #[must_use]
    pub const fn stopped_at(&self) -> DateTime<Utc> {
        self.stopped_at
    }
}

/// Per-service outcomes of one shutdown pass, in stop order.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    stopped: Vec<StoppedService>,
}

impl ShutdownReport {
    /// Returns every outcome in the order services were stopped.
    #[must_use]
    pub fn entries(&self) -> &[StoppedService] {
        &self.stopped
    }

    /// Returns service names in the order they were stopped.
    #[must_use]
    pub fn stop_order(&self) -> Vec<&ServiceName> {
        self.stopped.iter().map(StoppedService::name).collect()
    }

    /// Returns the services that did not stop cleanly.
    pub fn failures(&self) -> impl Iterator<Item = &StoppedService> {
        self.stopped.iter().filter(|entry| entry.error().is_some())
    }

    /// Returns whether every service stopped cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Returns whether no services were stopped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stopped.is_empty()
    }
}

/// Stops `handles` last-started first, each within its own grace period.
///
/// Failures are logged and recorded in the report; they never stop the
/// remaining services from being stopped.
pub async fn stop_all<C>(handles: Vec<ProcessHandle>, clock: &C) -> ShutdownReport
where
    C: Clock + Sync + ?Sized,
{
    let mut report = ShutdownReport::default();
    for mut handle in handles.into_iter().rev() {
        let grace = handle.spec().grace_period();
        info!(service = %handle.name(), ?grace, "stopping service");

        let outcome = handle.stop(grace).await;
        if let Err(err) = &outcome {
            warn!(service = %handle.name(), error = %err, "service did not stop cleanly");
        }

        report.stopped.push(StoppedService {
            name: handle.name().clone(),
            outcome,
            stopped_at: clock.utc(),
        });
    }
    report
}
