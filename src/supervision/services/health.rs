//! Bounded polling of a [`PortProbe`] until a service accepts connections.

use crate::supervision::ports::{HealthCheckError, PortProbe};
use std::time::Duration;

/// Default pause between port probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// Probes `port` every `interval` until it accepts a connection.
///
/// The whole wait, including an in-flight probe, is bounded by `timeout`.
///
/// # Errors
///
/// Returns [`HealthCheckError::PortTimeout`] when `timeout` elapses first.
pub async fn wait_for_port<P>(
    probe: &P,
    port: u16,
    timeout: Duration,
    interval: Duration,
) -> Result<(), HealthCheckError>
where
    P: PortProbe + ?Sized,
{
    let polling = async {
        while !probe.probe(port).await {
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(timeout, polling)
        .await
        .map_err(|_elapsed| HealthCheckError::PortTimeout { port, timeout })
}
