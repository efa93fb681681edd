//! Liveness probe port for services that expose a TCP port.

use crate::supervision::domain::ServiceName;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Probes whether a local TCP port accepts connections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// Returns `true` when a connection to `localhost:port` succeeds.
    ///
    /// Any connection failure, including refusal and timeout, is reported as
    /// `false`.
    async fn probe(&self, port: u16) -> bool;
}

/// Errors returned when a service fails its health check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HealthCheckError {
    /// The port did not accept a connection before the budget ran out.
    #[error("port {port} did not accept connections within {timeout:?}")]
    PortTimeout {
        /// Probed port.
        port: u16,
        /// Health-check budget that elapsed.
        timeout: Duration,
    },

    /// The process exited before it could be considered healthy.
    #[error("service {service} exited before becoming healthy")]
    NotRunning {
        /// Service that exited.
        service: ServiceName,
    },
}
