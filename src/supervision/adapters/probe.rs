//! TCP connect adapter for the [`PortProbe`] port.

use crate::supervision::ports::PortProbe;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

/// Default bound on a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(250);

/// Probes ports by opening a short-lived TCP connection to `localhost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpPortProbe {
    connect_timeout: Duration,
}

impl TcpPortProbe {
    /// Creates a probe that abandons each attempt after `connect_timeout`.
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Returns the per-attempt connection bound.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for TcpPortProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn probe(&self, port: u16) -> bool {
        let attempt = TcpStream::connect(("localhost", port));
        matches!(
            tokio::time::timeout(self.connect_timeout, attempt).await,
            Ok(Ok(_))
        )
    }
}
