//! Bridges operating-system shutdown signals to the cleanup registry.

use super::CleanupRegistry;
use std::fmt;
use std::future::Future;
use std::io;
use tokio::task::JoinHandle;
use tracing::warn;

/// Exit status used after signal-triggered cleanup.
pub const SIGNAL_EXIT_CODE: i32 = 0;

/// Shutdown signal that triggered cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownSignal {
    /// `SIGINT` or Ctrl-C.
    Interrupt,
    /// `SIGTERM`.
    Terminate,
}

impl ShutdownSignal {
    /// Returns the conventional signal name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Background task that drains the registry when a shutdown signal
/// arrives, then exits the process.
///
/// The bridge shares its [`CleanupRegistry`] with the main flow. Whichever
/// of the two drains first runs the actions; the other finds nothing left.
#[derive(Debug)]
pub struct SignalBridge {
    task: JoinHandle<()>,
}

impl SignalBridge {
    /// Listens for `SIGINT` and `SIGTERM` (Ctrl-C elsewhere) and exits with
    /// [`SIGNAL_EXIT_CODE`] after draining `registry`.
    ///
    /// Must be called from within a Tokio runtime, once per process.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when signal handlers cannot be installed.
    pub fn install(registry: CleanupRegistry) -> io::Result<Self> {
        let trigger = shutdown_signal()?;
        Ok(Self::install_with(registry, trigger, |code| {
            std::process::exit(code)
        }))
    }

    /// Drains `registry` once `trigger` resolves, then calls `exit` with
    /// [`SIGNAL_EXIT_CODE`].
    #[must_use]
    pub fn install_with<T, E>(registry: CleanupRegistry, trigger: T, exit: E) -> Self
    where
        T: Future<Output = ShutdownSignal> + Send + 'static,
        E: FnOnce(i32) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let signal = trigger.await;
            warn!(%signal, "shutdown signal received; running cleanup");
            let report = registry.drain().await;
            for failure in report.failures() {
                warn!(error = %failure, "cleanup action failed during signal shutdown");
            }
            exit(SIGNAL_EXIT_CODE);
        });
        Self { task }
    }

    /// Returns whether the bridge has already handled a signal.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops listening for signals.
    pub fn abort(&self) {
        self.task.abort();
    }
}

#[cfg(unix)]
fn shutdown_signal() -> io::Result<impl Future<Output = ShutdownSignal> + Send + 'static> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => ShutdownSignal::Interrupt,
            _ = terminate.recv() => ShutdownSignal::Terminate,
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> io::Result<impl Future<Output = ShutdownSignal> + Send + 'static> {
    Ok(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        ShutdownSignal::Interrupt
    })
}
