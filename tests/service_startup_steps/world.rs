//! Shared world state for service startup BDD scenarios.

use foreman::supervision::adapters::TcpPortProbe;
use foreman::supervision::domain::ServiceSpec;
use foreman::supervision::services::{ServiceLauncher, ServiceSet, ShutdownReport, StartError};
use mockable::DefaultClock;
use rstest::fixture;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Launcher type used by the BDD world.
pub type TestLauncher = ServiceLauncher<TcpPortProbe, DefaultClock>;

/// Scenario world for service startup behaviour tests.
pub struct StartupWorld {
    pub launcher: TestLauncher,
    pub services: ServiceSet,
    pub specs: Vec<ServiceSpec>,
    pub listeners: Vec<TcpListener>,
    pub dry_run: bool,
    pub start_result: Option<Result<(), StartError>>,
    pub started_pids: Vec<u32>,
    pub shutdown: Option<ShutdownReport>,
    pub log_dir: TempDir,
}

impl StartupWorld {
    /// Creates a world with a fresh lifecycle log directory.
    ///
    /// # Panics
    ///
    /// Panics when the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let launcher =
            ServiceLauncher::new(Arc::new(TcpPortProbe::default()), Arc::new(DefaultClock))
                .with_probe_interval(Duration::from_millis(200));
        Self {
            launcher,
            services: ServiceSet::new(),
            specs: Vec::new(),
            listeners: Vec::new(),
            dry_run: false,
            start_result: None,
            started_pids: Vec::new(),
            shutdown: None,
            log_dir: TempDir::new().expect("create lifecycle log directory"),
        }
    }

    /// Returns the shared lifecycle log path.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.path().join("lifecycle.log")
    }
}

impl Default for StartupWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> StartupWorld {
    StartupWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
