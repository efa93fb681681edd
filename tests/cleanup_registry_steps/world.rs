//! Shared world state for cleanup registry BDD scenarios.

use foreman::cleanup::{CleanupRegistry, DrainReport, ShutdownSignal, SignalBridge};
use rstest::fixture;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Scenario world for cleanup registry behaviour tests.
#[derive(Default)]
pub struct CleanupWorld {
    pub registry: CleanupRegistry,
    pub executions: Arc<Mutex<Vec<String>>>,
    pub registered: Vec<String>,
    pub reports: Vec<DrainReport>,
    pub bridge: Option<SignalBridge>,
    pub signal: Option<oneshot::Sender<ShutdownSignal>>,
    pub exit_code: Option<oneshot::Receiver<i32>>,
}

impl CleanupWorld {
    /// Returns the labels of executed actions in execution order.
    pub fn executed_labels(&self) -> Vec<String> {
        self.executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for CleanupWorld {
    fn drop(&mut self) {
        if let Some(bridge) = self.bridge.take() {
            bridge.abort();
        }
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> CleanupWorld {
    CleanupWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
