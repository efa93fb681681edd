//! Last-in-first-out registry of teardown actions that drains exactly once.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

/// Boxed error returned by a failing cleanup action.
pub type CleanupError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by cleanup actions.
pub type CleanupResult = Result<(), CleanupError>;

type BoxedFuture = Pin<Box<dyn Future<Output = CleanupResult> + Send>>;

enum CleanupAction {
    Blocking(Box<dyn FnOnce() -> CleanupResult + Send>),
    Async(Box<dyn FnOnce() -> BoxedFuture + Send>),
}

struct RegisteredAction {
    label: String,
    action: CleanupAction,
}

impl fmt::Debug for RegisteredAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegisteredAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A cleanup action that did not complete successfully.
#[derive(Debug, Error)]
pub enum CleanupFailure {
    /// The action returned an error.
    #[error("cleanup action '{label}' failed: {source}")]
    Failed {
        /// Label given at registration.
        label: String,
        /// Error returned by the action.
        #[source]
        source: CleanupError,
    },

    /// The action panicked or was cancelled.
    #[error("cleanup action '{label}' panicked: {message}")]
    Panicked {
        /// Label given at registration.
        label: String,
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// Summary of one drain pass.
#[derive(Debug, Default)]
pub struct DrainReport {
    executed: usize,
    failures: Vec<CleanupFailure>,
}

impl DrainReport {
    /// Returns how many actions ran, including failed ones.
    #[must_use]
    pub const fn executed(&self) -> usize {
        self.executed
    }

    /// Returns the actions that failed or panicked.
    #[must_use]
    pub fn failures(&self) -> &[CleanupFailure] {
        &self.failures
    }

    /// Returns whether every action that ran succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    actions: Mutex<Vec<RegisteredAction>>,
    drain_gate: tokio::sync::Mutex<()>,
}

/// Process-wide stack of teardown actions.
///
/// Clones share the same stack. Actions run in reverse registration order,
/// each on its own Tokio task so that a panic in one does not prevent the
/// rest from running. Once drained, an action is gone: draining again, from
/// any clone or thread, never runs it a second time.
#[derive(Debug, Clone, Default)]
pub struct CleanupRegistry {
    inner: Arc<RegistryInner>,
}

impl CleanupRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a synchronous action.
    ///
    /// The action runs on the blocking thread pool during [`Self::drain`].
    pub fn register<F>(&self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> CleanupResult + Send + 'static,
    {
        self.push(label.into(), CleanupAction::Blocking(Box::new(action)));
    }

    /// Registers an asynchronous action.
    pub fn register_async<F, Fut>(&self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CleanupResult> + Send + 'static,
    {
        let boxed = move || -> BoxedFuture { Box::pin(action()) };
        self.push(label.into(), CleanupAction::Async(Box::new(boxed)));
    }

    /// Returns the number of actions waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_actions().len()
    }

    /// Returns whether no actions are waiting to run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_actions().is_empty()
    }

    /// Runs every registered action once, last registered first.
    ///
    /// The stack is emptied before any action runs. A drain that starts
    /// while another is in flight waits for it to finish and then finds
    /// nothing left to run. Failures and panics are logged and reported,
    /// never propagated.
    pub async fn drain(&self) -> DrainReport {
        let _gate = self.inner.drain_gate.lock().await;
        let actions = std::mem::take(&mut *self.lock_actions());
        if actions.is_empty() {
            return DrainReport::default();
        }

        info!(count = actions.len(), "running cleanup actions");
        let mut report = DrainReport::default();
        for RegisteredAction { label, action } in actions.into_iter().rev() {
            report.executed += 1;
            match run_isolated(action).await {
                Ok(Ok(())) => debug!(action = %label, "cleanup action completed"),
                Ok(Err(source)) => {
                    warn!(action = %label, error = %source, "cleanup action failed");
                    report.failures.push(CleanupFailure::Failed { label, source });
                }
                Err(join_error) => {
                    let message = describe_join_error(join_error);
                    error!(action = %label, %message, "cleanup action panicked");
                    report
                        .failures
                        .push(CleanupFailure::Panicked { label, message });
                }
            }
        }
        report
    }

    /// Awaits `future`, then drains the registry before returning its
    /// output.
    pub async fn run_then_drain<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        let output = future.await;
        let report = self.drain().await;
        if !report.is_clean() {
            warn!(
                failures = report.failures().len(),
                "cleanup finished with failures"
            );
        }
        output
    }

    fn push(&self, label: String, action: CleanupAction) {
        debug!(action = %label, "registered cleanup action");
        self.lock_actions().push(RegisteredAction { label, action });
    }

    fn lock_actions(&self) -> MutexGuard<'_, Vec<RegisteredAction>> {
        self.inner
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_isolated(action: CleanupAction) -> Result<CleanupResult, JoinError> {
    match action {
        CleanupAction::Blocking(run) => tokio::task::spawn_blocking(run).await,
        CleanupAction::Async(run) => tokio::spawn(async move { run().await }).await,
    }
}

fn describe_join_error(join_error: JoinError) -> String {
    if !join_error.is_panic() {
        return join_error.to_string();
    }
    panic_message(join_error.into_panic().as_ref())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
