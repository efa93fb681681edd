//! Deferred teardown for a whole orchestrator run.
//!
//! Subsystems register a cleanup action as they acquire a resource: started
//! services, a switched branch, a temporary worktree. The registry runs the
//! actions in reverse order exactly once, either from the normal exit path
//! or from the [`SignalBridge`] when the process is interrupted.

mod registry;
mod signal;

pub use registry::{CleanupError, CleanupFailure, CleanupRegistry, CleanupResult, DrainReport};
pub use signal::{SIGNAL_EXIT_CODE, ShutdownSignal, SignalBridge};
