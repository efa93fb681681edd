//! Application services for starting and stopping supervised services.

mod health;
mod launcher;
mod set;
mod shutdown;

pub use health::{DEFAULT_PROBE_INTERVAL, wait_for_port};
pub use launcher::{ServiceLauncher, StartError};
pub use set::ServiceSet;
pub use shutdown::{ShutdownReport, StoppedService, stop_all};
