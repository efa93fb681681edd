//! Adapter implementations for service supervision.

mod probe;
mod process;

pub use probe::{DEFAULT_CONNECT_TIMEOUT, TcpPortProbe};
pub use process::{ProcessHandle, SpawnError, StopError};
