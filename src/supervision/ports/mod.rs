//! Port contracts for service supervision.

mod probe;

#[cfg(test)]
pub(crate) use probe::MockPortProbe;
pub use probe::{HealthCheckError, PortProbe};
