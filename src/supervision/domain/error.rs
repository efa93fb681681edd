//! Error types for service supervision domain validation.

use thiserror::Error;

/// Errors returned while constructing supervision domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SupervisionDomainError {
    /// The service name is empty after trimming.
    #[error("service name must not be empty")]
    EmptyServiceName,

    /// The service name contains characters outside `[A-Za-z0-9_.-]`.
    #[error(
        "service name '{0}' contains invalid characters (only alphanumeric, '-', '_' and '.' allowed)"
    )]
    InvalidServiceName(String),

    /// The service name exceeds the 64-character limit.
    #[error("service name exceeds 64 character limit: {0}")]
    ServiceNameTooLong(String),

    /// The executable path is empty after trimming.
    #[error("service executable must not be empty")]
    EmptyExecutable,

    /// A health-check timeout of zero would fail every service immediately.
    #[error("health-check timeout for service '{0}' must be greater than zero")]
    ZeroHealthTimeout(String),
}
