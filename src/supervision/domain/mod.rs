//! Domain model for supervised auxiliary services.
//!
//! The supervision domain models service identity, the command used to spawn
//! a service, and the health and shutdown budgets attached to it. Process
//! handling and network probing remain outside this boundary.

mod command;
mod error;
mod ids;
mod spec;

pub use command::{ServiceCommand, shell_escape};
pub use error::SupervisionDomainError;
pub use ids::ServiceName;
pub use spec::{DEFAULT_GRACE_PERIOD, DEFAULT_HEALTH_TIMEOUT, ServiceSpec, ServiceSpecDocument};
