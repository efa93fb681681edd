//! Auxiliary service supervision for Foreman.
//!
//! Starts the helper processes a development run depends on (databases,
//! API stubs, queue workers), health-checks each before starting the next,
//! and tears them down in reverse order with a bounded grace period before
//! escalating to a forced kill. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
