//! Foreman: service supervision and shutdown coordination.
//!
//! This crate starts the auxiliary processes an orchestrator run depends on
//! (databases, mock servers, workers), health-checks them, and guarantees
//! they are torn down again however the run ends.
//!
//! # Architecture
//!
//! Foreman follows hexagonal architecture principles:
//!
//! - **Domain**: Validated service descriptions with no process handling
//! - **Ports**: Abstract trait interfaces such as the TCP port probe
//! - **Adapters**: Concrete process handles and socket probes
//! - **Services**: Startup sequencing, rollback, and reverse-order shutdown
//!
//! # Modules
//!
//! - [`supervision`]: Launching, health-checking, and stopping services
//! - [`cleanup`]: Exactly-once teardown registry and signal bridge
//! - [`config`]: JSON supervisor configuration
//! - [`telemetry`]: Tracing subscriber setup

pub mod cleanup;
pub mod config;
pub mod supervision;
pub mod telemetry;
