//! Step definitions for service startup behaviour tests.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
