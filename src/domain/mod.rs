//! Domain layer for the agent reconciler
//!
//! Models, diagnostics and the port traits adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
