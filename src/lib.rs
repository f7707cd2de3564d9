//! Ark Reconciler - Agent resource reconciliation and validation
//!
//! Turns a declared Agent spec into a validated, resolved snapshot
//! with a consistent status and a projected set of annotations.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, diagnostics and port traits
//! - **Service Layer** (`services`): The reconciliation pipeline and agent operations
//! - **Adapters** (`adapters`): In-memory implementations of the ports
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ark_reconciler::{AgentReconciler, AgentSpec, Config, InMemoryResourceStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(InMemoryResourceStore::new());
//!     let reconciler = AgentReconciler::new(store, &Config::default());
//!     let agent = reconciler.reconcile(&AgentSpec::new("default", "a1")).await;
//!     println!("{}", agent.phase());
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::memory::{InMemoryAgentRepository, InMemoryResourceStore};
pub use domain::models::{
    AgentCreateRequest, AgentDetailResponse, AgentListResponse, AgentPhase, AgentResponse,
    AgentSpec, AgentUpdateRequest, Config, Diagnostic, ReconcileOutcome, ReconciledAgent,
};
pub use domain::ports::{AgentRepository, ResourceStore};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{AgentReconciler, AgentService};
