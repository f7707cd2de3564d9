//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - ResourceStore: read access to models, engines, ConfigMaps, Secrets and tools
//! - AgentRepository: persistence of agents and their reconciled snapshots

pub mod agent_repository;
pub mod resource_store;

pub use agent_repository::{AgentRecord, AgentRepository};
pub use resource_store::ResourceStore;
