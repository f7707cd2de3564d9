//! In-memory adapters, used by the CLI fixtures and the tests.

pub mod agent_repository;
pub mod resource_store;

pub use agent_repository::InMemoryAgentRepository;
pub use resource_store::InMemoryResourceStore;
