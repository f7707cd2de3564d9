//! Agent repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ReconciledAgent;

/// A stored agent together with its latest reconciled snapshot.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    /// Stable id assigned on create.
    pub uid: Uuid,
    /// Incremented on every spec change.
    pub generation: u64,
    /// Latest reconciled snapshot.
    pub snapshot: ReconciledAgent,
    /// When the agent was created.
    pub created_at: DateTime<Utc>,
    /// When the snapshot last changed.
    pub updated_at: DateTime<Utc>,
}

impl AgentRecord {
    /// Record for a newly created agent.
    pub fn new(snapshot: ReconciledAgent) -> Self {
        let now = Utc::now();
        Self {
            uid: Uuid::new_v4(),
            generation: 1,
            snapshot,
            created_at: now,
            updated_at: now,
        }
    }

    /// Agent name.
    pub fn name(&self) -> &str {
        &self.snapshot.spec.name
    }

    /// Agent namespace.
    pub fn namespace(&self) -> &str {
        &self.snapshot.spec.namespace
    }
}

/// Repository interface for Agent persistence.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Insert a new record. Fails if the agent already exists.
    async fn create(&self, record: &AgentRecord) -> DomainResult<()>;

    /// Get an agent by namespace and name.
    async fn get(&self, namespace: &str, name: &str) -> DomainResult<Option<AgentRecord>>;

    /// Replace an existing record. Fails if the agent does not exist.
    async fn update(&self, record: &AgentRecord) -> DomainResult<()>;

    /// Delete an agent. Fails if the agent does not exist.
    async fn delete(&self, namespace: &str, name: &str) -> DomainResult<()>;

    /// List agents in a namespace, ordered by name.
    async fn list(&self, namespace: &str) -> DomainResult<Vec<AgentRecord>>;
}
