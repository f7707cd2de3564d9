//! In-memory implementation of the AgentRepository.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{AgentRecord, AgentRepository};

/// Agent repository kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryAgentRepository {
    agents: RwLock<BTreeMap<(String, String), AgentRecord>>,
}

impl InMemoryAgentRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_string(), name.to_string())
}

fn not_found(namespace: &str, name: &str) -> DomainError {
    DomainError::AgentNotFound {
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn create(&self, record: &AgentRecord) -> DomainResult<()> {
        let mut agents = self.agents.write().await;
        let key = key(record.namespace(), record.name());
        if agents.contains_key(&key) {
            return Err(DomainError::AgentAlreadyExists {
                namespace: key.0,
                name: key.1,
            });
        }
        agents.insert(key, record.clone());
        Ok(())
    }

    async fn get(&self, namespace: &str, name: &str) -> DomainResult<Option<AgentRecord>> {
        Ok(self.agents.read().await.get(&key(namespace, name)).cloned())
    }

    async fn update(&self, record: &AgentRecord) -> DomainResult<()> {
        let mut agents = self.agents.write().await;
        match agents.get_mut(&key(record.namespace(), record.name())) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(not_found(record.namespace(), record.name())),
        }
    }

    async fn delete(&self, namespace: &str, name: &str) -> DomainResult<()> {
        self.agents
            .write()
            .await
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| not_found(namespace, name))
    }

    async fn list(&self, namespace: &str) -> DomainResult<Vec<AgentRecord>> {
        Ok(self
            .agents
            .read()
            .await
            .values()
            .filter(|r| r.namespace() == namespace)
            .cloned()
            .collect())
    }
}
