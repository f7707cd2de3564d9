//! In-memory implementation of the ResourceStore.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ResourceKind, ResourceRecord};
use crate::domain::ports::ResourceStore;

type Key = (ResourceKind, String, String);

/// Resource store kept in memory, with optional latency and outage injection.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    records: RwLock<BTreeMap<Key, ResourceRecord>>,
    /// Delay applied to every call.
    latency: Option<Duration>,
    /// Kinds whose calls fail as if the backend were down.
    unavailable: HashSet<ResourceKind>,
}

impl InMemoryResourceStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML list of records.
    pub fn from_yaml(source: &str) -> DomainResult<Self> {
        let records: Vec<ResourceRecord> = serde_yaml::from_str(source)?;
        Ok(records.into_iter().fold(Self::new(), Self::with))
    }

    /// Add a record.
    pub fn with(mut self, record: ResourceRecord) -> Self {
        self.records.get_mut().insert(key(&record), record);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every call for `kind`.
    pub fn with_unavailable(mut self, kind: ResourceKind) -> Self {
        self.unavailable.insert(kind);
        self
    }

    /// Insert or replace a record.
    pub async fn insert(&self, record: ResourceRecord) {
        self.records.write().await.insert(key(&record), record);
    }

    /// Remove a record.
    pub async fn remove(&self, kind: ResourceKind, namespace: &str, name: &str) -> Option<ResourceRecord> {
        self.records
            .write()
            .await
            .remove(&(kind, namespace.to_string(), name.to_string()))
    }

    /// Number of stored records.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    async fn enter(&self, kind: ResourceKind) -> DomainResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.contains(&kind) {
            return Err(DomainError::StoreUnavailable(format!("{kind} backend is down")));
        }
        Ok(())
    }
}

fn key(record: &ResourceRecord) -> Key {
    (record.kind, record.namespace.clone(), record.name.clone())
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> DomainResult<Option<ResourceRecord>> {
        self.enter(kind).await?;
        let records = self.records.read().await;
        Ok(records
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> DomainResult<Vec<ResourceRecord>> {
        self.enter(kind).await?;
        let records = self.records.read().await;
        // Map order is (kind, namespace, name), so matches come out name-ordered.
        Ok(records
            .values()
            .filter(|r| r.kind == kind && r.namespace == namespace)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_and_list() {
        let store = InMemoryResourceStore::new()
            .with(ResourceRecord::new(ResourceKind::McpServer, "default", "zeta"))
            .with(ResourceRecord::new(ResourceKind::McpServer, "default", "alpha"))
            .with(ResourceRecord::new(ResourceKind::McpServer, "other", "beta"));

        let found = store.get(ResourceKind::McpServer, "default", "zeta").await.unwrap();
        assert!(found.is_some());
        assert!(store.get(ResourceKind::Model, "default", "zeta").await.unwrap().is_none());

        let names: Vec<_> = store
            .list(ResourceKind::McpServer, "default")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_from_yaml() {
        let yaml = r"
- kind: Secret
  name: creds
  namespace: default
  data:
    token: abc
- kind: McpServer
  name: github
  namespace: default
  labels:
    team: dev
";
        let store = InMemoryResourceStore::from_yaml(yaml).unwrap();
        assert_eq!(store.count().await, 2);
        let secret = store
            .get(ResourceKind::Secret, "default", "creds")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(secret.data.get("token").map(String::as_str), Some("abc"));

        assert!(InMemoryResourceStore::from_yaml("- kind: Widget\n  name: x\n  namespace: y\n").is_err());
    }

    #[tokio::test]
    async fn test_unavailable_kind() {
        let store = InMemoryResourceStore::new().with_unavailable(ResourceKind::Secret);
        let result = store.get(ResourceKind::Secret, "default", "creds").await;
        assert!(matches!(result, Err(DomainError::StoreUnavailable(_))));
        assert!(store.get(ResourceKind::ConfigMap, "default", "cm").await.is_ok());
    }
}
