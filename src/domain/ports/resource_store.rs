//! Backing resource store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ResourceKind, ResourceRecord};

/// Read access to the objects agents reference.
///
/// Implementations are expected to be eventually consistent: a just-created
/// object may not be visible yet, and callers retry by reconciling again.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Get one object by kind, namespace and name.
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> DomainResult<Option<ResourceRecord>>;

    /// List every object of a kind in a namespace, ordered by name.
    async fn list(&self, kind: ResourceKind, namespace: &str) -> DomainResult<Vec<ResourceRecord>>;
}
