//! Agent service: the management operations over stored agents.
//!
//! Every create, update and resync runs a reconciliation pass and stores the
//! resulting snapshot. Invalid agents are still stored; their status says
//! why they cannot run.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentCreateRequest, AgentListResponse, AgentResponse, AgentUpdateRequest, ReconciledAgent,
};
use crate::domain::ports::{AgentRecord, AgentRepository, ResourceStore};
use crate::services::agent_reconciler::AgentReconciler;

/// Agent management operations backed by a repository.
pub struct AgentService<S: ResourceStore + ?Sized, R: AgentRepository> {
    reconciler: Arc<AgentReconciler<S>>,
    repository: Arc<R>,
}

impl<S: ResourceStore + ?Sized, R: AgentRepository> AgentService<S, R> {
    /// Service over a reconciler and repository.
    pub fn new(reconciler: Arc<AgentReconciler<S>>, repository: Arc<R>) -> Self {
        Self {
            reconciler,
            repository,
        }
    }

    /// Create an agent and store its first snapshot.
    pub async fn create(
        &self,
        namespace: &str,
        request: AgentCreateRequest,
    ) -> DomainResult<ReconciledAgent> {
        if self.repository.get(namespace, &request.name).await?.is_some() {
            return Err(DomainError::AgentAlreadyExists {
                namespace: namespace.to_string(),
                name: request.name,
            });
        }

        let spec = request.into_spec(namespace);
        let snapshot = self.reconciler.reconcile(&spec).await;
        self.repository.create(&AgentRecord::new(snapshot.clone())).await?;

        info!(agent = %spec.name, %namespace, phase = %snapshot.phase(), "agent created");
        Ok(snapshot)
    }

    /// Latest snapshot of an agent.
    pub async fn get(&self, namespace: &str, name: &str) -> DomainResult<ReconciledAgent> {
        Ok(self.load(namespace, name).await?.snapshot)
    }

    /// Summaries of every agent in a namespace.
    pub async fn list(&self, namespace: &str) -> DomainResult<AgentListResponse> {
        let records = self.repository.list(namespace).await?;
        Ok(records
            .iter()
            .map(|record| AgentResponse::from(&record.snapshot))
            .collect())
    }

    /// Merge the provided fields into the stored spec and reconcile again.
    pub async fn update(
        &self,
        namespace: &str,
        name: &str,
        request: AgentUpdateRequest,
    ) -> DomainResult<ReconciledAgent> {
        let mut record = self.load(namespace, name).await?;
        let mut spec = record.snapshot.spec.clone();
        request.apply_to(&mut spec);

        record.snapshot = self.reconciler.reconcile(&spec).await;
        record.generation += 1;
        record.updated_at = Utc::now();
        self.repository.update(&record).await?;

        info!(
            agent = %name,
            %namespace,
            generation = record.generation,
            phase = %record.snapshot.phase(),
            "agent updated"
        );
        Ok(record.snapshot)
    }

    /// Remove an agent.
    pub async fn delete(&self, namespace: &str, name: &str) -> DomainResult<()> {
        self.repository.delete(namespace, name).await?;
        info!(agent = %name, %namespace, "agent deleted");
        Ok(())
    }

    /// Reconcile an unchanged spec against the current store, e.g. after a
    /// referenced object was created.
    pub async fn resync(&self, namespace: &str, name: &str) -> DomainResult<ReconciledAgent> {
        let mut record = self.load(namespace, name).await?;
        let snapshot = self.reconciler.reconcile(&record.snapshot.spec).await;

        if snapshot != record.snapshot {
            record.snapshot = snapshot;
            record.updated_at = Utc::now();
            self.repository.update(&record).await?;
        }
        Ok(record.snapshot)
    }

    async fn load(&self, namespace: &str, name: &str) -> DomainResult<AgentRecord> {
        self.repository
            .get(namespace, name)
            .await?
            .ok_or_else(|| DomainError::AgentNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}
