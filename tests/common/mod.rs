//! Common test utilities for integration tests
//!
//! Fixture stores and helpers shared across integration test files.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ark_reconciler::domain::models::{ResourceKind, ResourceRecord};
use ark_reconciler::{
    AgentReconciler, Config, DomainResult, InMemoryResourceStore, ResourceStore,
};
use async_trait::async_trait;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Initializes a tracing subscriber writing to the test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Every kind of object a fully valid agent can reference, in `default`.
pub fn fixture_records() -> Vec<ResourceRecord> {
    vec![
        ResourceRecord::new(ResourceKind::Model, "default", "gpt"),
        ResourceRecord::new(ResourceKind::Model, "default", "default"),
        ResourceRecord::new(ResourceKind::ExecutionEngine, "default", "langchain"),
        ResourceRecord::new(ResourceKind::ConfigMap, "default", "settings").with_data("region", "eu-west-1"),
        ResourceRecord::new(ResourceKind::Secret, "default", "creds").with_data("token", "s3cr3t"),
        ResourceRecord::new(ResourceKind::Tool, "default", "search"),
        ResourceRecord::new(ResourceKind::McpServer, "default", "github").with_label("team", "dev"),
        ResourceRecord::new(ResourceKind::McpServer, "default", "jira").with_label("team", "pm"),
    ]
}

pub fn fixture_store() -> InMemoryResourceStore {
    fixture_records()
        .into_iter()
        .fold(InMemoryResourceStore::new(), InMemoryResourceStore::with)
}

pub fn reconciler<S: ResourceStore + 'static>(store: S) -> AgentReconciler<S> {
    AgentReconciler::new(Arc::new(store), &Config::default())
}

/// Store that delays each call by the next entry of `delays_ms`, so
/// concurrent lookups complete in a chosen order.
pub struct JitterStore {
    inner: InMemoryResourceStore,
    delays_ms: Vec<u64>,
    calls: AtomicUsize,
}

impl JitterStore {
    pub fn new(inner: InMemoryResourceStore, delays_ms: Vec<u64>) -> Self {
        Self {
            inner,
            delays_ms,
            calls: AtomicUsize::new(0),
        }
    }

    async fn pause(&self) {
        if self.delays_ms.is_empty() {
            return;
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays_ms[call % self.delays_ms.len()];
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[async_trait]
impl ResourceStore for JitterStore {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> DomainResult<Option<ResourceRecord>> {
        self.pause().await;
        self.inner.get(kind, namespace, name).await
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> DomainResult<Vec<ResourceRecord>> {
        self.pause().await;
        self.inner.list(kind, namespace).await
    }
}
