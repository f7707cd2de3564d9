//! Resolves model, execution engine, tool and `valueFrom` references against
//! the backing store.
//!
//! Every store call gets its own timeout. Resolution is a pure read: nothing
//! here mutates shared state, so calls for distinct references can be issued
//! concurrently.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Config, ExecutionEngineRef, ModelRef, ObjectIdentity, ReferenceError, ResolvedTool,
    ResolvedValue, ResourceKind, ResourceRecord, Tool, ToolType, ValueFrom,
};
use crate::domain::ports::ResourceStore;

/// Attribute on an ExecutionEngine record holding its A2A address.
pub const ENGINE_ADDRESS_ATTRIBUTE: &str = "address";

/// Resolver behaviour taken from configuration.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Limit for each store call.
    pub timeout: Duration,
    /// Reject references without a namespace.
    pub require_explicit_namespace: bool,
    /// Model used when `modelRef` is unset.
    pub default_model: Option<String>,
    /// Engines served by external A2A servers.
    pub a2a_engines: Vec<String>,
}

impl From<&Config> for ResolverSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.resolver.timeout_ms),
            require_explicit_namespace: config.resolver.require_explicit_namespace,
            default_model: config.resolver.default_model.clone(),
            a2a_engines: config.a2a.engines.clone(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// A resolved execution engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEngine {
    /// The engine object.
    pub identity: ObjectIdentity,
    /// Address the engine serves A2A traffic on, when it publishes one.
    pub address: Option<String>,
}

/// Resolves references against a resource store.
pub struct ReferenceResolver<S: ResourceStore + ?Sized> {
    store: Arc<S>,
    settings: ResolverSettings,
}

impl<S: ResourceStore + ?Sized> ReferenceResolver<S> {
    /// Resolver over `store`.
    pub fn new(store: Arc<S>, settings: ResolverSettings) -> Self {
        Self { store, settings }
    }

    /// Active settings.
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Engines that run agents on external A2A servers.
    pub fn is_a2a_engine(&self, name: &str) -> bool {
        self.settings.a2a_engines.iter().any(|e| e == name)
    }

    /// Resolve a model reference. Without a reference, falls back to the
    /// configured default model in the agent's namespace; `Ok(None)` when no
    /// default is configured.
    pub async fn resolve_model(
        &self,
        model_ref: Option<&ModelRef>,
        agent_namespace: &str,
    ) -> Result<Option<ObjectIdentity>, ReferenceError> {
        let (name, namespace) = match model_ref {
            Some(model) => (
                model.name.as_str(),
                self.scope(ResourceKind::Model, &model.name, model.namespace.as_deref(), agent_namespace)?,
            ),
            None => match self.settings.default_model.as_deref() {
                Some(default) => (default, agent_namespace),
                None => return Ok(None),
            },
        };

        let record = self.fetch(ResourceKind::Model, namespace, name).await?;
        Ok(Some(record.identity()))
    }

    /// Resolve an execution engine. A2A engines run off-cluster and resolve
    /// without a store lookup.
    pub async fn resolve_execution_engine(
        &self,
        engine: &ExecutionEngineRef,
        agent_namespace: &str,
    ) -> Result<ResolvedEngine, ReferenceError> {
        if self.is_a2a_engine(&engine.name) {
            let namespace = engine.namespace.as_deref().unwrap_or(agent_namespace);
            return Ok(ResolvedEngine {
                identity: ObjectIdentity::builtin(ResourceKind::ExecutionEngine, namespace, &engine.name),
                address: None,
            });
        }

        let namespace = self.scope(
            ResourceKind::ExecutionEngine,
            &engine.name,
            engine.namespace.as_deref(),
            agent_namespace,
        )?;
        let record = self.fetch(ResourceKind::ExecutionEngine, namespace, &engine.name).await?;
        let address = record
            .data
            .get(ENGINE_ADDRESS_ATTRIBUTE)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Ok(ResolvedEngine {
            identity: record.identity(),
            address,
        })
    }

    /// Read a ConfigMap or Secret key. Optional sources that cannot be read
    /// resolve to [`ResolvedValue::Absent`] carrying the cause.
    pub async fn resolve_value_from(
        &self,
        source: &ValueFrom,
        agent_namespace: &str,
    ) -> Result<ResolvedValue, ReferenceError> {
        let kind = match source {
            ValueFrom::ConfigMapKeyRef(_) => ResourceKind::ConfigMap,
            ValueFrom::SecretKeyRef(_) => ResourceKind::Secret,
        };

        let lookup = self
            .fetch(kind, agent_namespace, source.name())
            .await
            .and_then(|record| {
                record
                    .data
                    .get(source.key())
                    .cloned()
                    .ok_or_else(|| ReferenceError::KeyNotFound {
                        kind,
                        namespace: agent_namespace.to_string(),
                        name: source.name().to_string(),
                        key: source.key().to_string(),
                    })
            });

        match lookup {
            Ok(value) => Ok(ResolvedValue::Value(value)),
            Err(cause) if source.is_optional() => {
                debug!(%cause, "optional parameter source unavailable");
                Ok(ResolvedValue::Absent { cause })
            }
            Err(cause) => Err(cause),
        }
    }

    /// Resolve the objects behind a tool entry.
    ///
    /// Entries the validator will reject (unknown type, missing name, empty
    /// selector) resolve to `Ok(None)` so they are reported once.
    pub async fn resolve_tool(
        &self,
        index: usize,
        tool: &Tool,
        agent_namespace: &str,
    ) -> Result<Option<ResolvedTool>, ReferenceError> {
        let Some(tool_type) = tool.kind() else {
            return Ok(None);
        };

        let targets = match tool_type {
            ToolType::BuiltIn => match tool.declared_name() {
                Some(name) => vec![ObjectIdentity::builtin(ResourceKind::Tool, agent_namespace, name)],
                None => return Ok(None),
            },
            ToolType::Custom => match tool.declared_name() {
                Some(name) => vec![self.fetch(ResourceKind::Tool, agent_namespace, name).await?.identity()],
                None => return Ok(None),
            },
            ToolType::Mcp => {
                let Some(selector) = tool.label_selector.as_ref().filter(|s| !s.is_empty()) else {
                    return Ok(None);
                };
                let servers = self.list(ResourceKind::McpServer, agent_namespace).await?;
                let matched: Vec<_> = servers
                    .iter()
                    .filter(|server| selector.matches(&server.labels))
                    .map(ResourceRecord::identity)
                    .collect();
                if matched.is_empty() {
                    return Err(ReferenceError::NoSelectorMatches {
                        kind: ResourceKind::McpServer,
                        namespace: agent_namespace.to_string(),
                    });
                }
                matched
            }
        };

        Ok(Some(ResolvedTool {
            index,
            tool_type,
            targets,
        }))
    }

    /// Namespace to look a reference up in.
    fn scope<'a>(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: Option<&'a str>,
        agent_namespace: &'a str,
    ) -> Result<&'a str, ReferenceError> {
        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => Ok(ns),
            None if self.settings.require_explicit_namespace => Err(ReferenceError::Ambiguous {
                kind,
                name: name.to_string(),
            }),
            None => Ok(agent_namespace),
        }
    }

    async fn fetch(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceRecord, ReferenceError> {
        self.bounded(kind, namespace, name, self.store.get(kind, namespace, name))
            .await?
            .ok_or_else(|| ReferenceError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> Result<Vec<ResourceRecord>, ReferenceError> {
        self.bounded(kind, namespace, "*", self.store.list(kind, namespace))
            .await
    }

    /// Run one store call under the configured timeout.
    async fn bounded<T>(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        call: impl Future<Output = DomainResult<T>>,
    ) -> Result<T, ReferenceError> {
        match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ReferenceError::Unavailable {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: err.to_string(),
            }),
            Err(_) => Err(ReferenceError::Timeout {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                timeout_ms: u64::try_from(self.settings.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
