//! Agent reconciliation orchestrator.
//!
//! A pass runs structural validation, then fans out reference resolution and
//! parameter materialization, joins, validates tools and skills, computes the
//! status and projects annotations. Every failure ends up as a diagnostic in
//! the snapshot; a pass never returns an error.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::{
    sort_diagnostics, AgentPhase, AgentSpec, AgentStatus, Component, Config, Diagnostic,
    DiagnosticKind, ObjectIdentity, ReconcileOutcome, ReconciledAgent, ReferenceError,
    ResolvedParameters, ResolvedReferences, ResolvedTool, Skill, StructuralError,
};
use crate::domain::ports::ResourceStore;
use crate::services::annotation_projector::AnnotationProjector;
use crate::services::identity_locks::IdentityLocks;
use crate::services::parameter_materializer::{MaterializedParameters, ParameterMaterializer};
use crate::services::reference_resolver::{ReferenceResolver, ResolvedEngine, ResolverSettings};
use crate::services::tool_skill_validator::ToolSkillValidator;

/// Joined results of the concurrent resolution step.
struct Resolution {
    engine: Option<Result<ResolvedEngine, ReferenceError>>,
    model: Result<Option<ObjectIdentity>, ReferenceError>,
    tools: Vec<(usize, Result<Option<ResolvedTool>, ReferenceError>)>,
    parameters: MaterializedParameters,
}

/// Runs reconciliation passes against a resource store.
pub struct AgentReconciler<S: ResourceStore + ?Sized> {
    resolver: Arc<ReferenceResolver<S>>,
    materializer: ParameterMaterializer<S>,
    validator: ToolSkillValidator,
    projector: AnnotationProjector,
    locks: IdentityLocks,
}

impl<S: ResourceStore + ?Sized> AgentReconciler<S> {
    /// Build the pipeline from configuration.
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        let resolver = Arc::new(ReferenceResolver::new(store, ResolverSettings::from(config)));
        Self {
            materializer: ParameterMaterializer::new(Arc::clone(&resolver)),
            resolver,
            validator: ToolSkillValidator::from_config(config),
            projector: AnnotationProjector::new(),
            locks: IdentityLocks::new(),
        }
    }

    /// Per-identity locks held during passes.
    pub fn locks(&self) -> &IdentityLocks {
        &self.locks
    }

    /// Run one full pass.
    #[instrument(skip(self, spec), fields(agent = %spec.name, namespace = %spec.namespace))]
    pub async fn reconcile(&self, spec: &AgentSpec) -> ReconciledAgent {
        let _guard = self.locks.acquire(&spec.namespace, &spec.name).await;

        if let Some(failed) = self.structural_failure(spec) {
            return failed;
        }
        let resolution = self.resolve(spec).await;
        self.assemble(spec, resolution)
    }

    /// Run one pass that stops early once `token` is cancelled. A cancelled
    /// pass publishes nothing.
    #[instrument(skip(self, spec, token), fields(agent = %spec.name, namespace = %spec.namespace))]
    pub async fn reconcile_with_cancel(
        &self,
        spec: &AgentSpec,
        token: &CancellationToken,
    ) -> ReconcileOutcome {
        let _guard = tokio::select! {
            biased;
            () = token.cancelled() => return Self::cancelled(spec),
            guard = self.locks.acquire(&spec.namespace, &spec.name) => guard,
        };
        if token.is_cancelled() {
            return Self::cancelled(spec);
        }

        if let Some(failed) = self.structural_failure(spec) {
            return ReconcileOutcome::Completed(Box::new(failed));
        }

        let resolution = tokio::select! {
            biased;
            () = token.cancelled() => return Self::cancelled(spec),
            resolution = self.resolve(spec) => resolution,
        };
        if token.is_cancelled() {
            return Self::cancelled(spec);
        }

        ReconcileOutcome::Completed(Box::new(self.assemble(spec, resolution)))
    }

    /// Decode a raw request body and reconcile it. `namespace` fills in a
    /// missing `namespace` field. Bodies that do not decode produce an
    /// `Error` snapshot.
    pub async fn reconcile_value(&self, namespace: &str, mut body: serde_json::Value) -> ReconciledAgent {
        if let Some(object) = body.as_object_mut() {
            object
                .entry("namespace")
                .or_insert_with(|| serde_json::Value::String(namespace.to_string()));
        }

        match serde_json::from_value::<AgentSpec>(body.clone()) {
            Ok(spec) => self.reconcile(&spec).await,
            Err(err) => {
                let field = |key: &str| body.get(key).and_then(serde_json::Value::as_str);
                let name = field("name").unwrap_or_default();
                let namespace = field("namespace")
                    .filter(|ns| !ns.is_empty())
                    .unwrap_or(namespace);
                let spec = AgentSpec::new(namespace, name);
                let _guard = self.locks.acquire(&spec.namespace, &spec.name).await;
                warn!(agent = %name, %namespace, error = %err, "agent spec failed to decode");
                self.finish(
                    spec,
                    vec![Diagnostic::structural("spec", StructuralError::Decode(err.to_string()))],
                    ResolvedParameters::default(),
                    ResolvedReferences::default(),
                    Vec::new(),
                    None,
                    false,
                )
            }
        }
    }

    fn cancelled(spec: &AgentSpec) -> ReconcileOutcome {
        info!(agent = %spec.name, namespace = %spec.namespace, "reconciliation cancelled");
        ReconcileOutcome::Cancelled
    }

    fn structural_failure(&self, spec: &AgentSpec) -> Option<ReconciledAgent> {
        let errors = spec.structural_errors();
        if errors.is_empty() {
            return None;
        }
        Some(self.finish(
            spec.clone(),
            errors,
            ResolvedParameters::default(),
            ResolvedReferences::default(),
            Vec::new(),
            None,
            false,
        ))
    }

    /// Fan out every store-backed lookup and join before anything looks at
    /// the results.
    async fn resolve(&self, spec: &AgentSpec) -> Resolution {
        let namespace = spec.namespace.as_str();
        let runs_on_a2a = spec
            .execution_engine
            .as_ref()
            .is_some_and(|engine| self.resolver.is_a2a_engine(&engine.name));

        let engine = async {
            match &spec.execution_engine {
                Some(engine) => Some(self.resolver.resolve_execution_engine(engine, namespace).await),
                None => None,
            }
        };
        let model = async {
            if runs_on_a2a {
                Ok(None)
            } else {
                self.resolver.resolve_model(spec.model_ref.as_ref(), namespace).await
            }
        };
        let tools = join_all(spec.tools().iter().enumerate().map(|(index, tool)| async move {
            (index, self.resolver.resolve_tool(index, tool, namespace).await)
        }));
        let parameters = self.materializer.materialize(spec.parameters(), namespace);

        let (engine, model, tools, parameters) = tokio::join!(engine, model, tools, parameters);
        debug!(
            tools = tools.len(),
            parameters = parameters.parameters.len(),
            "resolution joined"
        );

        Resolution {
            engine,
            model,
            tools,
            parameters,
        }
    }

    fn assemble(&self, spec: &AgentSpec, resolution: Resolution) -> ReconciledAgent {
        let Resolution {
            engine,
            model,
            tools,
            parameters,
        } = resolution;
        let MaterializedParameters {
            parameters,
            mut diagnostics,
        } = parameters;
        let mut references = ResolvedReferences::default();
        let mut engine_address = None;
        let mut runs_on_a2a = false;

        match engine {
            Some(Ok(resolved)) => {
                runs_on_a2a = self.resolver.is_a2a_engine(&resolved.identity.name);
                engine_address = resolved.address;
                references.execution_engine = Some(resolved.identity);
            }
            Some(Err(err)) => diagnostics.push(Diagnostic::reference(
                Component::ReferenceResolver,
                "spec.executionEngine",
                err,
                false,
            )),
            None => {}
        }

        match model {
            Ok(identity) => references.model = identity,
            Err(err) => diagnostics.push(Diagnostic::reference(
                Component::ReferenceResolver,
                "spec.modelRef",
                err,
                false,
            )),
        }

        let tool_diagnostics = self.validator.validate_tools(spec.tools());
        let rejected: HashSet<usize> = tool_diagnostics
            .iter()
            .filter_map(|d| match &d.kind {
                DiagnosticKind::Tool(err) => Some(err.index()),
                _ => None,
            })
            .collect();

        for (index, result) in tools {
            match result {
                Ok(Some(tool)) if !rejected.contains(&index) => references.tools.push(tool),
                Ok(_) => {}
                Err(err) => diagnostics.push(Diagnostic::reference(
                    Component::ReferenceResolver,
                    format!("spec.tools[{index}]"),
                    err,
                    false,
                )),
            }
        }
        diagnostics.extend(tool_diagnostics);

        let (skills, skill_diagnostics) = self.validator.validate_skills(&spec.effective_skills());
        diagnostics.extend(skill_diagnostics);

        let declared_address = spec.a2a_address_annotation().map(str::to_string);
        let is_a2a = runs_on_a2a || declared_address.is_some() || engine_address.is_some();
        let a2a_address = if is_a2a {
            declared_address.or(engine_address)
        } else {
            None
        };

        self.finish(
            spec.clone(),
            diagnostics,
            parameters,
            references,
            skills,
            a2a_address,
            is_a2a,
        )
    }

    /// Sort diagnostics, move the status out of `Pending` and project
    /// annotations.
    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        spec: AgentSpec,
        mut diagnostics: Vec<Diagnostic>,
        parameters: ResolvedParameters,
        references: ResolvedReferences,
        skills: Vec<Skill>,
        a2a_address: Option<String>,
        is_a2a: bool,
    ) -> ReconciledAgent {
        sort_diagnostics(&mut diagnostics);
        let phase = AgentPhase::from_diagnostics(&diagnostics);
        let mut status = AgentStatus::pending();
        if let Err(err) = status.transition(phase, diagnostics.iter().map(Diagnostic::reason).collect()) {
            warn!(error = %err, "status transition rejected");
        }

        let mut agent = ReconciledAgent {
            spec,
            parameters,
            references,
            skills,
            is_a2a,
            a2a_address,
            diagnostics,
            status,
            annotations: Default::default(),
        };
        agent.annotations = self.projector.project(&agent);

        match agent.phase() {
            AgentPhase::Error => warn!(
                agent = %agent.spec.name,
                namespace = %agent.spec.namespace,
                phase = %agent.phase(),
                diagnostics = agent.diagnostics.len(),
                "agent reconciled with errors"
            ),
            phase => info!(
                agent = %agent.spec.name,
                namespace = %agent.spec.namespace,
                %phase,
                diagnostics = agent.diagnostics.len(),
                "agent reconciled"
            ),
        }
        agent
    }
}
