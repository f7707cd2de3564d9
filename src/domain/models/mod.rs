//! Domain models.

pub mod agent;
pub mod annotations;
pub mod config;
pub mod diagnostic;
pub mod reconciled;
pub mod resource;
pub mod responses;

pub use agent::{
    AgentCreateRequest, AgentSpec, AgentUpdateRequest, ConfigMapKeyRef, ExecutionEngineRef,
    LabelSelector, LabelSelectorOperator, LabelSelectorRequirement, ModelRef, Parameter,
    SecretKeyRef, Skill, Tool, ToolType, ValueFrom,
};
pub use config::{A2aConfig, Config, LoggingConfig, ResolverConfig, ToolsConfig};
pub use diagnostic::{
    sort_diagnostics, Component, Diagnostic, DiagnosticKind, ParameterError, ReferenceError,
    Severity, SkillError, StructuralError, ToolError,
};
pub use reconciled::{
    AgentPhase, AgentStatus, ParameterSource, ReconcileOutcome, ReconciledAgent,
    ResolvedParameter, ResolvedParameters, ResolvedReferences, ResolvedTool, ResolvedValue,
};
pub use resource::{ObjectIdentity, ResourceKind, ResourceRecord};
pub use responses::{AgentDetailResponse, AgentListResponse, AgentResponse};
