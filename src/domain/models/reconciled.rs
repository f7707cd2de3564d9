//! Output of a reconciliation pass.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::agent::{AgentSpec, Skill, ToolType};
use super::diagnostic::{Diagnostic, ReferenceError};
use super::resource::ObjectIdentity;
use crate::domain::errors::{DomainError, DomainResult};

/// Lifecycle phase of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AgentPhase {
    /// Not reconciled yet.
    Pending,
    /// Every check passed.
    Ready,
    /// Usable, with warnings.
    Degraded,
    /// Cannot run.
    Error,
}

impl AgentPhase {
    /// Phase name as shown in status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Ready => "Ready",
            Self::Degraded => "Degraded",
            Self::Error => "Error",
        }
    }

    /// Whether a pass has finished with this phase.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether the agent can take requests in this phase.
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Ready | Self::Degraded)
    }

    /// Phase implied by a diagnostics list.
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        if diagnostics.is_empty() {
            Self::Ready
        } else if diagnostics.iter().any(Diagnostic::is_fatal) {
            Self::Error
        } else {
            Self::Degraded
        }
    }
}

impl fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase plus ordered human-readable reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatus {
    /// Current phase.
    pub phase: AgentPhase,
    /// One entry per diagnostic, in diagnostic order.
    pub reasons: Vec<String>,
}

impl AgentStatus {
    /// Status before the first pass.
    pub fn pending() -> Self {
        Self {
            phase: AgentPhase::Pending,
            reasons: Vec::new(),
        }
    }

    /// Move out of `Pending`. A pass transitions exactly once.
    pub fn transition(&mut self, to: AgentPhase, reasons: Vec<String>) -> DomainResult<()> {
        if self.phase.is_terminal() || !to.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.phase.to_string(),
                to: to.to_string(),
            });
        }
        self.phase = to;
        self.reasons = reasons;
        Ok(())
    }
}

/// A resolved parameter value, or the marker for an optional source that
/// could not be read.
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedValue {
    /// Value read from a literal or source.
    Value(String),
    /// Optional source that could not be read, with the reason.
    Absent { cause: ReferenceError },
}

impl ResolvedValue {
    /// The value, unless absent.
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent { .. } => None,
        }
    }

    /// Whether the source could not be read.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent { .. })
    }
}

impl fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Absent { cause } => f.debug_struct("Absent").field("cause", cause).finish(),
        }
    }
}

/// Where a parameter's value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParameterSource {
    /// Written inline.
    Literal,
    /// Read from a ConfigMap key.
    ConfigMap { name: String, key: String },
    /// Read from a Secret key.
    Secret { name: String, key: String },
}

/// A parameter after materialization.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedParameter {
    /// Template variable name.
    pub name: String,
    /// Resolved value.
    pub value: ResolvedValue,
    /// Where the value came from.
    pub source: ParameterSource,
}

impl ResolvedParameter {
    /// Whether the value came from a Secret and must not be shown.
    pub fn is_sensitive(&self) -> bool {
        matches!(self.source, ParameterSource::Secret { .. })
    }
}

impl fmt::Debug for ResolvedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ResolvedParameter");
        s.field("name", &self.name);
        if self.is_sensitive() {
            s.field("value", &"***");
        } else {
            match &self.value {
                ResolvedValue::Value(v) => s.field("value", v),
                absent => s.field("value", absent),
            };
        }
        s.field("source", &self.source).finish()
    }
}

impl Serialize for ResolvedParameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("ResolvedParameter", 4)?;
        s.serialize_field("name", &self.name)?;
        let value = match self.value.as_deref() {
            Some(_) if self.is_sensitive() => Some("***"),
            other => other,
        };
        s.serialize_field("value", &value)?;
        s.serialize_field("absent", &self.value.is_absent())?;
        s.serialize_field("source", &self.source)?;
        s.end()
    }
}

/// Ordered parameter set, input order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedParameters(pub Vec<ResolvedParameter>);

impl ResolvedParameters {
    /// Value for a parameter name.
    pub fn get(&self, name: &str) -> Option<&ResolvedValue> {
        self.0.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Number of resolved parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing resolved.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values ready for prompt templating. Absent parameters are left out.
    pub fn template_values(&self) -> BTreeMap<&str, &str> {
        self.0
            .iter()
            .filter_map(|p| p.value.as_deref().map(|v| (p.name.as_str(), v)))
            .collect()
    }
}

/// A tool entry after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTool {
    /// Position in `spec.tools`.
    pub index: usize,
    /// Tool kind.
    pub tool_type: ToolType,
    /// Objects backing the tool: one for named tools, every selector match
    /// for MCP tools.
    pub targets: Vec<ObjectIdentity>,
}

/// Every reference that resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReferences {
    /// Resolved execution engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_engine: Option<ObjectIdentity>,
    /// Resolved model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ObjectIdentity>,
    /// Resolved tools, in declaration order.
    pub tools: Vec<ResolvedTool>,
}

impl ResolvedReferences {
    /// Whether nothing resolved.
    pub fn is_empty(&self) -> bool {
        self.execution_engine.is_none() && self.model.is_none() && self.tools.is_empty()
    }

    /// Whether any resolved tool has this kind.
    pub fn has_tool_type(&self, tool_type: ToolType) -> bool {
        self.tools.iter().any(|t| t.tool_type == tool_type)
    }
}

/// Immutable result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledAgent {
    /// Spec the pass ran on.
    pub spec: AgentSpec,
    /// Materialized parameters.
    pub parameters: ResolvedParameters,
    /// Objects the references resolved to.
    pub references: ResolvedReferences,
    /// Skills with tags deduplicated.
    pub skills: Vec<Skill>,
    /// Whether the agent is served by an external A2A server.
    #[serde(rename = "isA2A")]
    pub is_a2a: bool,
    /// A2A server address, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a2a_address: Option<String>,
    /// Every problem found, sorted.
    pub diagnostics: Vec<Diagnostic>,
    /// Status computed from the diagnostics.
    pub status: AgentStatus,
    /// Projected annotations.
    pub annotations: BTreeMap<String, String>,
}

impl ReconciledAgent {
    /// Current phase.
    pub fn phase(&self) -> AgentPhase {
        self.status.phase
    }

    /// `namespace/name`.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.spec.namespace, self.spec.name)
    }
}

/// Result of a cancellable pass. A cancelled pass publishes nothing.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    Completed(Box<ReconciledAgent>),
    Cancelled,
}

impl ReconcileOutcome {
    /// The snapshot of a completed pass.
    pub fn into_snapshot(self) -> Option<ReconciledAgent> {
        match self {
            Self::Completed(agent) => Some(*agent),
            Self::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_once() {
        let mut status = AgentStatus::pending();
        status.transition(AgentPhase::Ready, vec![]).unwrap();
        assert_eq!(status.phase, AgentPhase::Ready);

        let again = status.transition(AgentPhase::Error, vec!["late".into()]);
        assert!(matches!(again, Err(DomainError::InvalidStatusTransition { .. })));
        assert_eq!(status.phase, AgentPhase::Ready);
    }

    #[test]
    fn test_cannot_transition_to_pending() {
        let mut status = AgentStatus::pending();
        assert!(status.transition(AgentPhase::Pending, vec![]).is_err());
    }

    #[test]
    fn test_secret_values_redacted_in_debug() {
        let param = ResolvedParameter {
            name: "token".into(),
            value: ResolvedValue::Value("hunter2".into()),
            source: ParameterSource::Secret {
                name: "creds".into(),
                key: "token".into(),
            },
        };
        let rendered = format!("{param:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_template_values_skip_absent() {
        let params = ResolvedParameters(vec![
            ResolvedParameter {
                name: "a".into(),
                value: ResolvedValue::Value("1".into()),
                source: ParameterSource::Literal,
            },
            ResolvedParameter {
                name: "b".into(),
                value: ResolvedValue::Absent {
                    cause: ReferenceError::NotFound {
                        kind: crate::domain::models::ResourceKind::ConfigMap,
                        namespace: "default".into(),
                        name: "cm".into(),
                    },
                },
                source: ParameterSource::ConfigMap {
                    name: "cm".into(),
                    key: "b".into(),
                },
            },
        ]);
        let values = params.template_values();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("a"), Some(&"1"));
        assert!(params.get("b").unwrap().is_absent());
    }
}
