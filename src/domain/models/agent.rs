//! Agent resource models.
//!
//! Wire shapes follow the management API (camelCase JSON). Optional fields are
//! explicit `Option`s; nothing is implied by absence.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::annotations::A2A_SERVER_ADDRESS_ANNOTATION;
use super::diagnostic::{Component, Diagnostic, StructuralError};

/// Execution engine an agent runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEngineRef {
    /// Engine name.
    pub name: String,
    /// Defaults to the agent's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Model an agent prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    /// Model name.
    pub name: String,
    /// Defaults to the agent's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Reference to a key in a ConfigMap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapKeyRef {
    /// Key within the ConfigMap's data.
    pub key: String,
    /// ConfigMap name, in the agent's namespace.
    pub name: String,
    /// Resolve to an absent value instead of failing when unreadable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Reference to a key in a Secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyRef {
    /// Key within the Secret's data.
    pub key: String,
    /// Secret name, in the agent's namespace.
    pub name: String,
    /// Resolve to an absent value instead of failing when unreadable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// External source of a parameter value. Exactly one source is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ValueFromWire", into = "ValueFromWire")]
pub enum ValueFrom {
    ConfigMapKeyRef(ConfigMapKeyRef),
    SecretKeyRef(SecretKeyRef),
}

impl ValueFrom {
    /// Name of the referenced object.
    pub fn name(&self) -> &str {
        match self {
            Self::ConfigMapKeyRef(r) => &r.name,
            Self::SecretKeyRef(r) => &r.name,
        }
    }

    /// Key read from the referenced object.
    pub fn key(&self) -> &str {
        match self {
            Self::ConfigMapKeyRef(r) => &r.key,
            Self::SecretKeyRef(r) => &r.key,
        }
    }

    /// Whether `optional: true` was set.
    pub fn is_optional(&self) -> bool {
        match self {
            Self::ConfigMapKeyRef(r) => r.optional.unwrap_or(false),
            Self::SecretKeyRef(r) => r.optional.unwrap_or(false),
        }
    }

    /// Whether the source is a Secret.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::SecretKeyRef(_))
    }
}

/// Two-field shape `ValueFrom` takes on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueFromWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config_map_key_ref: Option<ConfigMapKeyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret_key_ref: Option<SecretKeyRef>,
}

impl TryFrom<ValueFromWire> for ValueFrom {
    type Error = String;

    fn try_from(wire: ValueFromWire) -> Result<Self, Self::Error> {
        match (wire.config_map_key_ref, wire.secret_key_ref) {
            (Some(cm), None) => Ok(Self::ConfigMapKeyRef(cm)),
            (None, Some(secret)) => Ok(Self::SecretKeyRef(secret)),
            (Some(_), Some(_)) => {
                Err("valueFrom must set only one of configMapKeyRef or secretKeyRef".to_string())
            }
            (None, None) => {
                Err("valueFrom must set one of configMapKeyRef or secretKeyRef".to_string())
            }
        }
    }
}

impl From<ValueFrom> for ValueFromWire {
    fn from(value: ValueFrom) -> Self {
        match value {
            ValueFrom::ConfigMapKeyRef(cm) => Self {
                config_map_key_ref: Some(cm),
                secret_key_ref: None,
            },
            ValueFrom::SecretKeyRef(secret) => Self {
                config_map_key_ref: None,
                secret_key_ref: Some(secret),
            },
        }
    }
}

/// Prompt template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Template variable name.
    pub name: String,
    /// Literal value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// External source of the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<ValueFrom>,
}

impl Parameter {
    /// A parameter with a literal value.
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    /// A parameter read from a ConfigMap or Secret.
    pub fn from_source(name: impl Into<String>, source: ValueFrom) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(source),
        }
    }
}

/// Label selector operators. Anything else fails decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelSelectorOperator {
    /// Label value is one of `values`.
    In,
    /// Label is absent or not one of `values`.
    NotIn,
    /// Label key is present.
    Exists,
    /// Label key is absent.
    DoesNotExist,
}

/// One `matchExpressions` term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelectorRequirement {
    /// Label key the term tests.
    pub key: String,
    /// How `values` is applied.
    pub operator: LabelSelectorOperator,
    /// Candidate values for `In` and `NotIn`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl LabelSelectorRequirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let values = self.values.as_deref().unwrap_or_default();
        match self.operator {
            LabelSelectorOperator::In => labels
                .get(&self.key)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            LabelSelectorOperator::NotIn => labels
                .get(&self.key)
                .is_none_or(|v| values.iter().all(|candidate| candidate != v)),
            LabelSelectorOperator::Exists => labels.contains_key(&self.key),
            LabelSelectorOperator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }
}

/// Label query over a set of resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Exact label matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<BTreeMap<String, String>>,
    /// Set-based requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_expressions: Option<Vec<LabelSelectorRequirement>>,
}

impl LabelSelector {
    /// True when neither `matchLabels` nor `matchExpressions` has an entry.
    pub fn is_empty(&self) -> bool {
        self.match_labels.as_ref().is_none_or(BTreeMap::is_empty)
            && self.match_expressions.as_ref().is_none_or(Vec::is_empty)
    }

    /// All terms are ANDed.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let labels_match = self
            .match_labels
            .iter()
            .flatten()
            .all(|(k, v)| labels.get(k) == Some(v));
        labels_match
            && self
                .match_expressions
                .iter()
                .flatten()
                .all(|req| req.matches(labels))
    }
}

/// Recognised tool kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolType {
    /// Tool shipped with the runtime, named from an allow-list.
    #[serde(rename = "built-in")]
    BuiltIn,
    /// Tool backed by a `Tool` resource.
    #[serde(rename = "custom")]
    Custom,
    /// Discovered through a label selector over MCP servers.
    #[serde(rename = "mcp")]
    Mcp,
}

impl ToolType {
    /// Parse the wire name; `None` for unknown kinds.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "built-in" => Some(Self::BuiltIn),
            "custom" => Some(Self::Custom),
            "mcp" => Some(Self::Mcp),
            _ => None,
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuiltIn => "built-in",
            Self::Custom => "custom",
            Self::Mcp => "mcp",
        }
    }
}

/// Tool configuration. `type` stays a string so unknown kinds reach validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Tool kind as written; unknown kinds are reported by validation.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Tool name for built-in and custom tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// MCP server selector for `mcp` tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
}

impl Tool {
    /// A tool entry without a selector.
    pub fn new(tool_type: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            tool_type: tool_type.into(),
            name: name.map(str::to_string),
            label_selector: None,
        }
    }

    /// Recognised kind, if any.
    pub fn kind(&self) -> Option<ToolType> {
        ToolType::parse(&self.tool_type)
    }

    /// Name if present and non-blank.
    pub fn declared_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// A2A skill advertised by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the skill does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form tags; duplicates are removed on reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Skill {
    /// A skill without description or tags.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tags: None,
        }
    }

    /// Replace the tags.
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Copy with duplicate tags removed (case-sensitive, first occurrence kept).
    pub fn normalized(&self) -> Self {
        let tags = self.tags.as_ref().map(|tags| {
            let mut seen = HashSet::new();
            tags.iter()
                .filter(|t| seen.insert(t.as_str()))
                .cloned()
                .collect()
        });
        Self {
            tags,
            ..self.clone()
        }
    }
}

/// Desired state of an Agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpec {
    /// Object name; a lowercase RFC 1123 subdomain.
    pub name: String,
    /// Object namespace.
    pub namespace: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Engine the agent runs on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_engine: Option<ExecutionEngineRef>,
    /// Model the agent prompts; the configured default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_ref: Option<ModelRef>,
    /// Prompt template parameters, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Tools the agent may call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// A2A skills the agent advertises.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    /// Object metadata annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl AgentSpec {
    /// An empty spec with only identity set.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            description: None,
            execution_engine: None,
            model_ref: None,
            parameters: None,
            prompt: None,
            tools: None,
            skills: None,
            annotations: None,
        }
    }

    /// Set `modelRef` in the agent's namespace.
    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model_ref = Some(ModelRef {
            name: name.into(),
            namespace: None,
        });
        self
    }

    /// Set `executionEngine` in the agent's namespace.
    pub fn with_execution_engine(mut self, name: impl Into<String>) -> Self {
        self.execution_engine = Some(ExecutionEngineRef {
            name: name.into(),
            namespace: None,
        });
        self
    }

    /// Append a parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.get_or_insert_with(Vec::new).push(parameter);
        self
    }

    /// Append a tool.
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(tool);
        self
    }

    /// Append a skill.
    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.get_or_insert_with(Vec::new).push(skill);
        self
    }

    /// Set an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Annotation value by key.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.as_ref()?.get(key).map(String::as_str)
    }

    /// Declared parameters, empty when unset.
    pub fn parameters(&self) -> &[Parameter] {
        self.parameters.as_deref().unwrap_or_default()
    }

    /// Declared tools, empty when unset.
    pub fn tools(&self) -> &[Tool] {
        self.tools.as_deref().unwrap_or_default()
    }

    /// The declared `a2a.server/address`, if non-blank.
    pub fn a2a_address_annotation(&self) -> Option<&str> {
        self.annotation(A2A_SERVER_ADDRESS_ANNOTATION)
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Skills from the spec, or from an `a2a.*/skills` annotation when the
    /// spec has none.
    pub fn effective_skills(&self) -> Vec<Skill> {
        if let Some(skills) = &self.skills {
            return skills.clone();
        }

        let Some((key, raw)) = self
            .annotations
            .iter()
            .flatten()
            .find(|(key, _)| key.starts_with("a2a.") && key.ends_with("/skills"))
        else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<Skill>>(raw) {
            Ok(skills) => skills,
            Err(err) => {
                warn!(
                    agent = %self.name,
                    namespace = %self.namespace,
                    annotation = %key,
                    error = %err,
                    "failed to parse skills annotation"
                );
                Vec::new()
            }
        }
    }

    /// Required-field and format checks run before anything else.
    pub fn structural_errors(&self) -> Vec<Diagnostic> {
        let mut errors = Vec::new();
        let mut push = |path: String, error: StructuralError| {
            errors.push(Diagnostic::structural(path, error));
        };

        if self.name.is_empty() {
            push("metadata.name".into(), StructuralError::MissingField("name".into()));
        } else if !is_dns_subdomain(&self.name) {
            push("metadata.name".into(), StructuralError::InvalidName(self.name.clone()));
        }

        if self.namespace.is_empty() {
            push(
                "metadata.namespace".into(),
                StructuralError::MissingField("namespace".into()),
            );
        }

        if self.model_ref.as_ref().is_some_and(|m| m.name.is_empty()) {
            push(
                "spec.modelRef.name".into(),
                StructuralError::MissingField("modelRef.name".into()),
            );
        }

        if self.execution_engine.as_ref().is_some_and(|e| e.name.is_empty()) {
            push(
                "spec.executionEngine.name".into(),
                StructuralError::MissingField("executionEngine.name".into()),
            );
        }

        for (i, param) in self.parameters().iter().enumerate() {
            if param.name.is_empty() {
                push(
                    format!("spec.parameters[{i}].name"),
                    StructuralError::MissingField("name".into()),
                );
            }
            if let Some(source) = &param.value_from {
                if source.name().is_empty() {
                    push(
                        format!("spec.parameters[{i}].valueFrom.name"),
                        StructuralError::MissingField("name".into()),
                    );
                }
                if source.key().is_empty() {
                    push(
                        format!("spec.parameters[{i}].valueFrom.key"),
                        StructuralError::MissingField("key".into()),
                    );
                }
            }
        }

        errors
    }
}

/// Lowercase RFC 1123 subdomain, as object names require.
fn is_dns_subdomain(name: &str) -> bool {
    if name.len() > 253 {
        return false;
    }
    let bytes = name.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    bytes.first().is_some_and(alnum)
        && bytes.last().is_some_and(alnum)
        && bytes.iter().all(|b| alnum(b) || *b == b'-' || *b == b'.')
}

/// Request body for creating an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCreateRequest {
    /// Agent name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Engine the agent runs on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_engine: Option<ExecutionEngineRef>,
    /// Model the agent prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_ref: Option<ModelRef>,
    /// Prompt template parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Tools the agent may call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// A2A skills the agent advertises.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    /// Object annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl AgentCreateRequest {
    /// Spec for this request in `namespace`.
    pub fn into_spec(self, namespace: impl Into<String>) -> AgentSpec {
        AgentSpec {
            name: self.name,
            namespace: namespace.into(),
            description: self.description,
            execution_engine: self.execution_engine,
            model_ref: self.model_ref,
            parameters: self.parameters,
            prompt: self.prompt,
            tools: self.tools,
            skills: self.skills,
            annotations: self.annotations,
        }
    }
}

/// Request body for updating an agent. Only provided fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUpdateRequest {
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New execution engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_engine: Option<ExecutionEngineRef>,
    /// New model reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_ref: Option<ModelRef>,
    /// Replacement parameter list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// New prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Replacement tool list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Replacement skill list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
}

impl AgentUpdateRequest {
    /// Overwrite the provided fields of `spec`.
    pub fn apply_to(self, spec: &mut AgentSpec) {
        if let Some(description) = self.description {
            spec.description = Some(description);
        }
        if let Some(engine) = self.execution_engine {
            spec.execution_engine = Some(engine);
        }
        if let Some(model) = self.model_ref {
            spec.model_ref = Some(model);
        }
        if let Some(parameters) = self.parameters {
            spec.parameters = Some(parameters);
        }
        if let Some(prompt) = self.prompt {
            spec.prompt = Some(prompt);
        }
        if let Some(tools) = self.tools {
            spec.tools = Some(tools);
        }
        if let Some(skills) = self.skills {
            spec.skills = Some(skills);
        }
    }
}
