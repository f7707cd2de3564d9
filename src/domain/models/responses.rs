//! Response shapes of the agent management API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::agent::{ExecutionEngineRef, ModelRef, Parameter, Skill, Tool};
use super::reconciled::ReconciledAgent;

/// List-view summary of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Agent name.
    pub name: String,
    /// Agent namespace.
    pub namespace: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of the referenced model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_ref: Option<String>,
    /// Prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Phase name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Projected annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl From<&ReconciledAgent> for AgentResponse {
    fn from(agent: &ReconciledAgent) -> Self {
        Self {
            name: agent.spec.name.clone(),
            namespace: agent.spec.namespace.clone(),
            description: agent.spec.description.clone(),
            model_ref: agent.spec.model_ref.as_ref().map(|m| m.name.clone()),
            prompt: agent.spec.prompt.clone(),
            status: Some(agent.phase().to_string()),
            annotations: Some(agent.annotations.clone()),
        }
    }
}

/// List of agents. `count` always equals `items.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentListResponse {
    items: Vec<AgentResponse>,
    count: usize,
}

impl AgentListResponse {
    /// Build a list; `count` is derived from `items`.
    pub fn new(items: Vec<AgentResponse>) -> Self {
        let count = items.len();
        Self { items, count }
    }

    /// Listed agents.
    pub fn items(&self) -> &[AgentResponse] {
        &self.items
    }

    /// Number of listed agents.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl FromIterator<AgentResponse> for AgentListResponse {
    fn from_iter<I: IntoIterator<Item = AgentResponse>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Full resolved view of an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDetailResponse {
    /// Agent name.
    pub name: String,
    /// Agent namespace.
    pub namespace: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Engine the agent runs on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_engine: Option<ExecutionEngineRef>,
    /// Model reference as declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_ref: Option<ModelRef>,
    /// Prompt template parameters as declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Prompt template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Tools as declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Accepted skills, tags deduplicated.
    pub skills: Vec<Skill>,
    /// Whether the agent is served by an external A2A server.
    #[serde(rename = "isA2A")]
    pub is_a2a: bool,
    /// Open map so new status fields do not break consumers.
    pub status: BTreeMap<String, Value>,
    /// Projected annotations.
    pub annotations: BTreeMap<String, String>,
}

impl From<&ReconciledAgent> for AgentDetailResponse {
    fn from(agent: &ReconciledAgent) -> Self {
        let mut status = BTreeMap::new();
        status.insert("phase".to_string(), json!(agent.phase().as_str()));
        status.insert("reasons".to_string(), json!(agent.status.reasons));
        status.insert(
            "diagnostics".to_string(),
            serde_json::to_value(&agent.diagnostics).unwrap_or(Value::Null),
        );
        status.insert(
            "resolvedReferences".to_string(),
            serde_json::to_value(&agent.references).unwrap_or(Value::Null),
        );
        status.insert(
            "resolvedParameters".to_string(),
            json!(agent.parameters.len()),
        );

        Self {
            name: agent.spec.name.clone(),
            namespace: agent.spec.namespace.clone(),
            description: agent.spec.description.clone(),
            execution_engine: agent.spec.execution_engine.clone(),
            model_ref: agent.spec.model_ref.clone(),
            parameters: agent.spec.parameters.clone(),
            prompt: agent.spec.prompt.clone(),
            tools: agent.spec.tools.clone(),
            skills: agent.skills.clone(),
            is_a2a: agent.is_a2a,
            status,
            annotations: agent.annotations.clone(),
        }
    }
}
