//! Projects a reconciled agent onto its external annotation set.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::models::annotations::{
    A2A_SERVER_ADDRESS_ANNOTATION, DASHBOARD_ICON_ANNOTATION, MANAGED_ANNOTATIONS,
    RESOURCES_ANNOTATION, SERVICE_ANNOTATION,
};
use crate::domain::models::{ReconciledAgent, ResolvedReferences, ToolType};

/// Summary stored under the resources annotation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    execution_engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<String>,
}

impl From<&ResolvedReferences> for ResourceSummary {
    fn from(refs: &ResolvedReferences) -> Self {
        Self {
            execution_engine: refs.execution_engine.as_ref().map(|e| e.qualified_name()),
            model: refs.model.as_ref().map(|m| m.qualified_name()),
            tools: refs
                .tools
                .iter()
                .flat_map(|t| t.targets.iter().map(|id| id.qualified_name()))
                .collect(),
        }
    }
}

/// Derives managed annotations from a snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationProjector;

impl AnnotationProjector {
    /// New projector.
    pub fn new() -> Self {
        Self
    }

    /// Never fails. Keys that cannot be derived are omitted.
    pub fn project(&self, agent: &ReconciledAgent) -> BTreeMap<String, String> {
        let mut annotations: BTreeMap<String, String> = agent
            .spec
            .annotations
            .iter()
            .flatten()
            .filter(|(key, _)| !MANAGED_ANNOTATIONS.contains(&key.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let icon_set = annotations
            .get(DASHBOARD_ICON_ANNOTATION)
            .is_some_and(|icon| !icon.trim().is_empty());
        if !icon_set {
            annotations.insert(
                DASHBOARD_ICON_ANNOTATION.to_string(),
                Self::icon(agent).to_string(),
            );
        }

        if agent.phase().is_callable() {
            annotations.insert(SERVICE_ANNOTATION.to_string(), agent.qualified_name());
        }

        if !agent.references.is_empty() {
            // Plain strings and an optional-field struct cannot fail to serialize.
            if let Ok(summary) = serde_json::to_string(&ResourceSummary::from(&agent.references)) {
                annotations.insert(RESOURCES_ANNOTATION.to_string(), summary);
            }
        }

        if let Some(address) = agent
            .a2a_address
            .as_deref()
            .filter(|a| agent.is_a2a && !a.is_empty())
        {
            annotations.insert(A2A_SERVER_ADDRESS_ANNOTATION.to_string(), address.to_string());
        }

        annotations
    }

    /// Derived icon name. Depends only on A2A status and resolved tools.
    pub fn icon(agent: &ReconciledAgent) -> &'static str {
        if agent.is_a2a {
            "network"
        } else if agent.references.has_tool_type(ToolType::Mcp) {
            "plug"
        } else if agent.references.has_tool_type(ToolType::Custom) {
            "wrench"
        } else {
            "bot"
        }
    }
}
