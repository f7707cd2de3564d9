//! `reconcile`: run one pass over an agent file.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::commands::load_store;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{AgentDetailResponse, AgentPhase, Config, Diagnostic, ReconciledAgent};
use crate::services::AgentReconciler;

/// Exit status when the agent ends up in the `Error` phase.
pub const EXIT_AGENT_ERROR: u8 = 2;

/// Arguments for `reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// YAML list of backing resources (models, engines, ConfigMaps, Secrets, tools, MCP servers)
    #[arg(short, long)]
    pub resources: PathBuf,

    /// Namespace for agents that do not set one
    #[arg(short, long, default_value = "default")]
    pub namespace: String,

    /// Agent spec (YAML or JSON)
    pub agent_file: PathBuf,
}

/// Output of `reconcile`.
#[derive(Debug, Serialize)]
pub struct ReconcileOutput {
    /// Resolved view of the agent.
    #[serde(flatten)]
    pub detail: AgentDetailResponse,
    #[serde(skip)]
    phase: AgentPhase,
    #[serde(skip)]
    diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    resources: Vec<(String, String)>,
}

impl From<&ReconciledAgent> for ReconcileOutput {
    fn from(agent: &ReconciledAgent) -> Self {
        let mut resources = Vec::new();
        if let Some(engine) = &agent.references.execution_engine {
            resources.push(("Engine".to_string(), engine.qualified_name()));
        }
        if let Some(model) = &agent.references.model {
            resources.push(("Model".to_string(), model.qualified_name()));
        }
        for tool in &agent.references.tools {
            for target in &tool.targets {
                resources.push((format!("Tool ({})", tool.tool_type.as_str()), target.qualified_name()));
            }
        }

        Self {
            detail: AgentDetailResponse::from(agent),
            phase: agent.phase(),
            diagnostics: agent.diagnostics.clone(),
            resources,
        }
    }
}

impl CommandOutput for ReconcileOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Agent: {}/{}", self.detail.namespace, self.detail.name),
            format!("Phase: {}", self.phase),
        ];
        if self.detail.is_a2a {
            lines.push("A2A: yes".to_string());
        }

        if !self.resources.is_empty() {
            lines.push("\nResolved:".to_string());
            for (kind, name) in &self.resources {
                lines.push(format!("  {kind}: {name}"));
            }
        }

        if !self.detail.skills.is_empty() {
            let ids: Vec<_> = self.detail.skills.iter().map(|s| s.id.as_str()).collect();
            lines.push(format!("\nSkills: {}", ids.join(", ")));
        }

        if !self.detail.annotations.is_empty() {
            lines.push("\nAnnotations:".to_string());
            for (key, value) in &self.detail.annotations {
                lines.push(format!("  {key}: {value}"));
            }
        }

        if !self.diagnostics.is_empty() {
            lines.push(format!("\nDiagnostics ({}):", self.diagnostics.len()));
            lines.push(TableFormatter::new().format_diagnostics(&self.diagnostics));
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Reconcile one agent file and print the result.
pub async fn execute(args: ReconcileArgs, config: &Config, json_mode: bool) -> Result<ExitCode> {
    let store = load_store(&args.resources)?;
    let source = fs::read_to_string(&args.agent_file)
        .with_context(|| format!("Failed to read agent from {}", args.agent_file.display()))?;
    let body: serde_json::Value = serde_yaml::from_str(&source)
        .with_context(|| format!("{} is not valid YAML or JSON", args.agent_file.display()))?;

    let reconciler = AgentReconciler::new(Arc::new(store), config);
    let agent = reconciler.reconcile_value(&args.namespace, body).await;

    output(&ReconcileOutput::from(&agent), json_mode);

    Ok(ExitCode::from(exit_status(agent.phase())))
}

/// Process exit status for a reconciled phase.
pub fn exit_status(phase: AgentPhase) -> u8 {
    if phase == AgentPhase::Error {
        EXIT_AGENT_ERROR
    } else {
        0
    }
}
