//! `list`: reconcile a batch of agents and summarize them.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::memory::InMemoryAgentRepository;
use crate::cli::commands::load_store;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{AgentCreateRequest, AgentListResponse, Config};
use crate::services::{AgentReconciler, AgentService};

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// YAML list of backing resources
    #[arg(short, long)]
    pub resources: PathBuf,

    /// Namespace the agents are created in
    #[arg(short, long, default_value = "default")]
    pub namespace: String,

    /// YAML list of agent create requests
    pub agents_file: PathBuf,
}

/// Output of `list`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ListOutput(pub AgentListResponse);

impl CommandOutput for ListOutput {
    fn to_human(&self) -> String {
        if self.0.items().is_empty() {
            return "No agents found.".to_string();
        }
        format!(
            "Found {} agent(s):\n{}",
            self.0.count(),
            TableFormatter::new().format_agents(self.0.items())
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Reconcile every agent in the file and print the list.
pub async fn execute(args: ListArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = load_store(&args.resources)?;
    let source = fs::read_to_string(&args.agents_file)
        .with_context(|| format!("Failed to read agents from {}", args.agents_file.display()))?;
    let requests: Vec<AgentCreateRequest> = serde_yaml::from_str(&source)
        .with_context(|| format!("Failed to parse agents in {}", args.agents_file.display()))?;

    let reconciler = Arc::new(AgentReconciler::new(Arc::new(store), config));
    let service = AgentService::new(reconciler, Arc::new(InMemoryAgentRepository::new()));

    for request in requests {
        let name = request.name.clone();
        service
            .create(&args.namespace, request)
            .await
            .with_context(|| format!("Failed to create agent {name}"))?;
    }

    output(&ListOutput(service.list(&args.namespace).await?), json_mode);
    Ok(())
}
