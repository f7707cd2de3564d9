//! CLI commands run against fixture files.

mod common;

use std::fs;
use std::sync::Arc;

use ark_reconciler::cli::commands::{list, reconcile};
use ark_reconciler::cli::output::CommandOutput;
use ark_reconciler::{AgentPhase, AgentReconciler, AgentSpec, Config};
use common::{fixture_store, temp_dir};

const RESOURCES: &str = r#"
- kind: Model
  name: gpt
  namespace: default
- kind: Secret
  name: creds
  namespace: default
  data:
    token: s3cr3t
- kind: McpServer
  name: github
  namespace: default
  labels:
    team: dev
"#;

#[tokio::test]
async fn test_reconcile_command_succeeds_for_ready_agent() {
    let dir = temp_dir();
    let resources = dir.path().join("resources.yaml");
    let agent = dir.path().join("agent.yaml");
    fs::write(&resources, RESOURCES).unwrap();
    fs::write(&agent, "name: a1\nmodelRef:\n  name: gpt\n").unwrap();

    let args = reconcile::ReconcileArgs {
        resources,
        namespace: "default".to_string(),
        agent_file: agent,
    };
    assert!(reconcile::execute(args, &Config::default(), true).await.is_ok());
}

#[tokio::test]
async fn test_reconcile_command_reports_error_phase_without_failing() {
    let dir = temp_dir();
    let resources = dir.path().join("resources.yaml");
    let agent = dir.path().join("agent.json");
    fs::write(&resources, RESOURCES).unwrap();
    fs::write(&agent, r#"{"name": "a1", "modelRef": {"name": "missing"}}"#).unwrap();

    let args = reconcile::ReconcileArgs {
        resources,
        namespace: "default".to_string(),
        agent_file: agent,
    };
    assert!(reconcile::execute(args, &Config::default(), true).await.is_ok());
}

#[test]
fn test_exit_status_by_phase() {
    assert_eq!(reconcile::exit_status(AgentPhase::Ready), 0);
    assert_eq!(reconcile::exit_status(AgentPhase::Degraded), 0);
    assert_eq!(reconcile::exit_status(AgentPhase::Error), reconcile::EXIT_AGENT_ERROR);
}

#[tokio::test]
async fn test_reconcile_command_missing_resources_file_fails() {
    let dir = temp_dir();
    let agent = dir.path().join("agent.yaml");
    fs::write(&agent, "name: a1\n").unwrap();

    let args = reconcile::ReconcileArgs {
        resources: dir.path().join("nope.yaml"),
        namespace: "default".to_string(),
        agent_file: agent,
    };

    assert!(reconcile::execute(args, &Config::default(), false).await.is_err());
}

#[tokio::test]
async fn test_reconcile_output_json_shape() {
    let reconciler = AgentReconciler::new(Arc::new(fixture_store()), &Config::default());
    let agent = reconciler
        .reconcile(&AgentSpec::new("default", "a1").with_model("gpt"))
        .await;

    let output = reconcile::ReconcileOutput::from(&agent);
    let json = output.to_json();

    assert_eq!(json["name"], "a1");
    assert_eq!(json["isA2A"], false);
    assert_eq!(json["status"]["phase"], "Ready");
    assert!(output.to_human().contains("Phase: Ready"));
}

#[tokio::test]
async fn test_list_command_creates_and_lists() {
    let dir = temp_dir();
    let resources = dir.path().join("resources.yaml");
    let agents = dir.path().join("agents.yaml");
    fs::write(&resources, RESOURCES).unwrap();
    fs::write(
        &agents,
        r#"
- name: a1
  modelRef:
    name: gpt
- name: a2
  tools:
    - type: mcp
      labelSelector:
        matchLabels:
          team: dev
"#,
    )
    .unwrap();

    let args = list::ListArgs {
        resources,
        namespace: "default".to_string(),
        agents_file: agents,
    };

    assert!(list::execute(args, &Config::default(), true).await.is_ok());
}

#[tokio::test]
async fn test_list_command_rejects_duplicate_names() {
    let dir = temp_dir();
    let resources = dir.path().join("resources.yaml");
    let agents = dir.path().join("agents.yaml");
    fs::write(&resources, RESOURCES).unwrap();
    fs::write(&agents, "- name: a1\n- name: a1\n").unwrap();

    let args = list::ListArgs {
        resources,
        namespace: "default".to_string(),
        agents_file: agents,
    };

    assert!(list::execute(args, &Config::default(), true).await.is_err());
}
