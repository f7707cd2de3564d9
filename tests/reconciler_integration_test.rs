//! End-to-end reconciliation passes against the in-memory store.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ark_reconciler::domain::models::annotations::{
    A2A_SERVER_ADDRESS_ANNOTATION, DASHBOARD_ICON_ANNOTATION, RESOURCES_ANNOTATION,
    SERVICE_ANNOTATION,
};
use ark_reconciler::domain::models::{
    LabelSelector, Parameter, ResourceKind, SecretKeyRef, Severity, Skill, Tool, ValueFrom,
};
use ark_reconciler::{AgentPhase, AgentReconciler, AgentSpec, Config, ReconcileOutcome};
use common::{fixture_store, reconciler};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn mcp_tool(team: &str) -> Tool {
    Tool {
        tool_type: "mcp".to_string(),
        name: None,
        label_selector: Some(LabelSelector {
            match_labels: Some([("team".to_string(), team.to_string())].into()),
            match_expressions: None,
        }),
    }
}

fn codes(agent: &ark_reconciler::ReconciledAgent) -> Vec<&'static str> {
    agent.diagnostics.iter().map(|d| d.code).collect()
}

#[tokio::test]
async fn test_fully_resolved_agent_is_ready() {
    common::setup_test_logging();
    let reconciler = reconciler(fixture_store());
    let spec = AgentSpec::new("default", "researcher")
        .with_model("gpt")
        .with_execution_engine("langchain")
        .with_parameter(Parameter::literal("tone", "formal"))
        .with_parameter(Parameter::from_source(
            "token",
            ValueFrom::SecretKeyRef(SecretKeyRef {
                key: "token".to_string(),
                name: "creds".to_string(),
                optional: None,
            }),
        ))
        .with_tool(Tool::new("custom", Some("search")))
        .with_tool(mcp_tool("dev"))
        .with_skill(Skill::new("s1", "Search").with_tags(["web", "web"]));

    let agent = reconciler.reconcile(&spec).await;

    assert_eq!(agent.phase(), AgentPhase::Ready, "{:?}", agent.diagnostics);
    assert!(agent.diagnostics.is_empty());
    assert_eq!(agent.parameters.len(), 2);
    assert_eq!(
        agent.parameters.get("token").and_then(|v| v.as_deref()),
        Some("s3cr3t")
    );
    assert_eq!(agent.references.model.as_ref().map(|m| m.name.as_str()), Some("gpt"));
    assert_eq!(agent.references.tools.len(), 2);
    assert_eq!(agent.skills[0].tags, Some(vec!["web".to_string()]));

    assert_eq!(agent.annotations[DASHBOARD_ICON_ANNOTATION], "plug");
    assert_eq!(agent.annotations[SERVICE_ANNOTATION], "default/researcher");
    let resources: serde_json::Value =
        serde_json::from_str(&agent.annotations[RESOURCES_ANNOTATION]).unwrap();
    assert!(resources.get("model").is_some());
    assert!(!agent.annotations.contains_key(A2A_SERVER_ADDRESS_ANNOTATION));
}

#[tokio::test]
async fn test_conflicting_parameter_is_never_ready() {
    let reconciler = reconciler(fixture_store());
    let mut parameter = Parameter::literal("p1", "x");
    parameter.value_from = Some(ValueFrom::SecretKeyRef(SecretKeyRef {
        key: "token".to_string(),
        name: "creds".to_string(),
        optional: None,
    }));
    let spec = AgentSpec::new("default", "a1").with_model("gpt").with_parameter(parameter);

    let agent = reconciler.reconcile(&spec).await;

    assert_eq!(agent.phase(), AgentPhase::Error);
    assert!(codes(&agent).contains(&"ParameterError.Conflict"));
    assert!(!agent.annotations.contains_key(SERVICE_ANNOTATION));
}

#[tokio::test]
async fn test_duplicate_parameter_request_is_error() {
    let reconciler = reconciler(fixture_store());
    let body = json!({
        "name": "a1",
        "modelRef": {"name": "gpt"},
        "parameters": [
            {"name": "p1", "value": "x"},
            {"name": "p1", "valueFrom": {"configMapKeyRef": {"name": "settings", "key": "region"}}}
        ]
    });

    let agent = reconciler.reconcile_value("default", body).await;

    assert_eq!(agent.phase(), AgentPhase::Error);
    assert_eq!(codes(&agent), vec!["ParameterError.Duplicate"]);
    assert_eq!(agent.parameters.get("p1").and_then(|v| v.as_deref()), Some("x"));
}

#[tokio::test]
async fn test_custom_tool_without_name_is_error() {
    let reconciler = reconciler(fixture_store());
    let body = json!({"name": "a1", "modelRef": {"name": "gpt"}, "tools": [{"type": "custom"}]});

    let agent = reconciler.reconcile_value("default", body).await;

    assert_eq!(agent.phase(), AgentPhase::Error);
    assert_eq!(codes(&agent), vec!["ToolError.MissingName"]);
    assert_eq!(agent.diagnostics[0].field_path, "spec.tools[0]");
}

#[tokio::test]
async fn test_missing_optional_secret_degrades() {
    let reconciler = reconciler(fixture_store());
    let body = json!({
        "name": "a1",
        "modelRef": {"name": "gpt"},
        "parameters": [
            {"name": "api", "valueFrom": {"secretKeyRef": {"name": "absent", "key": "k", "optional": true}}}
        ]
    });

    let agent = reconciler.reconcile_value("default", body).await;

    assert_eq!(agent.phase(), AgentPhase::Degraded);
    assert_eq!(agent.diagnostics.len(), 1);
    let diagnostic = &agent.diagnostics[0];
    assert_eq!(diagnostic.code, "ReferenceError.NotFound");
    assert!(diagnostic.optional);
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert!(agent.parameters.get("api").is_some_and(|v| v.is_absent()));
    assert!(agent.annotations.contains_key(SERVICE_ANNOTATION));
}

#[tokio::test]
async fn test_duplicate_skill_id_is_error() {
    let reconciler = reconciler(fixture_store());
    let body = json!({
        "name": "a1",
        "modelRef": {"name": "gpt"},
        "skills": [{"id": "s1", "name": "Search"}, {"id": "s1", "name": "Search2"}]
    });

    let agent = reconciler.reconcile_value("default", body).await;

    assert_eq!(agent.phase(), AgentPhase::Error);
    assert_eq!(codes(&agent), vec!["SkillError.DuplicateId"]);
}

#[tokio::test]
async fn test_undecodable_body_is_error_with_name() {
    let reconciler = reconciler(fixture_store());
    let body = json!({"name": "a1", "tools": "not-a-list"});

    let agent = reconciler.reconcile_value("default", body).await;

    assert_eq!(agent.phase(), AgentPhase::Error);
    assert_eq!(codes(&agent), vec!["StructuralError.Decode"]);
    assert_eq!(agent.spec.name, "a1");
}

#[tokio::test]
async fn test_undecodable_body_keeps_its_namespace() {
    let reconciler = reconciler(fixture_store());
    let body = json!({"name": "a1", "namespace": "team-a", "tools": "bad"});

    let agent = reconciler.reconcile_value("default", body).await;

    assert_eq!(agent.phase(), AgentPhase::Error);
    assert_eq!(agent.spec.namespace, "team-a");
    assert_eq!(agent.qualified_name(), "team-a/a1");
    assert_eq!(reconciler.locks().active(), 0);
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let reconciler = reconciler(fixture_store());
    let spec = AgentSpec::new("default", "a1")
        .with_model("missing")
        .with_tool(Tool::new("custom", None))
        .with_tool(Tool::new("rocket", None))
        .with_tool(mcp_tool("ops"))
        .with_parameter(Parameter {
            name: "p".to_string(),
            value: None,
            value_from: None,
        });

    let first = reconciler.reconcile(&spec).await;
    let second = reconciler.reconcile(&spec).await;

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn test_slow_store_reports_timeout() {
    let mut config = Config::default();
    config.resolver.timeout_ms = 20;
    let store = fixture_store().with_latency(Duration::from_millis(200));
    let reconciler = AgentReconciler::new(Arc::new(store), &config);

    let agent = reconciler
        .reconcile(&AgentSpec::new("default", "a1").with_model("gpt"))
        .await;

    assert_eq!(agent.phase(), AgentPhase::Error);
    assert_eq!(codes(&agent), vec!["ReferenceError.Timeout"]);
}

#[tokio::test]
async fn test_unavailable_optional_secret_degrades() {
    let store = fixture_store().with_unavailable(ResourceKind::Secret);
    let reconciler = reconciler(store);
    let spec = AgentSpec::new("default", "a1").with_model("gpt").with_parameter(
        Parameter::from_source(
            "token",
            ValueFrom::SecretKeyRef(SecretKeyRef {
                key: "token".to_string(),
                name: "creds".to_string(),
                optional: Some(true),
            }),
        ),
    );

    let agent = reconciler.reconcile(&spec).await;

    assert_eq!(agent.phase(), AgentPhase::Degraded);
    assert_eq!(codes(&agent), vec!["ReferenceError.Unavailable"]);
}

#[tokio::test]
async fn test_a2a_annotation_marks_agent() {
    let reconciler = reconciler(fixture_store());
    let spec = AgentSpec::new("default", "remote")
        .with_model("gpt")
        .with_annotation(A2A_SERVER_ADDRESS_ANNOTATION, "http://remote:8080");

    let agent = reconciler.reconcile(&spec).await;

    assert!(agent.is_a2a);
    assert_eq!(agent.annotations[DASHBOARD_ICON_ANNOTATION], "network");
    assert_eq!(agent.annotations[A2A_SERVER_ADDRESS_ANNOTATION], "http://remote:8080");
}

#[tokio::test]
async fn test_cancelled_pass_publishes_nothing() {
    let store = fixture_store().with_latency(Duration::from_millis(300));
    let reconciler = reconciler(store);
    let spec = AgentSpec::new("default", "a1").with_model("gpt");
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        })
    };

    let started = Instant::now();
    let outcome = reconciler.reconcile_with_cancel(&spec, &token).await;
    canceller.await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Cancelled));
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(reconciler.locks().active(), 0);
}

#[tokio::test]
async fn test_pass_cancelled_while_waiting_for_lock_leaves_no_slot() {
    let reconciler = reconciler(fixture_store());
    let spec = AgentSpec::new("default", "a1").with_model("gpt");
    let token = CancellationToken::new();
    let holder = reconciler.locks().acquire("default", "a1").await;

    let (outcome, ()) = tokio::join!(reconciler.reconcile_with_cancel(&spec, &token), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(holder);
        token.cancel();
    });

    assert!(matches!(outcome, ReconcileOutcome::Cancelled));
    assert_eq!(reconciler.locks().active(), 0);
}

#[tokio::test]
async fn test_pass_cancelled_before_holder_releases_leaves_no_slot() {
    let reconciler = reconciler(fixture_store());
    let spec = AgentSpec::new("default", "a1").with_model("gpt");
    let token = CancellationToken::new();
    let holder = reconciler.locks().acquire("default", "a1").await;

    let (outcome, ()) = tokio::join!(reconciler.reconcile_with_cancel(&spec, &token), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });
    assert!(matches!(outcome, ReconcileOutcome::Cancelled));
    assert_eq!(reconciler.locks().active(), 1);

    drop(holder);
    assert_eq!(reconciler.locks().active(), 0);
}

#[tokio::test]
async fn test_uncancelled_pass_completes() {
    let reconciler = reconciler(fixture_store());
    let token = CancellationToken::new();

    let outcome = reconciler
        .reconcile_with_cancel(&AgentSpec::new("default", "a1").with_model("gpt"), &token)
        .await;

    let agent = outcome.into_snapshot().expect("pass should complete");
    assert_eq!(agent.phase(), AgentPhase::Ready);
}

#[tokio::test]
async fn test_same_identity_passes_are_serialized() {
    let latency = Duration::from_millis(50);
    let reconciler = Arc::new(reconciler(fixture_store().with_latency(latency)));
    let spec = AgentSpec::new("default", "a1").with_model("gpt");

    let started = Instant::now();
    let (first, second) = tokio::join!(reconciler.reconcile(&spec), reconciler.reconcile(&spec));

    assert!(started.elapsed() >= latency * 2);
    assert_eq!(first, second);
    assert_eq!(reconciler.locks().active(), 0);
}

#[tokio::test]
async fn test_distinct_identities_run_concurrently() {
    let latency = Duration::from_millis(100);
    let reconciler = Arc::new(reconciler(fixture_store().with_latency(latency)));
    let a = AgentSpec::new("default", "a1").with_model("gpt");
    let b = AgentSpec::new("default", "a2").with_model("gpt");

    let started = Instant::now();
    let (first, second) = tokio::join!(reconciler.reconcile(&a), reconciler.reconcile(&b));

    assert!(started.elapsed() < latency * 2);
    assert_eq!(first.phase(), AgentPhase::Ready);
    assert_eq!(second.phase(), AgentPhase::Ready);
}
