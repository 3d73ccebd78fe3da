use std::io::Write;

use serde_json::Value;
use tempfile::NamedTempFile;

use plangate_agent::demo::demo_registry;
use plangate_agent::AgentRuntime;
use plangate_cli::commands::{config, run, tools, validate};
use plangate_core::config::AppConfig;

#[tokio::test]
async fn run_waits_for_approval_on_high_risk_plan() {
    let runtime = AgentRuntime::new(AppConfig::default(), demo_registry());

    let result =
        run::run(&runtime, "Schedule a meeting tomorrow at 3pm with bob@example.com", &[], false)
            .await;

    assert_eq!(result.exit_code, 0);
    assert!(result.output.contains("status: waiting_for_approval"));
    assert!(result.output.contains("pending approvals:"));
    assert!(result.output.contains("--approve"));
}

#[tokio::test]
async fn run_json_payload_carries_plan_and_status() {
    let runtime = AgentRuntime::new(AppConfig::default(), demo_registry());

    let result = run::run(&runtime, "Read messages from #general and summarize", &[], true).await;

    assert_eq!(result.exit_code, 0);
    let payload: Value =
        serde_json::from_str(&result.output).expect("run output should be valid JSON");
    assert_eq!(payload["plan_source"], "offline_rules");
    assert!(payload["plan"]["steps"].is_array());
    assert_eq!(payload["status"], "done");
    assert!(payload["report"].as_str().unwrap_or_default().contains("Final Execution Report"));
}

#[tokio::test]
async fn run_rejects_empty_request() {
    let runtime = AgentRuntime::new(AppConfig::default(), demo_registry());

    let result = run::run(&runtime, "   ", &[], false).await;

    assert_eq!(result.exit_code, 1);
    assert!(result.output.contains("Request cannot be empty"));
}

#[test]
fn validate_accepts_well_formed_plan() {
    let plan = serde_json::json!({
        "goal": "post a note",
        "steps": [{
            "id": "S1",
            "action": "Post a message",
            "tool": "slack.post_message",
            "input": {"channel": "#general", "text": "hello"},
            "depends_on": []
        }]
    });
    let file = write_plan(&plan);

    let result = validate::run(&AppConfig::default(), file.path(), false);

    assert_eq!(result.exit_code, 0);
    assert!(result.output.contains("valid: true"));
    assert!(result.output.contains("approvals required:"));
}

#[test]
fn validate_reports_errors_for_hallucinated_tool() {
    let plan = serde_json::json!({
        "goal": "do the impossible",
        "steps": [{
            "id": "S1",
            "action": "Teleport",
            "tool": "teleport.now",
            "input": {},
            "depends_on": []
        }]
    });
    let file = write_plan(&plan);

    let result = validate::run(&AppConfig::default(), file.path(), true);

    assert_eq!(result.exit_code, 1);
    let payload: Value =
        serde_json::from_str(&result.output).expect("validate output should be valid JSON");
    assert_eq!(payload["valid"], false);
    let errors = payload["errors"].as_array().expect("errors array");
    assert!(errors.iter().any(|error| {
        error.as_str().unwrap_or_default().contains("invalid tool 'teleport.now'")
    }));
}

#[test]
fn validate_fails_cleanly_on_missing_file() {
    let result =
        validate::run(&AppConfig::default(), std::path::Path::new("/no/such/plan.json"), false);

    assert_eq!(result.exit_code, 2);
    assert!(result.output.contains("could not read plan file"));
}

#[test]
fn tools_lists_demo_registry_with_approval_flags() {
    let result = tools::run();

    assert_eq!(result.exit_code, 0);
    assert!(result.output.contains("calendar.create_event [requires approval]"));
    assert!(result.output.contains("slack.read_messages"));
    assert!(result.output.contains("required input: start_time, end_time"));
}

#[test]
fn config_shows_effective_defaults() {
    let result = config::run(&AppConfig::default());

    assert_eq!(result.exit_code, 0);
    assert!(result.output.contains("llm.provider = offline"));
    assert!(result.output.contains("policy.max_plan_steps = 6"));
    assert!(result.output.contains("llm.api_key = (unset)"));
}

fn write_plan(plan: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp plan file");
    file.write_all(plan.to_string().as_bytes()).expect("write plan JSON");
    file
}
