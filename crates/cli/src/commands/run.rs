use serde_json::json;

use plangate_agent::{AgentRuntime, RunOutcome};
use plangate_core::gate::GateState;

use super::CommandResult;

pub async fn run(
    runtime: &AgentRuntime,
    request: &str,
    approve: &[String],
    json: bool,
) -> CommandResult {
    let outcome = match runtime.handle_request(request, approve).await {
        Ok(outcome) => outcome,
        Err(error) => return CommandResult::failure(format!("run failed: {error}"), 2),
    };

    let exit_code = match outcome.status {
        GateState::Done | GateState::WaitingForApproval | GateState::ReadyToExecute => 0,
        GateState::Error | GateState::Failed => 1,
    };

    if json {
        return CommandResult { exit_code, output: render_json(&outcome) };
    }
    CommandResult { exit_code, output: render_text(&outcome) }
}

fn render_json(outcome: &RunOutcome) -> String {
    let execution = outcome.execution.as_ref().map(|execution| {
        json!({
            "gate": execution.gate.as_str(),
            "error": execution.error,
            "steps": serde_json::to_value(&execution.outcomes).unwrap_or_default(),
        })
    });

    let payload = json!({
        "correlation_id": outcome.correlation_id,
        "status": outcome.status.as_str(),
        "plan_source": outcome.plan_source.as_str(),
        "valid": outcome.validation.valid,
        "errors": outcome.validation.errors,
        "warnings": outcome.validation.warnings,
        "pipeline_warnings": outcome.pipeline_warnings,
        "approvals": serde_json::to_value(&outcome.approvals).unwrap_or_default(),
        "plan": outcome.plan,
        "execution": execution,
        "report": outcome.report,
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"))
}

fn render_text(outcome: &RunOutcome) -> String {
    let mut lines = vec![
        format!("status: {}", outcome.status.as_str()),
        format!("plan source: {}", outcome.plan_source.as_str()),
    ];

    for warning in &outcome.pipeline_warnings {
        lines.push(format!("note: {warning}"));
    }

    if !outcome.validation.errors.is_empty() {
        lines.push("errors:".to_string());
        for error in &outcome.validation.errors {
            lines.push(format!("  - {error}"));
        }
    }
    if !outcome.validation.warnings.is_empty() {
        lines.push("warnings:".to_string());
        for warning in &outcome.validation.warnings {
            lines.push(format!("  - {warning}"));
        }
    }

    if outcome.status == GateState::WaitingForApproval {
        lines.push("pending approvals:".to_string());
        for approval in &outcome.approvals {
            lines.push(format!("  - {} ({}): {}", approval.step_id, approval.tool, approval.reason));
            lines.push(format!("    input: {}", approval.input_preview));
        }
        let ids: Vec<&str> =
            outcome.approvals.iter().map(|approval| approval.step_id.as_str()).collect();
        lines.push(format!("re-run with --approve {} to execute", ids.join(",")));
    }

    if let Some(execution) = &outcome.execution {
        lines.push("execution:".to_string());
        for step in &execution.outcomes {
            let detail = step.detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default();
            lines.push(format!(
                "  - {} [{}] {}{detail}",
                step.step_id,
                step.status.as_str(),
                step.tool.as_deref().unwrap_or("-"),
            ));
        }
    }

    if let Some(report) = &outcome.report {
        lines.push(String::new());
        lines.push(report.clone());
    }

    lines.join("\n")
}
