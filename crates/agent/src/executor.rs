//! Sequential plan executor. Runs only plans that already passed the
//! validator, and still refuses high-risk steps without an approval - the
//! gate upstream is the policy, this check is defense in depth.

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use plangate_core::config::PolicyConfig;
use plangate_core::gate::GateState;

use crate::tools::{PriorOutputs, ToolRegistry};

#[derive(Clone, Debug)]
pub struct ExecutionPolicy {
    pub high_risk_prefixes: Vec<String>,
    pub tool_timeout: Duration,
}

impl ExecutionPolicy {
    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self {
            high_risk_prefixes: policy.high_risk_prefixes.clone(),
            tool_timeout: Duration::from_secs(policy.tool_timeout_secs),
        }
    }

    fn needs_approval(&self, tool_name: &str) -> bool {
        self.high_risk_prefixes.iter().any(|prefix| tool_name.starts_with(prefix))
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::from_policy(&PolicyConfig::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Skipped,
    Blocked,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Skipped => "skipped",
            Self::Blocked => "blocked",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct StepOutcome {
    pub step_id: String,
    pub action: String,
    pub tool: Option<String>,
    pub status: StepStatus,
    pub output: Option<Value>,
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Error)]
pub enum ExecutionError {
    #[error("tool `{tool}` timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },
    #[error("tool `{tool}` failed: {message}")]
    Tool { tool: String, message: String },
    #[error("tool `{tool}` is not registered")]
    UnknownTool { tool: String },
}

/// Result of one execution pass: per-step outcomes in plan order, the gate
/// state the run ends in, and the aborting error when there was one.
#[derive(Clone, Debug)]
pub struct ExecutionOutcome {
    pub outcomes: Vec<StepOutcome>,
    pub gate: GateState,
    pub error: Option<String>,
}

/// Executes a validated plan strictly in order.
///
/// Steps without a tool are skipped. High-risk steps whose id is not in
/// `approved_step_ids` are blocked without failing the run. The first tool
/// error or timeout aborts the remaining steps and flips the gate to
/// `Failed`, preserving the partial results gathered so far.
pub async fn execute_plan(
    plan: &Value,
    registry: &ToolRegistry,
    approved_step_ids: &[String],
    policy: &ExecutionPolicy,
) -> ExecutionOutcome {
    let empty = Vec::new();
    let steps = plan.get("steps").and_then(Value::as_array).unwrap_or(&empty);

    let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(steps.len());
    let mut prior = PriorOutputs::default();

    for step in steps {
        let step_id = step.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
        let action = step.get("action").and_then(Value::as_str).unwrap_or_default().to_string();
        let input = step
            .get("input")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let Some(tool_name) = step.get("tool").and_then(Value::as_str) else {
            outcomes.push(StepOutcome {
                step_id,
                action,
                tool: None,
                status: StepStatus::Skipped,
                output: None,
                detail: Some("No tool".to_string()),
            });
            continue;
        };

        if policy.needs_approval(tool_name) && !approved_step_ids.contains(&step_id) {
            warn!(event_name = "executor.step_blocked", step_id = %step_id, tool = %tool_name);
            outcomes.push(StepOutcome {
                step_id,
                action,
                tool: Some(tool_name.to_string()),
                status: StepStatus::Blocked,
                output: None,
                detail: Some("Needs approval".to_string()),
            });
            continue;
        }

        let result = match registry.get(tool_name) {
            None => Err(ExecutionError::UnknownTool { tool: tool_name.to_string() }),
            Some(tool) => {
                match tokio::time::timeout(policy.tool_timeout, tool.execute(input, &prior)).await {
                    Err(_) => Err(ExecutionError::Timeout {
                        tool: tool_name.to_string(),
                        secs: policy.tool_timeout.as_secs(),
                    }),
                    Ok(Err(error)) => Err(ExecutionError::Tool {
                        tool: tool_name.to_string(),
                        message: error.to_string(),
                    }),
                    Ok(Ok(output)) => Ok(output),
                }
            }
        };

        match result {
            Ok(output) => {
                info!(event_name = "executor.step_completed", step_id = %step_id, tool = %tool_name);
                prior.record(step_id.clone(), output.clone());
                outcomes.push(StepOutcome {
                    step_id,
                    action,
                    tool: Some(tool_name.to_string()),
                    status: StepStatus::Ok,
                    output: Some(output),
                    detail: None,
                });
            }
            Err(error) => {
                let message = error.to_string();
                warn!(event_name = "executor.step_failed", step_id = %step_id, tool = %tool_name, error = %message);
                outcomes.push(StepOutcome {
                    step_id,
                    action,
                    tool: Some(tool_name.to_string()),
                    status: StepStatus::Error,
                    output: None,
                    detail: Some(message.clone()),
                });
                return ExecutionOutcome {
                    outcomes,
                    gate: GateState::Failed,
                    error: Some(message),
                };
            }
        }
    }

    ExecutionOutcome { outcomes, gate: GateState::Done, error: None }
}
