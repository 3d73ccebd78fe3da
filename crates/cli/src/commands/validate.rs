use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use plangate_agent::demo::demo_registry;
use plangate_core::config::AppConfig;
use plangate_core::{PlanValidator, RateLimiter};

use super::CommandResult;

pub fn run(config: &AppConfig, plan_path: &Path, json: bool) -> CommandResult {
    let raw = match fs::read_to_string(plan_path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                format!("could not read plan file `{}`: {error}", plan_path.display()),
                2,
            )
        }
    };
    let plan: Value = match serde_json::from_str(&raw) {
        Ok(plan) => plan,
        Err(error) => {
            return CommandResult::failure(
                format!("plan file `{}` is not valid JSON: {error}", plan_path.display()),
                2,
            )
        }
    };

    let validator =
        PlanValidator::new(config.policy.default_timezone.clone(), config.policy.max_plan_steps);
    let limiter = RateLimiter::new(config.limits.clone());
    let descriptors = demo_registry().descriptors();

    let validation = validator.validate(&plan, &descriptors, &limiter);
    let exit_code = u8::from(!validation.result.valid);

    if json {
        let payload = json!({
            "valid": validation.result.valid,
            "errors": validation.result.errors,
            "warnings": validation.result.warnings,
            "approvals": serde_json::to_value(&validation.approvals).unwrap_or_default(),
            "patched_plan": validation.patched_plan,
        });
        let output = serde_json::to_string_pretty(&payload)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
        return CommandResult { exit_code, output };
    }

    let mut lines =
        vec![format!("plan: {}", plan_path.display()), format!("valid: {}", validation.result.valid)];
    if !validation.result.errors.is_empty() {
        lines.push("errors:".to_string());
        for error in &validation.result.errors {
            lines.push(format!("  - {error}"));
        }
    }
    if !validation.result.warnings.is_empty() {
        lines.push("warnings:".to_string());
        for warning in &validation.result.warnings {
            lines.push(format!("  - {warning}"));
        }
    }
    if !validation.approvals.is_empty() {
        lines.push("approvals required:".to_string());
        for approval in &validation.approvals {
            lines.push(format!("  - {} ({})", approval.step_id, approval.tool));
        }
    }

    CommandResult { exit_code, output: lines.join("\n") }
}
