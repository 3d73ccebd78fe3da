//! The neurosymbolic plan validator: deterministic checks applied to an
//! LLM- or rule-produced plan before anything executes.
//!
//! Validation is a batch consistency check, not a fail-fast scan. Every
//! step is fully checked and every problem collected, because the caller
//! must be able to show all of them at once. The only plan mutation the
//! validator performs is the timezone policy patch; everything downstream
//! treats the patched plan as read-only.

pub mod domain;
pub mod precheck;
pub mod rules;
pub mod schema;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::tool::ToolDescriptor;
use crate::domain::verdict::{ApprovalRequest, ValidationResult};
use crate::ratelimit::RateLimiter;
use crate::validator::domain::{CALENDAR_CREATE_EVENT, SLACK_POST_MESSAGE};

const APPROVAL_REASON: &str = "High-risk tool requires approval";
const CALENDAR_TOOL_PREFIX: &str = "calendar.";

/// Everything a validation pass produces. `patched_plan` always carries
/// the (possibly timezone-rewritten) inputs, even when invalid, so a
/// caller can show the user what would have run. Approvals are computed
/// independently of validity; errors take precedence at the call site.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanValidation {
    pub result: ValidationResult,
    pub approvals: Vec<ApprovalRequest>,
    pub patched_plan: Value,
}

/// Deterministic plan validator. Stateless apart from the injected rate
/// limiter; running it twice over the same plan yields identical errors.
#[derive(Clone, Debug)]
pub struct PlanValidator {
    default_timezone: String,
    max_plan_steps: usize,
}

impl PlanValidator {
    pub fn new(default_timezone: impl Into<String>, max_plan_steps: usize) -> Self {
        Self { default_timezone: default_timezone.into(), max_plan_steps }
    }

    pub fn default_timezone(&self) -> &str {
        &self.default_timezone
    }

    /// Validates a raw plan against the supplied tool registry.
    ///
    /// The limiter is consulted once per (step, tool); a rate-limit
    /// rejection blocks execution exactly like a schema violation.
    pub fn validate(
        &self,
        plan: &Value,
        tools: &[ToolDescriptor],
        limiter: &RateLimiter,
    ) -> PlanValidation {
        self.validate_at(plan, tools, limiter, Utc::now())
    }

    /// Clock-injected variant of `validate` for deterministic tests.
    pub fn validate_at(
        &self,
        plan: &Value,
        tools: &[ToolDescriptor],
        limiter: &RateLimiter,
        now: DateTime<Utc>,
    ) -> PlanValidation {
        let Some(plan_object) = plan.as_object() else {
            return Self::early_rejection(plan, "Plan missing 'steps'");
        };
        if !plan_object.contains_key("steps") {
            return Self::early_rejection(plan, "Plan missing 'steps'");
        }
        let steps = match plan_object.get("steps").and_then(Value::as_array) {
            Some(steps) if !steps.is_empty() => steps,
            _ => return Self::early_rejection(plan, "Plan has no steps"),
        };

        let registry: HashMap<&str, &ToolDescriptor> =
            tools.iter().map(|descriptor| (descriptor.name.as_str(), descriptor)).collect();

        let mut result = ValidationResult::default();
        let mut approvals = Vec::new();

        if steps.len() > self.max_plan_steps {
            result.record_error(format!(
                "Plan has too many steps: {} (maximum {})",
                steps.len(),
                self.max_plan_steps
            ));
        }

        // First pass: step ids by position, so dependency back-references
        // resolve by index rather than mere existence.
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (index, step) in steps.iter().enumerate() {
            match step.get("id").and_then(Value::as_str) {
                Some(id) => {
                    positions.insert(id, index);
                }
                None => result.record_error("Each step must have string 'id'"),
            }
        }

        let mut patched_steps = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let step_id = step.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
            let mut input =
                step.get("input").cloned().unwrap_or_else(|| Value::Object(Map::new()));

            self.check_dependencies(step, &step_id, index, &positions, &mut result);

            let descriptor = Self::check_tool(step, &step_id, &registry, &mut result);

            if let Some(descriptor) = descriptor {
                let decision = limiter.check_and_record_at(&descriptor.name, None, now);
                if !decision.allowed {
                    let reason =
                        decision.reason.unwrap_or_else(|| "Rate limit exceeded".to_string());
                    result.record_error(format!("{step_id}: {reason}"));
                }

                if !input.is_object() {
                    result.record_error(format!(
                        "{step_id}: input must be an object for tool '{}'",
                        descriptor.name
                    ));
                } else {
                    for error in schema::conformance_errors(&descriptor.input_schema, &input) {
                        result.record_error(format!(
                            "{step_id}: input schema mismatch for '{}': {error}",
                            descriptor.name
                        ));
                    }

                    let domain_errors = match descriptor.name.as_str() {
                        CALENDAR_CREATE_EVENT => domain::validate_calendar_event_input(&input, now),
                        SLACK_POST_MESSAGE => domain::validate_slack_message_input(&input),
                        _ => Vec::new(),
                    };
                    for error in domain_errors {
                        result.record_error(format!("{step_id}: {error}"));
                    }
                }

                self.patch_timezone(&descriptor.name, &step_id, &mut input, &mut result);

                // Approval gating is independent of step validity: an
                // invalid high-risk step is both an error and an approval
                // candidate, and errors dominate at the call site. The
                // preview reflects the patched input that would run.
                if descriptor.requires_approval {
                    approvals.push(ApprovalRequest {
                        step_id: step_id.clone(),
                        tool: descriptor.name.clone(),
                        reason: APPROVAL_REASON.to_string(),
                        input_preview: input.clone(),
                    });
                }
            }

            let mut patched_step = step.as_object().cloned().unwrap_or_default();
            patched_step.insert("input".to_string(), input);
            patched_steps.push(Value::Object(patched_step));
        }

        let mut patched_plan = Map::new();
        patched_plan.insert(
            "goal".to_string(),
            plan_object.get("goal").cloned().unwrap_or_else(|| Value::String(String::new())),
        );
        patched_plan.insert("steps".to_string(), Value::Array(patched_steps));

        PlanValidation { result, approvals, patched_plan: Value::Object(patched_plan) }
    }

    fn early_rejection(plan: &Value, error: &str) -> PlanValidation {
        PlanValidation {
            result: ValidationResult::rejected(error),
            approvals: Vec::new(),
            patched_plan: plan.clone(),
        }
    }

    fn check_dependencies(
        &self,
        step: &Value,
        step_id: &str,
        position: usize,
        positions: &HashMap<&str, usize>,
        result: &mut ValidationResult,
    ) {
        match step.get("depends_on") {
            None => {}
            Some(Value::Array(dependencies)) => {
                for dependency in dependencies {
                    let Some(dependency_id) = dependency.as_str() else {
                        result.record_error(format!(
                            "{step_id}: unknown dependency {}",
                            render_value(dependency)
                        ));
                        continue;
                    };
                    match positions.get(dependency_id) {
                        None => result.record_error(format!(
                            "{step_id}: unknown dependency {dependency_id}"
                        )),
                        Some(&dependency_position) if dependency_position >= position => {
                            result.record_error(format!(
                                "{step_id}: depends_on must reference earlier steps only (bad: {dependency_id})"
                            ));
                        }
                        Some(_) => {}
                    }
                }
            }
            Some(_) => result.record_error(format!("{step_id}: depends_on must be a list")),
        }
    }

    fn check_tool<'a>(
        step: &Value,
        step_id: &str,
        registry: &HashMap<&str, &'a ToolDescriptor>,
        result: &mut ValidationResult,
    ) -> Option<&'a ToolDescriptor> {
        let tool_value = step.get("tool").filter(|value| !value.is_null())?;

        let Some(tool_name) = tool_value.as_str() else {
            result.record_error(format!(
                "{step_id}: invalid tool '{}' (hallucination or not allowed)",
                render_value(tool_value)
            ));
            return None;
        };

        match registry.get(tool_name) {
            Some(descriptor) => Some(descriptor),
            None => {
                result.record_error(format!(
                    "{step_id}: invalid tool '{tool_name}' (hallucination or not allowed)"
                ));
                None
            }
        }
    }

    fn patch_timezone(
        &self,
        tool_name: &str,
        step_id: &str,
        input: &mut Value,
        result: &mut ValidationResult,
    ) {
        if !tool_name.starts_with(CALENDAR_TOOL_PREFIX) {
            return;
        }
        let Some(input_map) = input.as_object_mut() else {
            return;
        };
        let Some(timezone) = input_map.get("timezone").and_then(Value::as_str) else {
            return;
        };
        if timezone.is_empty() || timezone == self.default_timezone {
            return;
        }

        result.record_warning(format!(
            "{step_id}: timezone '{timezone}' replaced with default '{}'",
            self.default_timezone
        ));
        input_map
            .insert("timezone".to_string(), Value::String(self.default_timezone.clone()));
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
