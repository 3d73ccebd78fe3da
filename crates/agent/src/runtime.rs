//! The pipeline: precheck → plan → validate → gate → execute → report.
//!
//! Planning is pluggable (LLM or offline rules) but everything after it is
//! deterministic. Approval re-entry goes through `execute_approved`, which
//! deliberately skips planning and revalidation so rate-limit and
//! duplicate checks never run twice for the same plan.

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use plangate_core::config::{AppConfig, LlmProvider};
use plangate_core::gate::{self, GateEvent, GateState};
use plangate_core::validator::precheck;
use plangate_core::{ApprovalRequest, PlanValidator, RateLimiter, ValidationResult};

use crate::executor::{self, ExecutionOutcome, ExecutionPolicy};
use crate::llm::{extract_json, planning_prompt, LlmClient, TodayContext};
use crate::planner;
use crate::report::generate_final_report;
use crate::tools::ToolRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanSource {
    Llm,
    OfflineRules,
}

impl PlanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::OfflineRules => "offline_rules",
        }
    }
}

/// Everything one request produces, whatever gate state it ends in.
#[derive(Debug)]
pub struct RunOutcome {
    pub correlation_id: String,
    pub status: GateState,
    pub validation: ValidationResult,
    pub approvals: Vec<ApprovalRequest>,
    pub plan: Value,
    pub plan_source: PlanSource,
    pub pipeline_warnings: Vec<String>,
    pub execution: Option<ExecutionOutcome>,
    pub report: Option<String>,
}

/// Result of resuming an already-validated plan after approval.
#[derive(Debug)]
pub struct ResumeOutcome {
    pub status: GateState,
    pub execution: ExecutionOutcome,
    pub report: Option<String>,
}

pub struct AgentRuntime {
    config: AppConfig,
    registry: ToolRegistry,
    limiter: RateLimiter,
    validator: PlanValidator,
    llm: Option<Box<dyn LlmClient>>,
}

impl AgentRuntime {
    pub fn new(config: AppConfig, registry: ToolRegistry) -> Self {
        let limiter = RateLimiter::new(config.limits.clone());
        let validator =
            PlanValidator::new(config.policy.default_timezone.clone(), config.policy.max_plan_steps);
        Self { config, registry, limiter, validator, llm: None }
    }

    pub fn with_llm(mut self, llm: Box<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Runs the full pipeline for one request. Steps listed in
    /// `approved_step_ids` count as pre-approved: when they cover every
    /// pending approval, the gate opens and execution proceeds in the same
    /// call.
    pub async fn handle_request(
        &self,
        user_request: &str,
        approved_step_ids: &[String],
    ) -> Result<RunOutcome> {
        self.handle_request_at(user_request, approved_step_ids, Local::now().fixed_offset()).await
    }

    /// Clock-injected variant of `handle_request` for deterministic tests.
    pub async fn handle_request_at(
        &self,
        user_request: &str,
        approved_step_ids: &[String],
        now: DateTime<FixedOffset>,
    ) -> Result<RunOutcome> {
        let correlation_id = Uuid::new_v4().to_string();
        let now_utc = now.with_timezone(&Utc);

        if let Err(error) = precheck::validate_user_request_at(user_request, &self.limiter, now_utc)
        {
            warn!(event_name = "runtime.precheck_rejected", correlation_id = %correlation_id, error = %error);
            return Ok(RunOutcome {
                correlation_id,
                status: GateState::Error,
                validation: ValidationResult::rejected(error),
                approvals: Vec::new(),
                plan: Value::Null,
                plan_source: PlanSource::OfflineRules,
                pipeline_warnings: Vec::new(),
                execution: None,
                report: None,
            });
        }

        let mut pipeline_warnings = Vec::new();
        let (plan, plan_source) = self.build_plan(user_request, now, &mut pipeline_warnings).await;
        info!(
            event_name = "runtime.plan_built",
            correlation_id = %correlation_id,
            plan_source = plan_source.as_str(),
        );

        let validation =
            self.validator.validate_at(&plan, &self.registry.descriptors(), &self.limiter, now_utc);
        info!(
            event_name = "runtime.validation_completed",
            correlation_id = %correlation_id,
            valid = validation.result.valid,
            error_count = validation.result.errors.len(),
            approval_count = validation.approvals.len(),
        );

        let mut status = GateState::after_validation(&validation.result, &validation.approvals);

        if status == GateState::WaitingForApproval {
            let all_granted = validation
                .approvals
                .iter()
                .all(|approval| approved_step_ids.contains(&approval.step_id));
            if all_granted {
                status = gate::apply(&status, &GateEvent::ApprovalsGranted)?;
            }
        }

        let mut execution = None;
        let mut report = None;
        if status == GateState::ReadyToExecute {
            let outcome = self
                .run_execution(&validation.patched_plan, approved_step_ids, &correlation_id)
                .await;
            status = outcome.gate.clone();
            if status == GateState::Done {
                report = Some(self.render_report(&validation.patched_plan, &outcome));
            }
            execution = Some(outcome);
        }

        Ok(RunOutcome {
            correlation_id,
            status,
            validation: validation.result,
            approvals: validation.approvals,
            plan: validation.patched_plan,
            plan_source,
            pipeline_warnings,
            execution,
            report,
        })
    }

    /// Resumes a previously validated plan once its approvals are granted.
    /// No planning, no revalidation: the plan passed the validator when it
    /// was produced, and re-running it would double-count rate limits.
    pub async fn execute_approved(
        &self,
        plan: &Value,
        approved_step_ids: &[String],
    ) -> ResumeOutcome {
        let correlation_id = Uuid::new_v4().to_string();
        let execution = self.run_execution(plan, approved_step_ids, &correlation_id).await;
        let status = execution.gate.clone();
        let report =
            (status == GateState::Done).then(|| self.render_report(plan, &execution));

        ResumeOutcome { status, execution, report }
    }

    async fn build_plan(
        &self,
        user_request: &str,
        now: DateTime<FixedOffset>,
        pipeline_warnings: &mut Vec<String>,
    ) -> (Value, PlanSource) {
        let timezone = self.config.policy.default_timezone.clone();

        if self.config.llm.provider != LlmProvider::Offline {
            if let Some(llm) = &self.llm {
                match self.plan_with_llm(llm.as_ref(), user_request, now, &timezone).await {
                    Ok(plan) => return (plan, PlanSource::Llm),
                    Err(error) => {
                        // Surfaced, not silent: the caller sees which
                        // planner produced the plan it is approving.
                        pipeline_warnings
                            .push(format!("LLM planner failed ({error}); used offline rules"));
                    }
                }
            }
        }

        (planner::build_plan(user_request, now, &timezone), PlanSource::OfflineRules)
    }

    async fn plan_with_llm(
        &self,
        llm: &dyn LlmClient,
        user_request: &str,
        now: DateTime<FixedOffset>,
        timezone: &str,
    ) -> Result<Value> {
        let context = TodayContext::at(now, timezone);
        let tools_json = serde_json::to_value(self.registry.descriptors())?;

        let mut previous_error: Option<String> = None;
        for _attempt in 0..=self.config.llm.max_retries {
            let prompt =
                planning_prompt(&context, user_request, &tools_json, previous_error.as_deref());
            match llm.complete(&prompt).await.and_then(|text| extract_json(&text)) {
                Ok(plan) => return Ok(plan),
                Err(error) => previous_error = Some(error.to_string()),
            }
        }

        Err(anyhow!(
            "planner failed after retries: {}",
            previous_error.unwrap_or_else(|| "no attempts made".to_string())
        ))
    }

    async fn run_execution(
        &self,
        plan: &Value,
        approved_step_ids: &[String],
        correlation_id: &str,
    ) -> ExecutionOutcome {
        let policy = ExecutionPolicy::from_policy(&self.config.policy);
        let outcome =
            executor::execute_plan(plan, &self.registry, approved_step_ids, &policy).await;
        info!(
            event_name = "runtime.execution_completed",
            correlation_id = %correlation_id,
            gate = outcome.gate.as_str(),
            step_count = outcome.outcomes.len(),
        );
        outcome
    }

    fn render_report(&self, plan: &Value, execution: &ExecutionOutcome) -> String {
        let goal = plan.get("goal").and_then(Value::as_str).unwrap_or_default();
        generate_final_report(goal, &execution.outcomes)
    }
}
