//! Execution gate: the state machine that decides whether a validated plan
//! may run. Errors dominate approvals, approvals dominate readiness.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::verdict::{ApprovalRequest, ValidationResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Error,
    WaitingForApproval,
    ReadyToExecute,
    Done,
    Failed,
}

impl GateState {
    /// Gate decision straight after validation. Precedence is fixed:
    /// any error wins, then pending approvals, then ready.
    pub fn after_validation(result: &ValidationResult, approvals: &[ApprovalRequest]) -> Self {
        if !result.valid || !result.errors.is_empty() {
            Self::Error
        } else if !approvals.is_empty() {
            Self::WaitingForApproval
        } else {
            Self::ReadyToExecute
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::WaitingForApproval => "waiting_for_approval",
            Self::ReadyToExecute => "ready_to_execute",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "waiting_for_approval" => Some(Self::WaitingForApproval),
            "ready_to_execute" => Some(Self::ReadyToExecute),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal states accept no further events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error | Self::Done | Self::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateEvent {
    ApprovalsGranted,
    ApprovalsDenied,
    ExecutionSucceeded,
    ExecutionFailed,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GateTransitionError {
    #[error("invalid gate transition from {state:?} using event {event:?}")]
    InvalidTransition { state: GateState, event: GateEvent },
}

/// Applies an event to the current gate state, rejecting transitions the
/// pipeline never performs.
pub fn apply(state: &GateState, event: &GateEvent) -> Result<GateState, GateTransitionError> {
    use GateEvent::{ApprovalsDenied, ApprovalsGranted, ExecutionFailed, ExecutionSucceeded};
    use GateState::{Failed, ReadyToExecute, WaitingForApproval};

    let next = match (state, event) {
        (WaitingForApproval, ApprovalsGranted) => ReadyToExecute,
        (WaitingForApproval, ApprovalsDenied) => Failed,
        (ReadyToExecute, ExecutionSucceeded) => GateState::Done,
        (ReadyToExecute, ExecutionFailed) => Failed,
        _ => {
            return Err(GateTransitionError::InvalidTransition {
                state: state.clone(),
                event: event.clone(),
            })
        }
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use crate::domain::verdict::{ApprovalRequest, ValidationResult};

    use super::{apply, GateEvent, GateState, GateTransitionError};

    fn one_approval() -> Vec<ApprovalRequest> {
        vec![ApprovalRequest {
            step_id: "S1".to_string(),
            tool: "slack.post_message".to_string(),
            reason: "High-risk tool requires approval".to_string(),
            input_preview: serde_json::json!({}),
        }]
    }

    #[test]
    fn errors_dominate_pending_approvals() {
        let mut result = ValidationResult::default();
        result.record_error("S1: bad");
        assert_eq!(GateState::after_validation(&result, &one_approval()), GateState::Error);
    }

    #[test]
    fn approvals_dominate_readiness() {
        let result = ValidationResult::default();
        assert_eq!(
            GateState::after_validation(&result, &one_approval()),
            GateState::WaitingForApproval
        );
    }

    #[test]
    fn clean_validation_is_ready() {
        let result = ValidationResult::default();
        assert_eq!(GateState::after_validation(&result, &[]), GateState::ReadyToExecute);
    }

    #[test]
    fn warnings_do_not_block_readiness() {
        let mut result = ValidationResult::default();
        result.record_warning("S1: timezone patched");
        assert_eq!(GateState::after_validation(&result, &[]), GateState::ReadyToExecute);
    }

    #[test]
    fn happy_path_transitions() {
        let ready =
            apply(&GateState::WaitingForApproval, &GateEvent::ApprovalsGranted).expect("ready");
        assert_eq!(ready, GateState::ReadyToExecute);
        let done = apply(&ready, &GateEvent::ExecutionSucceeded).expect("done");
        assert_eq!(done, GateState::Done);
        assert!(done.is_terminal());
    }

    #[test]
    fn execution_failure_lands_in_failed() {
        assert_eq!(
            apply(&GateState::ReadyToExecute, &GateEvent::ExecutionFailed),
            Ok(GateState::Failed)
        );
    }

    #[test]
    fn terminal_states_reject_events() {
        let error = apply(&GateState::Done, &GateEvent::ApprovalsGranted).expect_err("terminal");
        assert!(matches!(error, GateTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn storage_encoding_round_trips() {
        for state in [
            GateState::Error,
            GateState::WaitingForApproval,
            GateState::ReadyToExecute,
            GateState::Done,
            GateState::Failed,
        ] {
            assert_eq!(GateState::parse(state.as_str()), Some(state));
        }
        assert_eq!(GateState::parse("WAITING_FOR_APPROVAL"), Some(GateState::WaitingForApproval));
        assert_eq!(GateState::parse("nope"), None);
    }
}
