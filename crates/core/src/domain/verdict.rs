use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accumulating verdict of a plan validation pass.
///
/// Errors never short-circuit: every step is fully checked so a caller can
/// surface all problems at once. `valid` is false iff any error was
/// recorded. Warnings (policy patches) do not affect validity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self { valid: true, errors: Vec::new(), warnings: Vec::new() }
    }
}

impl ValidationResult {
    pub fn rejected(error: impl Into<String>) -> Self {
        Self { valid: false, errors: vec![error.into()], warnings: Vec::new() }
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }

    pub fn record_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// A pending human approval for one high-risk plan step.
///
/// Emitted independently of step validity; the caller must treat errors as
/// dominant over approvals when deciding what to do with the plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub step_id: String,
    pub tool: String,
    pub reason: String,
    pub input_preview: Value,
}

#[cfg(test)]
mod tests {
    use super::ValidationResult;

    #[test]
    fn default_verdict_is_valid_and_empty() {
        let result = ValidationResult::default();
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn recording_an_error_flips_validity() {
        let mut result = ValidationResult::default();
        result.record_warning("S1: timezone patched");
        assert!(result.valid);

        result.record_error("S1: unknown dependency S9");
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }
}
