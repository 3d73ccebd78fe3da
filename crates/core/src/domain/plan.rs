use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound on steps in a single plan. Planners that want more work than
/// this must split it across requests.
pub const MAX_PLAN_STEPS: usize = 6;

/// One step of a tool-invocation plan.
///
/// `tool` is optional: a step without a tool is a manual/no-op step and is
/// skipped by the executor. `input` stays a raw JSON value until the plan
/// validator has checked it against the tool's declared schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default = "empty_object")]
    pub input: Value,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub expected_output: String,
}

/// An ordered tool-invocation plan produced from a user request.
///
/// Plans arrive from the planning stage as untrusted JSON and are only
/// converted to this typed form after the validator has accepted them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub goal: String,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Converts a validator-accepted plan value into its typed form.
    ///
    /// This is only sound after a passing validation verdict; malformed raw
    /// plans are rejected by the validator before they reach this point.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
