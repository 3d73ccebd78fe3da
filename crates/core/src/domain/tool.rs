use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of one invokable tool as supplied by the tool discovery
/// stage. `name` is unique within a registry; `input_schema` is a JSON
/// Schema fragment used for structural conformance checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_schema")]
    pub input_schema: Value,
    #[serde(default)]
    pub requires_approval: bool,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_schema(),
            requires_approval: false,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_approval_required(mut self) -> Self {
        self.requires_approval = true;
        self
    }
}

fn empty_schema() -> Value {
    Value::Object(serde_json::Map::new())
}
