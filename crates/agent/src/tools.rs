//! The tool seam: anything executable from a plan step implements `Tool`,
//! and the registry doubles as the validator's allow-list.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use plangate_core::ToolDescriptor;

/// Outputs of already-executed steps, in execution order. Aggregation
/// tools (message summarizers) read their material from here rather than
/// from their own input.
#[derive(Clone, Debug, Default)]
pub struct PriorOutputs {
    outputs: Vec<(String, Value)>,
}

impl PriorOutputs {
    pub fn record(&mut self, step_id: impl Into<String>, output: Value) {
        self.outputs.push((step_id.into(), output));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.outputs.iter()
    }

    /// First prior output carrying an array under `key`.
    pub fn find_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.outputs.iter().find_map(|(_, output)| output.get(key).and_then(Value::as_array))
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn execute(&self, input: Value, prior: &PriorOutputs) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    // registration order, so descriptors() is stable for prompts and tests
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let name = tool.descriptor().name;
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    /// Allow-list handed to the validator and serialized into prompts.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
