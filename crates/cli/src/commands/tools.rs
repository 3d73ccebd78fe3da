use plangate_agent::demo::demo_registry;

use super::CommandResult;

pub fn run() -> CommandResult {
    let descriptors = demo_registry().descriptors();

    let mut lines = vec![format!("{} registered tools:", descriptors.len())];
    for descriptor in descriptors {
        let approval = if descriptor.requires_approval { " [requires approval]" } else { "" };
        lines.push(format!("- {}{approval}", descriptor.name));
        lines.push(format!("    {}", descriptor.description));

        let required = descriptor
            .input_schema
            .get("required")
            .and_then(serde_json::Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|joined| !joined.is_empty());
        if let Some(required) = required {
            lines.push(format!("    required input: {required}"));
        }
    }

    CommandResult::success(lines.join("\n"))
}
