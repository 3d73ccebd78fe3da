//! Final report rendering: one user-facing text block per completed run.

use chrono::DateTime;
use serde_json::Value;

use crate::executor::{StepOutcome, StepStatus};

/// Formats a list of raw Slack messages for human consumption.
pub fn format_slack_messages(messages: &[Value]) -> String {
    if messages.is_empty() {
        return "No messages found.".to_string();
    }

    let mut lines = vec![format!("\u{1F4EC} {} Messages:", messages.len()), String::new()];
    for message in messages {
        let text = message.get("text").and_then(Value::as_str).unwrap_or_default();
        let time = message
            .get("timestamp")
            .and_then(timestamp_label)
            .unwrap_or_else(|| "Unknown time".to_string());

        lines.push(format!("\u{1F4AC} {time}"));
        lines.push(format!("   {text}"));
        lines.push(String::new());
    }

    lines.join("\n")
}

// Slack timestamps are unix seconds carried as strings.
fn timestamp_label(timestamp: &Value) -> Option<String> {
    let seconds = match timestamp {
        Value::String(text) => text.parse::<f64>().ok()?,
        Value::Number(number) => number.as_f64()?,
        _ => return None,
    };
    let parsed = DateTime::from_timestamp(seconds as i64, 0)?;
    Some(parsed.format("%b %d, %I:%M %p").to_string())
}

/// Renders the final run summary: goal, then either nicely formatted Slack
/// messages (when a step fetched some) or a per-step status list.
pub fn generate_final_report(goal: &str, outcomes: &[StepOutcome]) -> String {
    let mut lines = vec![
        "\u{2705} Final Execution Report".to_string(),
        String::new(),
        format!("Goal: {goal}"),
        String::new(),
    ];

    let mut rendered_messages = false;
    for outcome in outcomes {
        let Some(messages) = outcome.output.as_ref().and_then(|output| {
            output.get("messages").and_then(Value::as_array).filter(|list| !list.is_empty())
        }) else {
            continue;
        };
        rendered_messages = true;
        lines.push(format_slack_messages(messages));
    }

    if !rendered_messages {
        lines.push("Steps executed:".to_string());
        for outcome in outcomes {
            let tool = outcome.tool.as_deref().unwrap_or("-");
            lines.push(format!(
                "- {}: {} ({tool}) -> {}",
                outcome.step_id,
                outcome.action,
                outcome.status.as_str()
            ));
            if outcome.status == StepStatus::Error {
                if let Some(detail) = &outcome.detail {
                    lines.push(format!("    \u{274C} {detail}"));
                }
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::executor::{StepOutcome, StepStatus};

    use super::{format_slack_messages, generate_final_report};

    fn outcome(step_id: &str, status: StepStatus, output: Option<serde_json::Value>) -> StepOutcome {
        StepOutcome {
            step_id: step_id.to_string(),
            action: "do the thing".to_string(),
            tool: Some("demo.tool".to_string()),
            status,
            output,
            detail: (status == StepStatus::Error).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn standard_report_lists_each_step_with_status() {
        let report = generate_final_report(
            "post an update",
            &[
                outcome("S1", StepStatus::Ok, Some(json!({"message_id": "m1"}))),
                outcome("S2", StepStatus::Error, None),
            ],
        );

        assert!(report.contains("Goal: post an update"));
        assert!(report.contains("- S1: do the thing (demo.tool) -> ok"));
        assert!(report.contains("- S2: do the thing (demo.tool) -> error"));
        assert!(report.contains("boom"));
    }

    #[test]
    fn fetched_messages_replace_the_step_list() {
        let output = json!({"messages": [{"text": "standup at ten", "timestamp": "1767000000"}]});
        let report =
            generate_final_report("read #general", &[outcome("S1", StepStatus::Ok, Some(output))]);

        assert!(report.contains("1 Messages:"));
        assert!(report.contains("standup at ten"));
        assert!(!report.contains("Steps executed:"));
    }

    #[test]
    fn empty_message_lists_fall_back_to_the_step_list() {
        let output = json!({"messages": []});
        let report =
            generate_final_report("read #quiet", &[outcome("S1", StepStatus::Ok, Some(output))]);
        assert!(report.contains("Steps executed:"));
    }

    #[test]
    fn unparsable_timestamps_are_labelled_unknown() {
        let formatted = format_slack_messages(&[json!({"text": "hi", "timestamp": "not-a-ts"})]);
        assert!(formatted.contains("Unknown time"));
    }
}
