//! Demo tool implementations backing the CLI and the pipeline tests.
//! They simulate the real integrations: no network, deterministic-ish
//! outputs, identical schemas and approval flags.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use plangate_core::ToolDescriptor;

use crate::tools::{PriorOutputs, Tool, ToolRegistry};

/// Registry with the full demo tool set, matching what discovery would
/// return against live integrations.
pub fn demo_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    registry.register(CalendarCreateEvent);
    registry.register(CalendarListEvents);
    registry.register(SlackPostMessage);
    registry.register(SlackReadMessages);
    registry.register(SlackSummarizeMessages);
    registry.register(SlackListChannels);
    registry
}

pub struct CalendarCreateEvent;

#[async_trait]
impl Tool for CalendarCreateEvent {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("calendar.create_event", "Create a calendar event")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "start_time": {"type": "string"},
                    "end_time": {"type": "string"},
                    "timezone": {"type": "string"},
                    "attendees": {"type": "array"},
                    "description": {"type": "string"},
                },
                "required": ["start_time", "end_time"],
            }))
            .with_approval_required()
    }

    async fn execute(&self, input: Value, _prior: &PriorOutputs) -> Result<Value> {
        Ok(json!({
            "event_id": Uuid::new_v4().to_string(),
            "title": input.get("title").cloned().unwrap_or_else(|| Value::String("Meeting".into())),
            "start_time": input.get("start_time").cloned().unwrap_or(Value::Null),
            "end_time": input.get("end_time").cloned().unwrap_or(Value::Null),
        }))
    }
}

pub struct CalendarListEvents;

#[async_trait]
impl Tool for CalendarListEvents {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("calendar.list_events", "List upcoming calendar events").with_schema(
            json!({
                "type": "object",
                "properties": {
                    "max_results": {"type": "integer"},
                    "time_min": {"type": "string"},
                },
            }),
        )
    }

    async fn execute(&self, _input: Value, _prior: &PriorOutputs) -> Result<Value> {
        Ok(json!({"events": [], "count": 0}))
    }
}

pub struct SlackPostMessage;

#[async_trait]
impl Tool for SlackPostMessage {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("slack.post_message", "Post a message to a Slack channel")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "channel": {"type": "string"},
                    "text": {"type": "string"},
                    "thread_ts": {"type": "string"},
                },
                "required": ["channel", "text"],
            }))
            .with_approval_required()
    }

    async fn execute(&self, input: Value, _prior: &PriorOutputs) -> Result<Value> {
        Ok(json!({
            "message_id": Uuid::new_v4().to_string(),
            "channel": input.get("channel").cloned().unwrap_or(Value::Null),
        }))
    }
}

pub struct SlackReadMessages;

#[async_trait]
impl Tool for SlackReadMessages {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("slack.read_messages", "Read messages from a Slack channel")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "channel": {"type": "string"},
                    "limit": {"type": "integer"},
                },
            }))
    }

    async fn execute(&self, input: Value, _prior: &PriorOutputs) -> Result<Value> {
        let channel = input.get("channel").and_then(Value::as_str).unwrap_or("#general");
        Ok(json!({
            "channel": channel,
            "messages": [
                {"text": "standup moved to 10:30", "user": "U1", "timestamp": "1767000000"},
                {"text": "release branch is cut", "user": "U2", "timestamp": "1767000300"},
            ],
            "count": 2,
        }))
    }
}

pub struct SlackSummarizeMessages;

#[async_trait]
impl Tool for SlackSummarizeMessages {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("slack.summarize_messages", "Summarize Slack messages")
            .with_schema(json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, _input: Value, prior: &PriorOutputs) -> Result<Value> {
        let messages = prior
            .find_array("messages")
            .filter(|messages| !messages.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No messages found to summarize. \
                     The channel may only contain system messages (joins, leaves). \
                     Try asking to read more messages with a higher limit."
                )
            })?;

        Ok(json!({
            "success": true,
            "summary": format!("Found {} messages.", messages.len()),
            "message_count": messages.len(),
        }))
    }
}

pub struct SlackListChannels;

#[async_trait]
impl Tool for SlackListChannels {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("slack.list_channels", "List Slack channels")
            .with_schema(json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, _input: Value, _prior: &PriorOutputs) -> Result<Value> {
        Ok(json!({"channels": ["#general", "#random", "#standup"], "count": 3}))
    }
}
