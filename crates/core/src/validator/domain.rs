//! Tool-specific input checks layered on top of schema conformance.
//!
//! Step inputs arrive as raw JSON; each known tool gets a typed input
//! structure so the domain rules never poke at untyped maps directly.
//! Unknown tools stay opaque and are only schema-checked.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::validator::rules;

pub const CALENDAR_CREATE_EVENT: &str = "calendar.create_event";
pub const SLACK_POST_MESSAGE: &str = "slack.post_message";

/// Typed input for `calendar.create_event`. Required fields are modeled as
/// options so their absence produces a domain error instead of a decode
/// failure.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CalendarEventInput {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub description: Option<String>,
}

/// Typed input for `slack.post_message`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SlackMessageInput {
    pub channel: Option<String>,
    pub text: Option<String>,
    pub thread_ts: Option<String>,
}

/// Tagged union of the tool inputs this validator understands, keyed by
/// tool name. Tools without domain rules pass through as `Opaque`.
#[derive(Clone, Debug)]
pub enum ToolInput {
    CalendarEvent(CalendarEventInput),
    SlackMessage(SlackMessageInput),
    Opaque(Value),
}

impl ToolInput {
    pub fn classify(tool: &str, input: &Value) -> Result<Self, String> {
        match tool {
            CALENDAR_CREATE_EVENT => serde_json::from_value(input.clone())
                .map(Self::CalendarEvent)
                .map_err(|error| format!("input does not match calendar event shape: {error}")),
            SLACK_POST_MESSAGE => serde_json::from_value(input.clone())
                .map(Self::SlackMessage)
                .map_err(|error| format!("input does not match slack message shape: {error}")),
            _ => Ok(Self::Opaque(input.clone())),
        }
    }

    /// Runs the domain rules for this input. Errors accumulate; the list is
    /// empty when the input is acceptable.
    pub fn domain_errors_at(&self, now: DateTime<Utc>) -> Vec<String> {
        match self {
            Self::CalendarEvent(event) => calendar_event_errors(event, now),
            Self::SlackMessage(message) => slack_message_errors(message),
            Self::Opaque(_) => Vec::new(),
        }
    }
}

/// Validates a raw `calendar.create_event` input value, collecting every
/// problem rather than stopping at the first.
pub fn validate_calendar_event_input(input: &Value, now: DateTime<Utc>) -> Vec<String> {
    match ToolInput::classify(CALENDAR_CREATE_EVENT, input) {
        Ok(classified) => classified.domain_errors_at(now),
        Err(error) => vec![error],
    }
}

/// Validates a raw `slack.post_message` input value.
pub fn validate_slack_message_input(input: &Value) -> Vec<String> {
    match ToolInput::classify(SLACK_POST_MESSAGE, input) {
        Ok(classified) => classified.domain_errors_at(Utc::now()),
        Err(error) => vec![error],
    }
}

fn calendar_event_errors(event: &CalendarEventInput, now: DateTime<Utc>) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(start_time) = event.start_time.as_deref() else {
        errors.push("Missing required field: start_time".to_string());
        return errors;
    };
    let Some(end_time) = event.end_time.as_deref() else {
        errors.push("Missing required field: end_time".to_string());
        return errors;
    };

    if let Err(error) = rules::validate_datetime_at(start_time, false, now) {
        errors.push(format!("start_time: {error}"));
    }
    if let Err(error) = rules::validate_datetime_at(end_time, false, now) {
        errors.push(format!("end_time: {error}"));
    }
    if let Err(error) = rules::validate_event_times(start_time, end_time) {
        errors.push(error);
    }
    if let Err(error) = rules::validate_attendees(&event.attendees) {
        errors.push(format!("attendees: {error}"));
    }

    errors
}

fn slack_message_errors(message: &SlackMessageInput) -> Vec<String> {
    let mut errors = Vec::new();

    match message.channel.as_deref() {
        None => errors.push("Missing required field: channel".to_string()),
        Some(channel) => {
            if let Err(error) = rules::validate_slack_channel(channel) {
                errors.push(format!("channel: {error}"));
            }
        }
    }

    match message.text.as_deref() {
        None => errors.push("Missing required field: text".to_string()),
        Some(text) => {
            if let Err(error) = rules::validate_message_content(text) {
                errors.push(format!("text: {error}"));
            }
        }
    }

    errors
}
