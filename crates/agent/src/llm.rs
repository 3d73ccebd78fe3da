//! LLM plumbing: the provider trait, the today-anchor context handed to the
//! model, and the JSON extraction guardrail applied to its output.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::Value;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Stable "today" anchor included in every planning prompt so relative
/// dates ("tomorrow") resolve against a fixed clock, not the model's guess.
#[derive(Clone, Debug)]
pub struct TodayContext {
    pub timezone: String,
    pub today_date: String,
    pub now_iso: String,
    pub weekday: String,
}

impl TodayContext {
    pub fn at(now: DateTime<FixedOffset>, timezone: &str) -> Self {
        Self {
            timezone: timezone.to_string(),
            today_date: now.format("%Y-%m-%d").to_string(),
            now_iso: now.to_rfc3339(),
            weekday: now.format("%A").to_string(),
        }
    }
}

/// Builds the planning prompt: today anchor, the user request, and the
/// authoritative tool list. The model must answer with JSON only.
pub fn planning_prompt(
    context: &TodayContext,
    user_request: &str,
    tools_json: &Value,
    previous_error: Option<&str>,
) -> String {
    let mut prompt = format!(
        "TODAY_CONTEXT (authoritative):\n\
         - Today is {weekday}, date: {today}\n\
         - Current time (ISO): {now}\n\
         - Use timezone: {tz}\n\n\
         User Request:\n{request}\n\n\
         Available Tools (authoritative):\n{tools}\n\n\
         Rules:\n\
         - Return ONLY JSON (no markdown).\n\
         - If user says \"tomorrow\", compute relative to TODAY_CONTEXT.\n\
         - All datetimes MUST be ISO 8601 with offset (e.g. 2026-01-30T16:00:00+05:30).\n",
        weekday = context.weekday,
        today = context.today_date,
        now = context.now_iso,
        tz = context.timezone,
        request = user_request,
        tools = tools_json,
    );

    if let Some(error) = previous_error {
        prompt.push_str(&format!(
            "\nPrevious output failed:\n{error}\nFix it and return ONLY JSON.\n"
        ));
    }

    prompt
}

/// Extraction guardrail: accept clean JSON, otherwise salvage the outermost
/// object from surrounding prose or markdown fences.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(anyhow!("Model did not return valid JSON"))
}
