use secrecy::ExposeSecret;

use plangate_core::config::{AppConfig, LlmProvider, LogFormat};

use super::CommandResult;

pub fn run(config: &AppConfig) -> CommandResult {
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line("llm.provider", provider_label(config.llm.provider)));
    lines.push(render_line(
        "llm.api_key",
        &config
            .llm
            .api_key
            .as_ref()
            .map(|key| redact(key.expose_secret()))
            .unwrap_or_else(|| "(unset)".to_string()),
    ));
    lines.push(render_line("llm.model", &config.llm.model));
    lines.push(render_line("llm.timeout_secs", &config.llm.timeout_secs.to_string()));
    lines.push(render_line("llm.max_retries", &config.llm.max_retries.to_string()));

    lines.push(render_line("limits.window_secs", &config.limits.window_secs.to_string()));
    lines.push(render_line("limits.overall_limit", &config.limits.overall_limit.to_string()));
    lines.push(render_line(
        "limits.duplicate_window_secs",
        &config.limits.duplicate_window_secs.to_string(),
    ));
    let mut per_tool: Vec<(&String, &usize)> = config.limits.per_tool.iter().collect();
    per_tool.sort_by_key(|(tool, _)| tool.as_str());
    for (tool, limit) in per_tool {
        lines.push(render_line(&format!("limits.per_tool.{tool}"), &limit.to_string()));
    }

    lines.push(render_line("policy.default_timezone", &config.policy.default_timezone));
    lines.push(render_line(
        "policy.high_risk_prefixes",
        &config.policy.high_risk_prefixes.join(", "),
    ));
    lines.push(render_line("policy.max_plan_steps", &config.policy.max_plan_steps.to_string()));
    lines
        .push(render_line("policy.tool_timeout_secs", &config.policy.tool_timeout_secs.to_string()));

    lines.push(render_line("logging.level", &config.logging.level));
    lines.push(render_line("logging.format", format_label(config.logging.format)));

    CommandResult::success(lines.join("\n"))
}

fn render_line(key: &str, value: &str) -> String {
    format!("  {key} = {value}")
}

fn provider_label(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "openai",
        LlmProvider::Anthropic => "anthropic",
        LlmProvider::Offline => "offline",
    }
}

fn format_label(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

fn redact(value: &str) -> String {
    if value.is_empty() {
        return "(empty)".to_string();
    }
    let visible: String = value.chars().take(4).collect();
    format!("{visible}**** (redacted)")
}
