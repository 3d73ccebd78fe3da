use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::plan::MAX_PLAN_STEPS;
use crate::ratelimit::RateLimitConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub limits: RateLimitConfig,
    pub policy: PolicyConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Guardrail policy knobs consumed by the validator and the executor.
#[derive(Clone, Debug)]
pub struct PolicyConfig {
    pub default_timezone: String,
    pub high_risk_prefixes: Vec<String>,
    pub max_plan_steps: usize,
    pub tool_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    /// Rule-based planner only; no network, no key.
    Offline,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub default_timezone: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Offline,
                api_key: None,
                base_url: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            limits: RateLimitConfig::default(),
            policy: PolicyConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_timezone: "Asia/Kolkata".to_string(),
            high_risk_prefixes: [
                "calendar.", "slack.", "gmail.", "drive.", "notion.", "jira.", "linear.",
            ]
            .iter()
            .map(|prefix| prefix.to_string())
            .collect(),
            max_plan_steps: MAX_PLAN_STEPS,
            tool_timeout_secs: 30,
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "offline" => Ok(Self::Offline),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|offline)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("plangate.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(limits) = patch.limits {
            if let Some(window_secs) = limits.window_secs {
                self.limits.window_secs = window_secs;
            }
            if let Some(overall_limit) = limits.overall_limit {
                self.limits.overall_limit = overall_limit;
            }
            if let Some(duplicate_window_secs) = limits.duplicate_window_secs {
                self.limits.duplicate_window_secs = duplicate_window_secs;
            }
            if let Some(per_tool) = limits.per_tool {
                self.limits.per_tool = per_tool;
            }
        }

        if let Some(policy) = patch.policy {
            if let Some(default_timezone) = policy.default_timezone {
                self.policy.default_timezone = default_timezone;
            }
            if let Some(high_risk_prefixes) = policy.high_risk_prefixes {
                self.policy.high_risk_prefixes = high_risk_prefixes;
            }
            if let Some(max_plan_steps) = policy.max_plan_steps {
                self.policy.max_plan_steps = max_plan_steps;
            }
            if let Some(tool_timeout_secs) = policy.tool_timeout_secs {
                self.policy.tool_timeout_secs = tool_timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PLANGATE_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("PLANGATE_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PLANGATE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("PLANGATE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("PLANGATE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("PLANGATE_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PLANGATE_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("PLANGATE_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("PLANGATE_LIMITS_WINDOW_SECS") {
            self.limits.window_secs = parse_u64("PLANGATE_LIMITS_WINDOW_SECS", &value)?;
        }
        if let Some(value) = read_env("PLANGATE_LIMITS_OVERALL_LIMIT") {
            self.limits.overall_limit = parse_usize("PLANGATE_LIMITS_OVERALL_LIMIT", &value)?;
        }
        if let Some(value) = read_env("PLANGATE_LIMITS_DUPLICATE_WINDOW_SECS") {
            self.limits.duplicate_window_secs =
                parse_u64("PLANGATE_LIMITS_DUPLICATE_WINDOW_SECS", &value)?;
        }

        if let Some(value) = read_env("PLANGATE_POLICY_DEFAULT_TIMEZONE") {
            self.policy.default_timezone = value;
        }
        if let Some(value) = read_env("PLANGATE_POLICY_MAX_PLAN_STEPS") {
            self.policy.max_plan_steps = parse_usize("PLANGATE_POLICY_MAX_PLAN_STEPS", &value)?;
        }
        if let Some(value) = read_env("PLANGATE_POLICY_TOOL_TIMEOUT_SECS") {
            self.policy.tool_timeout_secs =
                parse_u64("PLANGATE_POLICY_TOOL_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("PLANGATE_LOGGING_LEVEL").or_else(|| read_env("PLANGATE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PLANGATE_LOGGING_FORMAT").or_else(|| read_env("PLANGATE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(default_timezone) = overrides.default_timezone {
            self.policy.default_timezone = default_timezone;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_limits(&self.limits)?;
        validate_policy(&self.policy)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("plangate.toml"), PathBuf::from("config/plangate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        LlmProvider::Offline => {}
    }

    Ok(())
}

fn validate_limits(limits: &RateLimitConfig) -> Result<(), ConfigError> {
    if limits.window_secs == 0 || limits.window_secs > 86_400 {
        return Err(ConfigError::Validation(
            "limits.window_secs must be in range 1..=86400".to_string(),
        ));
    }
    if limits.overall_limit == 0 {
        return Err(ConfigError::Validation(
            "limits.overall_limit must be greater than zero".to_string(),
        ));
    }
    if limits.duplicate_window_secs >= limits.window_secs {
        return Err(ConfigError::Validation(
            "limits.duplicate_window_secs must be shorter than limits.window_secs".to_string(),
        ));
    }
    for (tool, limit) in &limits.per_tool {
        if *limit == 0 {
            return Err(ConfigError::Validation(format!(
                "limits.per_tool entry for `{tool}` must be greater than zero"
            )));
        }
    }

    Ok(())
}

fn validate_policy(policy: &PolicyConfig) -> Result<(), ConfigError> {
    if policy.default_timezone.trim().is_empty() {
        return Err(ConfigError::Validation(
            "policy.default_timezone must not be empty".to_string(),
        ));
    }
    if policy.max_plan_steps == 0 || policy.max_plan_steps > MAX_PLAN_STEPS {
        return Err(ConfigError::Validation(format!(
            "policy.max_plan_steps must be in range 1..={MAX_PLAN_STEPS}"
        )));
    }
    if policy.tool_timeout_secs == 0 || policy.tool_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "policy.tool_timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    for prefix in &policy.high_risk_prefixes {
        if !prefix.ends_with('.') {
            return Err(ConfigError::Validation(format!(
                "policy.high_risk_prefixes entry `{prefix}` must end with `.`"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    limits: Option<LimitsPatch>,
    policy: Option<PolicyPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LimitsPatch {
    window_secs: Option<u64>,
    overall_limit: Option<usize>,
    duplicate_window_secs: Option<u64>,
    per_tool: Option<std::collections::HashMap<String, usize>>,
}

#[derive(Debug, Default, Deserialize)]
struct PolicyPatch {
    default_timezone: Option<String>,
    high_risk_prefixes: Option<Vec<String>>,
    max_plan_steps: Option<usize>,
    tool_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_and_offline() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.policy.default_timezone == "Asia/Kolkata", "default timezone")?;
        ensure(config.limits.overall_limit == 100, "default overall limit")?;
        ensure(
            config.limits.per_tool.get("slack.post_message") == Some(&50),
            "default slack per-tool cap",
        )?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PLANGATE_API_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("plangate.toml");
            fs::write(
                &path,
                r#"
[llm]
provider = "openai"
api_key = "${TEST_PLANGATE_API_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let api_key = config.llm.api_key.as_ref().ok_or("api key should be set")?;
            ensure(
                api_key.expose_secret() == "sk-from-env",
                "api key should be loaded from environment",
            )
        })();

        clear_vars(&["TEST_PLANGATE_API_KEY"]);
        result
    }

    #[test]
    fn provider_spelling_matches_between_file_and_env_paths() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("plangate.toml");
        fs::write(
            &path,
            r#"
[llm]
provider = "openai"
api_key = "sk-file-key"
"#,
        )
        .map_err(|err| err.to_string())?;

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.llm.provider == LlmProvider::OpenAi,
            "file `provider = \"openai\"` should parse like the env spelling",
        )
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PLANGATE_POLICY_DEFAULT_TIMEZONE", "Europe/Berlin");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("plangate.toml");
            fs::write(
                &path,
                r#"
[policy]
default_timezone = "America/New_York"

[logging]
level = "warn"

[limits]
overall_limit = 42
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.policy.default_timezone == "Europe/Berlin",
                "env timezone should win over file and defaults",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should win over file")?;
            ensure(config.limits.overall_limit == 42, "file overall limit should win over default")
        })();

        clear_vars(&["PLANGATE_POLICY_DEFAULT_TIMEZONE"]);
        result
    }

    #[test]
    fn cloud_provider_without_api_key_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PLANGATE_LLM_PROVIDER", "openai");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.api_key")
            );
            ensure(has_message, "validation failure should mention llm.api_key")
        })();

        clear_vars(&["PLANGATE_LLM_PROVIDER"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported_with_the_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PLANGATE_LIMITS_OVERALL_LIMIT", "lots");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            let matches_key = matches!(
                error,
                ConfigError::InvalidEnvOverride { ref key, .. }
                    if key == "PLANGATE_LIMITS_OVERALL_LIMIT"
            );
            ensure(matches_key, "error should name the offending variable")
        })();

        clear_vars(&["PLANGATE_LIMITS_OVERALL_LIMIT"]);
        result
    }

    #[test]
    fn oversized_max_plan_steps_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PLANGATE_POLICY_MAX_PLAN_STEPS", "20");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("max_plan_steps")
            );
            ensure(has_message, "validation failure should mention max_plan_steps")
        })();

        clear_vars(&["PLANGATE_POLICY_MAX_PLAN_STEPS"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PLANGATE_LLM_PROVIDER", "anthropic");
        env::set_var("PLANGATE_LLM_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")
        })();

        clear_vars(&["PLANGATE_LLM_PROVIDER", "PLANGATE_LLM_API_KEY"]);
        result
    }
}
