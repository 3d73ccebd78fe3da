pub mod config;
pub mod domain;
pub mod gate;
pub mod ratelimit;
pub mod validator;

pub use config::{
    AppConfig, ConfigError, ConfigOverrides, LlmConfig, LlmProvider, LoadOptions, LogFormat,
    LoggingConfig, PolicyConfig,
};
pub use domain::plan::{Plan, PlanStep, MAX_PLAN_STEPS};
pub use domain::tool::ToolDescriptor;
pub use domain::verdict::{ApprovalRequest, ValidationResult};
pub use gate::{GateEvent, GateState, GateTransitionError};
pub use ratelimit::{LimiterDecision, LimiterStats, RateLimitConfig, RateLimiter};
pub use validator::{PlanValidation, PlanValidator};
