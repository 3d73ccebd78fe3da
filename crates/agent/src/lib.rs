//! Agent orchestration - planning, validation gating, and tool execution
//!
//! This crate is the orchestration shell around `plangate-core`:
//! - Turns a natural-language request into a multi-step plan (LLM or
//!   offline rules)
//! - Runs the neurosymbolic validator and the execution gate
//! - Executes approved plans sequentially against registered tools
//! - Renders a human-readable final report
//!
//! # Pipeline
//!
//! 1. **Precheck** - request-level limits and email sanity
//! 2. **Planning** (`planner` / `llm`) - produce a raw JSON plan
//! 3. **Validation** (`plangate-core`) - deterministic checks, approvals
//! 4. **Gate** - errors → approvals → ready
//! 5. **Execution** (`executor`) - sequential, timeout-wrapped tool calls
//! 6. **Report** (`report`) - user-facing summary
//!
//! # Safety Principle
//!
//! The LLM is strictly a plan proposer. It never executes anything: every
//! plan passes the deterministic validator, and high-risk tools are blocked
//! at execution time unless their step ids were explicitly approved.

pub mod demo;
pub mod executor;
pub mod llm;
pub mod planner;
pub mod report;
pub mod runtime;
pub mod tools;

pub use executor::{ExecutionOutcome, ExecutionPolicy, StepOutcome, StepStatus};
pub use llm::LlmClient;
pub use runtime::{AgentRuntime, PlanSource, RunOutcome};
pub use tools::{Tool, ToolRegistry};
