//! Fast checks on the raw user request before any planning happens, so an
//! obviously bad request never burns an LLM round-trip.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::ratelimit::RateLimiter;
use crate::validator::rules;

/// Pseudo-tool name used to meter raw requests against the global window.
pub const REQUEST_BUDGET: &str = "overall";

fn email_candidate_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Anything containing an '@' surrounded by address-ish characters is a
    // candidate; the strict email rule decides whether it is well formed.
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.@_%+-]+").expect("email candidate pattern compiles")
    })
}

/// Extracts email-looking fragments from free text for early validation.
pub fn extract_emails(text: &str) -> Vec<String> {
    email_candidate_pattern().find_iter(text).map(|found| found.as_str().to_string()).collect()
}

/// Validates the raw user request: non-empty, within the global request
/// budget, and with no malformed email addresses embedded in the text.
///
/// Counts against the limiter's duplicate window, so resubmitting the
/// identical request inside the cooldown is rejected here.
pub fn validate_user_request(user_request: &str, limiter: &RateLimiter) -> Result<(), String> {
    validate_user_request_at(user_request, limiter, Utc::now())
}

/// Clock-injected variant of `validate_user_request` for deterministic
/// tests and callers that already carry a pipeline-wide "now".
pub fn validate_user_request_at(
    user_request: &str,
    limiter: &RateLimiter,
    now: DateTime<Utc>,
) -> Result<(), String> {
    if user_request.trim().is_empty() {
        return Err("Request cannot be empty".to_string());
    }

    let decision = limiter.check_and_record_at(REQUEST_BUDGET, Some(user_request), now);
    if !decision.allowed {
        return Err(decision.reason.unwrap_or_else(|| "Request budget exceeded".to_string()));
    }

    for email in extract_emails(user_request) {
        if let Err(error) = rules::validate_email(&email) {
            return Err(format!("Invalid email in your request: {error}"));
        }
    }

    Ok(())
}
