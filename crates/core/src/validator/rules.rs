//! Pure field-format rules composed by the per-tool domain checks.
//!
//! Every rule is side-effect free and returns `Err(message)` with a
//! human-readable reason; messages are surfaced to the user verbatim.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use regex::{Regex, RegexBuilder};

const MAX_ATTENDEES: usize = 100;
const MAX_MESSAGE_CHARS: usize = 4000;
const MAX_CHANNEL_CHARS: usize = 80;
const PAST_GRACE_MINUTES: i64 = 5;
const MAX_FUTURE_DAYS: i64 = 730;
const MIN_EVENT_MINUTES: i64 = 15;
const MAX_EVENT_HOURS: i64 = 24;

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

fn channel_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9_-]+$").expect("channel pattern compiles"))
}

fn sensitive_patterns() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(api[_-]?key|apikey)[\s:=]+[A-Za-z0-9_-]{20,}",
            r"(secret|token|password)[\s:=]+[A-Za-z0-9_-]{20,}",
            r"sk-[A-Za-z0-9]{20,}",
            r"[0-9]{4}[-\s]?[0-9]{4}[-\s]?[0-9]{4}[-\s]?[0-9]{4}",
        ]
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("sensitive-data pattern compiles")
        })
        .collect()
    })
}

/// Validates email address shape: regex-conformant local@domain with a TLD
/// of at least two characters, plus dot-placement rules the regex alone
/// does not catch.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if !email_pattern().is_match(email) {
        return Err(format!("Invalid email format: '{email}'"));
    }

    if email.contains("..") {
        return Err(format!("Invalid email (consecutive dots): '{email}'"));
    }

    if email.starts_with('.') || email.starts_with('@') {
        return Err(format!("Invalid email format: '{email}'"));
    }

    if email.contains(".@") || email.contains("@.") {
        return Err(format!("Invalid email format (dot before/after @): '{email}'"));
    }

    let local_part = email.split('@').next().unwrap_or_default();
    if local_part.ends_with('.') {
        return Err(format!("Invalid email format: '{email}'"));
    }

    Ok(())
}

/// Validates an offset-aware ISO-8601 timestamp against the scheduling
/// window: no more than five minutes in the past (unless `allow_past`) and
/// no more than two years in the future.
pub fn validate_datetime(value: &str, allow_past: bool) -> Result<(), String> {
    validate_datetime_at(value, allow_past, Utc::now())
}

/// Clock-injected variant of `validate_datetime` for deterministic tests.
pub fn validate_datetime_at(
    value: &str,
    allow_past: bool,
    now: DateTime<Utc>,
) -> Result<(), String> {
    if value.is_empty() {
        return Err("Datetime cannot be empty".to_string());
    }

    let parsed = parse_timestamp(value).ok_or_else(|| {
        format!(
            "Invalid datetime format: '{value}' (expected ISO format like '2026-02-05T18:00:00+05:30')"
        )
    })?;

    if !allow_past && parsed < now - Duration::minutes(PAST_GRACE_MINUTES) {
        return Err(format!("Datetime cannot be in the past: '{value}'"));
    }

    if parsed > now + Duration::days(MAX_FUTURE_DAYS) {
        return Err(format!("Datetime too far in future (max 2 years): '{value}'"));
    }

    Ok(())
}

/// Validates that an event starts strictly before it ends and lasts between
/// 15 minutes and 24 hours.
pub fn validate_event_times(start_time: &str, end_time: &str) -> Result<(), String> {
    let (Some(start), Some(end)) = (parse_timestamp(start_time), parse_timestamp(end_time)) else {
        return Err("Invalid datetime format for event times".to_string());
    };

    if start >= end {
        return Err("Event start time must be before end time".to_string());
    }

    let duration = end - start;
    if duration < Duration::minutes(MIN_EVENT_MINUTES) {
        return Err("Event duration too short (minimum 15 minutes)".to_string());
    }
    if duration > Duration::hours(MAX_EVENT_HOURS) {
        return Err("Event duration too long (maximum 24 hours)".to_string());
    }

    Ok(())
}

/// Validates an attendee list: bounded size, no case-insensitive
/// duplicates, each entry a well-formed email. An empty list is fine.
pub fn validate_attendees(attendees: &[String]) -> Result<(), String> {
    if attendees.len() > MAX_ATTENDEES {
        return Err(format!(
            "Too many attendees: {} (maximum {MAX_ATTENDEES})",
            attendees.len()
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for email in attendees {
        if !seen.insert(email.to_lowercase()) {
            return Err(format!("Duplicate attendee email: '{email}'"));
        }
        validate_email(email)?;
    }

    Ok(())
}

/// Validates Slack channel naming: leading `#`, then 1-80 characters of
/// lowercase letters, digits, hyphens, or underscores.
pub fn validate_slack_channel(channel: &str) -> Result<(), String> {
    if channel.is_empty() {
        return Err("Channel name cannot be empty".to_string());
    }

    let Some(name) = channel.strip_prefix('#') else {
        return Err(format!("Channel name must start with '#': '{channel}'"));
    };

    if name.is_empty() {
        return Err("Channel name cannot be just '#'".to_string());
    }

    if name.chars().count() > MAX_CHANNEL_CHARS {
        return Err(format!("Channel name too long (max {MAX_CHANNEL_CHARS} characters): '{channel}'"));
    }

    if !channel_pattern().is_match(name) {
        return Err(format!(
            "Invalid channel name format (use lowercase, numbers, hyphens, underscores only): '{channel}'"
        ));
    }

    Ok(())
}

/// Validates message content: non-empty, bounded length, and free of
/// patterns resembling API keys, credential assignments, or card numbers.
pub fn validate_message_content(text: &str) -> Result<(), String> {
    if text.is_empty() {
        return Err("Message text cannot be empty".to_string());
    }

    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(format!(
            "Message too long: {} characters (maximum {MAX_MESSAGE_CHARS})",
            text.chars().count()
        ));
    }

    if sensitive_patterns().iter().any(|pattern| pattern.is_match(text)) {
        return Err(
            "Message may contain sensitive data (API key, password, or credit card). \
             Please remove sensitive information."
                .to_string(),
        );
    }

    Ok(())
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{
        validate_attendees, validate_datetime_at, validate_email, validate_event_times,
        validate_message_content, validate_slack_channel,
    };

    #[test]
    fn accepts_ordinary_emails() {
        for email in ["alice@example.com", "a.b+tag@sub.domain.io", "x_1%y@host.co"] {
            assert!(validate_email(email).is_ok(), "{email} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_emails() {
        let cases = [
            ("", "empty"),
            ("no-at-sign.example.com", "format"),
            ("a..b@example.com", "consecutive dots"),
            (".lead@example.com", "format"),
            ("dot.@example.com", "dot before/after @"),
            ("dot@.example.com", "dot before/after @"),
            ("tld@example.c", "format"),
        ];
        for (email, why) in cases {
            assert!(validate_email(email).is_err(), "{email} should be rejected ({why})");
        }
    }

    #[test]
    fn datetime_rejects_past_beyond_grace_but_honors_allow_past() {
        let now = Utc::now();
        let two_days_ago = (now - Duration::days(2)).to_rfc3339();

        let error = validate_datetime_at(&two_days_ago, false, now).expect_err("past rejected");
        assert!(error.contains("past"), "error should mention the past: {error}");

        assert!(validate_datetime_at(&two_days_ago, true, now).is_ok());
    }

    #[test]
    fn datetime_allows_recent_past_within_processing_grace() {
        let now = Utc::now();
        let three_minutes_ago = (now - Duration::minutes(3)).to_rfc3339();
        assert!(validate_datetime_at(&three_minutes_ago, false, now).is_ok());
    }

    #[test]
    fn datetime_rejects_far_future_and_naive_timestamps() {
        let now = Utc::now();
        let far_future = (now + Duration::days(731)).to_rfc3339();
        let error = validate_datetime_at(&far_future, false, now).expect_err("too far out");
        assert!(error.contains("too far in future"));

        // Missing offset makes the timestamp ambiguous; reject it.
        let error = validate_datetime_at("2026-09-01T10:00:00", false, now)
            .expect_err("naive timestamp rejected");
        assert!(error.contains("Invalid datetime format"));
    }

    #[test]
    fn event_times_enforce_ordering_and_duration_bounds() {
        assert!(validate_event_times("2026-09-01T10:00:00+00:00", "2026-09-01T11:00:00+00:00")
            .is_ok());

        let swapped = validate_event_times("2026-09-01T11:00:00+00:00", "2026-09-01T10:00:00+00:00")
            .expect_err("start after end");
        assert!(swapped.contains("before end time"));

        let short = validate_event_times("2026-09-01T10:00:00+00:00", "2026-09-01T10:10:00+00:00")
            .expect_err("ten minutes is too short");
        assert!(short.contains("too short"));

        let long = validate_event_times("2026-09-01T10:00:00+00:00", "2026-09-02T11:00:00+00:00")
            .expect_err("25 hours is too long");
        assert!(long.contains("too long"));
    }

    #[test]
    fn attendees_reject_case_insensitive_duplicates() {
        let attendees =
            vec!["alice@example.com".to_string(), "ALICE@example.com".to_string()];
        let error = validate_attendees(&attendees).expect_err("duplicate rejected");
        assert!(error.contains("Duplicate attendee email"));

        assert!(validate_attendees(&[]).is_ok());
    }

    #[test]
    fn attendees_reject_oversized_lists() {
        let attendees: Vec<String> =
            (0..101).map(|i| format!("user{i}@example.com")).collect();
        let error = validate_attendees(&attendees).expect_err("101 attendees rejected");
        assert!(error.contains("Too many attendees"));
    }

    #[test]
    fn channel_names_require_hash_prefix_and_slack_charset() {
        assert!(validate_slack_channel("#general").is_ok());
        assert!(validate_slack_channel("#team_a-1").is_ok());

        let missing_hash = validate_slack_channel("general").expect_err("missing #");
        assert!(missing_hash.contains("must start with '#'"));

        assert!(validate_slack_channel("#").is_err());
        assert!(validate_slack_channel("#UpperCase").is_err());
        assert!(validate_slack_channel("#has space").is_err());
        assert!(validate_slack_channel(&format!("#{}", "a".repeat(81))).is_err());
    }

    #[test]
    fn message_content_blocks_sensitive_patterns() {
        assert!(validate_message_content("standup moved to 10am").is_ok());

        let cases = [
            "api_key: abcdefghijklmnopqrstuv",
            "password = supersecretpassword123456",
            "sk-abcdefghijklmnopqrstuvwxyz",
            "card 4111 1111 1111 1111",
        ];
        for text in cases {
            let error = validate_message_content(text).expect_err("sensitive content rejected");
            assert!(error.contains("sensitive data"), "{text}");
        }

        assert!(validate_message_content("").is_err());
        assert!(validate_message_content(&"x".repeat(4001)).is_err());
    }
}
