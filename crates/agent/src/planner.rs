//! Offline rule-based planner: turns a natural-language request into a raw
//! plan without any model call. Used when the configured provider is
//! `offline` and as the fallback when the LLM planner fails.
//!
//! All date math is anchored on an injected "now" so plans are
//! reproducible in tests.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use regex::Regex;
use serde_json::{json, Map, Value};

const DEFAULT_CHANNEL: &str = "#general";
const DEFAULT_HOUR: u32 = 16;

fn month_day_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\b({})\s+(\d{{1,2}})(?:st|nd|rd|th)?\b", month_alternation()))
            .expect("month-day pattern compiles")
    })
}

fn day_month_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({})\b", month_alternation()))
            .expect("day-month pattern compiles")
    })
}

// Longer names first so "february" is not clipped to "feb".
fn month_alternation() -> &'static str {
    "january|jan|february|feb|march|mar|april|apr|may|june|jun|july|jul|\
     august|aug|september|sept|sep|october|oct|november|nov|december|dec"
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

fn attendee_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .expect("attendee pattern compiles")
    })
}

fn channel_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(#\w+)").expect("channel pattern compiles"))
}

fn noise_word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(mark|book|schedule|create|set up|setup|in|the|calender|calendar|like|with|at|on)\b")
            .expect("noise word pattern compiles")
    })
}

fn resolve_target_date(req: &str, now: DateTime<FixedOffset>) -> NaiveDate {
    let today = now.date_naive();

    let explicit = month_day_pattern()
        .captures(req)
        .and_then(|captures| {
            let month = month_number(captures.get(1)?.as_str())?;
            let day = captures.get(2)?.as_str().parse::<u32>().ok()?;
            Some((month, day))
        })
        .or_else(|| {
            day_month_pattern().captures(req).and_then(|captures| {
                let day = captures.get(1)?.as_str().parse::<u32>().ok()?;
                let month = month_number(captures.get(2)?.as_str())?;
                Some((month, day))
            })
        });

    if let Some((month, day)) = explicit {
        if let Some(date) = NaiveDate::from_ymd_opt(today.year(), month, day) {
            if date < today {
                // Already passed this year: assume next year.
                return NaiveDate::from_ymd_opt(today.year() + 1, month, day).unwrap_or(date);
            }
            return date;
        }
    }

    if req.contains("today") {
        today
    } else {
        // "tomorrow" and the unspecified default both land on tomorrow.
        today + Duration::days(1)
    }
}

fn resolve_time(req: &str) -> (u32, u32) {
    static PATTERNS: OnceLock<Vec<(Regex, Option<bool>)>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            (r"(\d{1,2})\.(\d{2})\s*pm", Some(true)),
            (r"(\d{1,2}):(\d{2})\s*pm", Some(true)),
            (r"(\d{1,2})\s*pm", Some(true)),
            (r"(\d{1,2})\.(\d{2})\s*am", Some(false)),
            (r"(\d{1,2}):(\d{2})\s*am", Some(false)),
            (r"(\d{1,2})\s*am", Some(false)),
            (r"at\s+(\d{1,2})", None),
        ]
        .iter()
        .map(|(pattern, is_pm)| (Regex::new(pattern).expect("time pattern compiles"), *is_pm))
        .collect()
    });

    for (pattern, is_pm) in patterns {
        let Some(captures) = pattern.captures(req) else {
            continue;
        };
        let Some(mut hour) = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let minute =
            captures.get(2).and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(0);

        match is_pm {
            Some(true) if hour < 12 => hour += 12,
            Some(false) if hour == 12 => hour = 0,
            _ => {}
        }

        if hour <= 23 && minute <= 59 {
            return (hour, minute);
        }
    }

    (DEFAULT_HOUR, 0)
}

fn resolve_event_window(
    req: &str,
    now: DateTime<FixedOffset>,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let (hour, minute) = resolve_time(req);
    let mut date = resolve_target_date(req, now);

    let mut start = at_time(date, hour, minute, now).unwrap_or(now + Duration::hours(1));
    // Asked for today but the time already passed: shift to tomorrow.
    if date == now.date_naive() && start < now {
        date += Duration::days(1);
        start = at_time(date, hour, minute, now).unwrap_or(now + Duration::hours(1));
    }

    (start, start + Duration::hours(1))
}

fn at_time(
    date: NaiveDate,
    hour: u32,
    minute: u32,
    anchor: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(hour, minute, 0)?.and_local_timezone(*anchor.offset()).single()
}

fn extract_attendees(user_request: &str) -> Vec<String> {
    attendee_pattern().find_iter(user_request).map(|found| found.as_str().to_string()).collect()
}

fn extract_channel(user_request: &str) -> String {
    channel_pattern()
        .captures(user_request)
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_CHANNEL.to_string())
}

fn extract_title(req: &str) -> String {
    static TITLE_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = TITLE_PATTERNS.get_or_init(|| {
        [
            r"^(.*?)\s+(?:at|on|for|@)\s+\d",
            r"^(.*?)\s+(?:with|to)\s+[\w@.]+@",
            r"^(.*?)\s+(?:feb|jan|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("title pattern compiles"))
        .collect()
    });

    let cleaned = noise_word_pattern().replace_all(req, "");

    for pattern in patterns {
        if let Some(captures) = pattern.captures(&cleaned) {
            let title = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
            if title.len() > 3 {
                return title_case(&title);
            }
        }
    }

    let words: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|word| word.len() > 2 && !word.starts_with('@'))
        .collect();
    if words.len() >= 2 {
        return title_case(&words[..words.len().min(3)].join(" "));
    }

    "Meeting".to_string()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_message_text(req: &str) -> Option<String> {
    static MESSAGE_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = MESSAGE_PATTERNS.get_or_init(|| {
        [
            r#"message\s+['"](.+?)['"]"#,
            r#"send\s+['"](.+?)['"]"#,
            r#"post\s+['"](.+?)['"]"#,
            r#"slack\s+['"](.+?)['"]"#,
            r"like\s+(.+?)\s+in\s+#",
            r"like\s+(.+?)\s+to\s+#",
            r"message\s+like\s+(.+?)\s+(?:in|to)\s+#",
            r"like\s+(.+?)\s+(?:in|to)\s+(?:#\w+|\w+\s+group)",
            r"(?:send|post)\s+(?:message\s+)?like\s+(.+?)\s+(?:in|to)",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("message pattern compiles"))
        .collect()
    });

    patterns.iter().find_map(|pattern| {
        pattern
            .captures(req)
            .and_then(|captures| captures.get(1))
            .map(|found| found.as_str().trim().to_string())
    })
}

fn step(
    id: &str,
    action: &str,
    tool: &str,
    input: Value,
    depends_on: Vec<&str>,
    expected_output: &str,
) -> Value {
    json!({
        "id": id,
        "action": action,
        "tool": tool,
        "input": input,
        "depends_on": depends_on,
        "expected_output": expected_output,
    })
}

/// Builds a raw plan from keyword rules: read-and-summarize, calendar
/// event, Slack notification or standalone message, with a post-to-Slack
/// fallback when nothing matches.
pub fn build_plan(user_request: &str, now: DateTime<FixedOffset>, timezone: &str) -> Value {
    let req = user_request.to_lowercase();

    let (start, end) = resolve_event_window(&req, now);
    let attendees = extract_attendees(user_request);
    let title = extract_title(&req);
    let channel = extract_channel(user_request);

    let mut steps: Vec<Value> = Vec::new();

    let wants_read = req.contains("read") || req.contains("fetch") || req.contains("get");
    let about_messages = req.contains("message") || req.contains("slack");
    let wants_summary =
        req.contains("summarize") || req.contains("summarise") || req.contains("summary");

    if wants_read && about_messages && wants_summary {
        steps.push(step(
            "S1",
            "Read Slack messages",
            "slack.read_messages",
            json!({"channel": channel, "limit": 100}),
            vec![],
            "List of messages",
        ));
        steps.push(step(
            "S2",
            "Summarize messages with AI",
            "slack.summarize_messages",
            json!({}),
            vec!["S1"],
            "Summary text",
        ));
    } else if req.contains("meeting")
        || req.contains("schedule")
        || req.contains("event")
        || req.contains("mark")
        || req.contains("book")
    {
        let mut event_input = Map::new();
        event_input.insert("title".to_string(), Value::String(title.clone()));
        event_input.insert("start_time".to_string(), Value::String(start.to_rfc3339()));
        event_input.insert("end_time".to_string(), Value::String(end.to_rfc3339()));
        event_input.insert("timezone".to_string(), Value::String(timezone.to_string()));
        if !attendees.is_empty() {
            event_input.insert("attendees".to_string(), json!(attendees));
        }

        steps.push(step(
            "S1",
            "Create meeting event",
            "calendar.create_event",
            Value::Object(event_input),
            vec![],
            "Event ID",
        ));
    }

    let has_calendar_step =
        steps.iter().any(|s| s.get("tool").and_then(Value::as_str) == Some("calendar.create_event"));
    let mentions_slack = req.contains("slack")
        || req.contains("post")
        || req.contains("notify")
        || req.contains("send");

    if mentions_slack && !has_calendar_step {
        let text = extract_message_text(&req).unwrap_or_else(|| user_request.to_string());
        let id = if steps.is_empty() { "S1" } else { "S2" };
        let depends_on = if steps.iter().any(|s| s.get("id").and_then(Value::as_str) == Some("S1"))
        {
            vec!["S1"]
        } else {
            vec![]
        };

        steps.push(step(
            id,
            "Post message in Slack",
            "slack.post_message",
            json!({"channel": channel, "text": text}),
            depends_on,
            "Message ID",
        ));
    } else if has_calendar_step
        && (req.contains("slack") || req.contains("post") || req.contains("notify"))
    {
        steps.push(step(
            "S2",
            "Post meeting notification in Slack",
            "slack.post_message",
            json!({"channel": channel, "text": format!("\u{1F4C5} Meeting '{title}' scheduled")}),
            vec!["S1"],
            "Message ID",
        ));
    }

    if steps.is_empty() {
        static FALLBACK_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = FALLBACK_PATTERNS.get_or_init(|| {
            [r"like\s+(.+)", r"say\s+(.+)"]
                .iter()
                .map(|pattern| Regex::new(pattern).expect("fallback pattern compiles"))
                .collect()
        });
        let text = patterns
            .iter()
            .find_map(|pattern| {
                pattern
                    .captures(&req)
                    .and_then(|captures| captures.get(1))
                    .map(|found| found.as_str().trim().to_string())
            })
            .unwrap_or_else(|| user_request.to_string());

        steps.push(step(
            "S1",
            "Post message in Slack",
            "slack.post_message",
            json!({"channel": channel, "text": text}),
            vec![],
            "Message ID",
        ));
    }

    json!({"goal": user_request, "steps": steps})
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, TimeZone};
    use serde_json::Value;

    use super::build_plan;

    const TZ: &str = "Asia/Kolkata";

    // Thursday, 2026-01-29 12:00 IST
    fn anchor() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(5 * 3600 + 1800)
            .expect("offset")
            .with_ymd_and_hms(2026, 1, 29, 12, 0, 0)
            .single()
            .expect("anchor")
    }

    fn steps(plan: &Value) -> &Vec<Value> {
        plan["steps"].as_array().expect("steps array")
    }

    #[test]
    fn calendar_request_parses_month_day_and_pm_time() {
        let plan = build_plan(
            "schedule team sync feb 1 at 9.00 pm with alice@example.com",
            anchor(),
            TZ,
        );

        let steps = steps(&plan);
        assert_eq!(steps.len(), 1);
        let input = &steps[0]["input"];
        assert_eq!(steps[0]["tool"], "calendar.create_event");
        assert_eq!(input["start_time"], "2026-02-01T21:00:00+05:30");
        assert_eq!(input["end_time"], "2026-02-01T22:00:00+05:30");
        assert_eq!(input["timezone"], TZ);
        assert_eq!(input["attendees"], serde_json::json!(["alice@example.com"]));
        assert_eq!(input["title"], "Team Sync");
    }

    #[test]
    fn passed_date_rolls_to_next_year() {
        let plan = build_plan("book a review meeting on jan 5", anchor(), TZ);
        let start = steps(&plan)[0]["input"]["start_time"].as_str().expect("start");
        assert!(start.starts_with("2027-01-05"), "{start}");
    }

    #[test]
    fn today_with_elapsed_time_moves_to_tomorrow() {
        let plan = build_plan("schedule standup today at 9 am", anchor(), TZ);
        let start = steps(&plan)[0]["input"]["start_time"].as_str().expect("start");
        assert_eq!(start, "2026-01-30T09:00:00+05:30");
    }

    #[test]
    fn unspecified_date_defaults_to_tomorrow_four_pm() {
        let plan = build_plan("book a planning meeting", anchor(), TZ);
        let start = steps(&plan)[0]["input"]["start_time"].as_str().expect("start");
        assert_eq!(start, "2026-01-30T16:00:00+05:30");
    }

    #[test]
    fn read_and_summarize_produces_dependent_steps() {
        let plan = build_plan("read messages from #standup and summarize them", anchor(), TZ);

        let steps = steps(&plan);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0]["tool"], "slack.read_messages");
        assert_eq!(steps[0]["input"]["channel"], "#standup");
        assert_eq!(steps[1]["tool"], "slack.summarize_messages");
        assert_eq!(steps[1]["depends_on"], serde_json::json!(["S1"]));
    }

    #[test]
    fn quoted_message_text_is_extracted_for_standalone_posts() {
        let plan = build_plan("post message 'hello world' in #random", anchor(), TZ);

        let steps = steps(&plan);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0]["tool"], "slack.post_message");
        assert_eq!(steps[0]["input"]["channel"], "#random");
        assert_eq!(steps[0]["input"]["text"], "hello world");
    }

    #[test]
    fn meeting_with_notify_adds_a_dependent_slack_step() {
        let plan = build_plan("schedule team sync tomorrow at 4 pm and notify #general", anchor(), TZ);

        let steps = steps(&plan);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0]["tool"], "calendar.create_event");
        assert_eq!(steps[1]["tool"], "slack.post_message");
        assert_eq!(steps[1]["depends_on"], serde_json::json!(["S1"]));
        let text = steps[1]["input"]["text"].as_str().expect("text");
        assert!(text.contains("scheduled"), "{text}");
    }

    #[test]
    fn unmatched_request_falls_back_to_slack_post() {
        let plan = build_plan("say hello there", anchor(), TZ);

        let steps = steps(&plan);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0]["tool"], "slack.post_message");
        assert_eq!(steps[0]["input"]["channel"], "#general");
        assert_eq!(steps[0]["input"]["text"], "hello there");
    }

    #[test]
    fn planner_is_deterministic_for_a_fixed_anchor() {
        let request = "schedule demo prep feb 3 at 10 am and notify #demo";
        assert_eq!(build_plan(request, anchor(), TZ), build_plan(request, anchor(), TZ));
    }
}
