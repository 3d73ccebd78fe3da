use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Sliding-window limits applied to tool invocations.
///
/// Injectable configuration, not a hidden singleton: tests construct a
/// fresh limiter per test to avoid cross-test leakage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub overall_limit: usize,
    pub duplicate_window_secs: u64,
    pub per_tool: HashMap<String, usize>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut per_tool = HashMap::new();
        per_tool.insert("slack.post_message".to_string(), 50);
        per_tool.insert("calendar.create_event".to_string(), 50);
        Self { window_secs: 3600, overall_limit: 100, duplicate_window_secs: 30, per_tool }
    }
}

/// Outcome of a single `check_and_record` call. `reason` is a
/// human-readable rejection message including the remaining wait time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LimiterDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl LimiterDecision {
    fn allow() -> Self {
        Self { allowed: true, reason: None }
    }

    fn reject(reason: String) -> Self {
        Self { allowed: false, reason: Some(reason) }
    }
}

/// Usage counters inside the current window, for operator inspection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LimiterStats {
    pub overall_requests_in_window: usize,
    pub tool_usage: HashMap<String, usize>,
}

#[derive(Debug, Default)]
struct LimiterState {
    tool_requests: HashMap<String, VecDeque<DateTime<Utc>>>,
    all_requests: VecDeque<DateTime<Utc>>,
    recent_hashes: HashMap<String, DateTime<Utc>>,
}

/// In-memory sliding-window rate limiter with duplicate-request
/// suppression. The single piece of state shared across concurrent plan
/// validations; a coarse lock is sufficient since every operation is
/// O(window size) and brief.
///
/// State is process-lifetime only and resets on restart by design.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<LimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config, state: Mutex::new(LimiterState::default()) }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks all limits for one tool invocation and, when allowed, records
    /// it. Called once per (step, tool) during validation — never repeated
    /// for the same step, so duplicate suppression stays accurate.
    ///
    /// `request_text` enables duplicate detection: an identical normalized
    /// request for the same tool within the duplicate window is rejected
    /// with the remaining wait time.
    pub fn check_and_record(&self, tool_name: &str, request_text: Option<&str>) -> LimiterDecision {
        self.check_and_record_at(tool_name, request_text, Utc::now())
    }

    /// Clock-injected variant of `check_and_record`, used by tests to
    /// simulate window expiry without sleeping.
    pub fn check_and_record_at(
        &self,
        tool_name: &str,
        request_text: Option<&str>,
        now: DateTime<Utc>,
    ) -> LimiterDecision {
        let mut state = self.lock_state();
        let window = Duration::seconds(self.config.window_secs as i64);
        prune(&mut state, now - window);

        // Duplicate suppression runs before any capacity checks, and the
        // hash is recorded even if a cap later rejects the call.
        if let Some(text) = request_text {
            let key = request_hash(text, tool_name);
            if let Some(last_seen) = state.recent_hashes.get(&key) {
                let elapsed = (now - *last_seen).num_seconds();
                let cooldown = self.config.duplicate_window_secs as i64;
                if elapsed < cooldown {
                    return LimiterDecision::reject(format!(
                        "Duplicate request detected. Please wait {} seconds before retrying.",
                        cooldown - elapsed
                    ));
                }
            }
            state.recent_hashes.insert(key, now);
        }

        if state.all_requests.len() >= self.config.overall_limit {
            let wait = self.secs_until_oldest_expires(state.all_requests.front(), now);
            return LimiterDecision::reject(format!(
                "Too many requests. Global limit: {} per hour. Try again in {} minutes.",
                self.config.overall_limit,
                wait / 60
            ));
        }

        if let Some(&limit) = self.config.per_tool.get(tool_name) {
            let queue = state.tool_requests.entry(tool_name.to_string()).or_default();
            if queue.len() >= limit {
                let wait = self.secs_until_oldest_expires(queue.front(), now);
                return LimiterDecision::reject(format!(
                    "Rate limit exceeded for {tool_name}. Limit: {limit} per hour. Try again in {}.",
                    format_wait(wait)
                ));
            }
        }

        let overall_cap = self.config.overall_limit;
        let queue = state.tool_requests.entry(tool_name.to_string()).or_default();
        push_bounded(queue, now, overall_cap);
        push_bounded(&mut state.all_requests, now, overall_cap);

        LimiterDecision::allow()
    }

    pub fn stats(&self) -> LimiterStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> LimiterStats {
        let mut state = self.lock_state();
        let window = Duration::seconds(self.config.window_secs as i64);
        prune(&mut state, now - window);

        LimiterStats {
            overall_requests_in_window: state.all_requests.len(),
            tool_usage: state
                .tool_requests
                .iter()
                .filter(|(_, queue)| !queue.is_empty())
                .map(|(tool, queue)| (tool.clone(), queue.len()))
                .collect(),
        }
    }

    fn secs_until_oldest_expires(&self, oldest: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
        let window = self.config.window_secs as i64;
        oldest.map(|ts| (window - (now - *ts).num_seconds()).max(0)).unwrap_or(window)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LimiterState> {
        // A poisoned lock only means another thread panicked mid-check; the
        // timestamp queues are still structurally sound.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn prune(state: &mut LimiterState, cutoff: DateTime<Utc>) {
    for queue in state.tool_requests.values_mut() {
        while queue.front().is_some_and(|ts| *ts < cutoff) {
            queue.pop_front();
        }
    }
    state.tool_requests.retain(|_, queue| !queue.is_empty());
    while state.all_requests.front().is_some_and(|ts| *ts < cutoff) {
        state.all_requests.pop_front();
    }
    state.recent_hashes.retain(|_, ts| *ts >= cutoff);
}

fn push_bounded(queue: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>, capacity: usize) {
    if queue.len() >= capacity {
        queue.pop_front();
    }
    queue.push_back(now);
}

fn request_hash(request_text: &str, tool_name: &str) -> String {
    let normalized = format!("{}:{tool_name}", request_text.trim().to_lowercase());
    blake3::hash(normalized.as_bytes()).to_hex().to_string()
}

fn format_wait(total_secs: i64) -> String {
    let minutes = total_secs / 60;
    if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        format!("{total_secs} seconds")
    }
}
