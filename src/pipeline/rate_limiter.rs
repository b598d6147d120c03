//! Per-user sliding-window rate limiting for question messages.
//!
//! ## Design
//! - In-memory window per user id; state is lost on restart, which is fine
//!   for a soft throttle
//! - `admit` only inspects the window; the slot is consumed by `record`,
//!   which the pipeline calls after the cooldown stage allows. A message
//!   rejected purely by cooldown therefore burns no quota
//! - Denials carry a warn-once-per-window flag so the caller can notify the
//!   user without spamming them on every deleted message

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Default: 5 questions per minute.
const DEFAULT_MAX_PER_WINDOW: usize = 5;

/// Default window: 60 seconds.
const DEFAULT_WINDOW_SECS: i64 = 60;

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Whether the message may proceed down the pipeline.
    pub admitted: bool,
    /// Seconds until the window frees a slot (0 when admitted).
    pub retry_after_secs: u64,
    /// Whether the caller should notify the user about this denial.
    pub should_warn: bool,
}

/// Per-user window state.
#[derive(Debug, Default)]
struct RateLimitState {
    /// One entry per recorded question inside the trailing window.
    timestamps: Vec<DateTime<Utc>>,
    /// Last time the user was warned about a denial.
    last_warning: Option<DateTime<Utc>>,
}

/// Sliding-window rate limiter. Construct one instance at startup and share
/// it; tests instantiate their own isolated instances.
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    states: Mutex<HashMap<String, RateLimitState>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_PER_WINDOW, DEFAULT_WINDOW_SECS)
    }
}

impl RateLimiter {
    pub fn with_limits(max_per_window: usize, window_secs: i64) -> Self {
        Self {
            max_per_window,
            window: Duration::seconds(window_secs),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a message from `user_id` may proceed. Never consumes a
    /// slot — pair with [`record`](Self::record) once the message is
    /// actually processed. First call from an unknown user always admits.
    pub fn admit(&self, user_id: &str, now: DateTime<Utc>) -> Admission {
        let mut states = self.states.lock();
        let state = states.entry(user_id.to_string()).or_default();

        let window_start = now - self.window;
        state.timestamps.retain(|&ts| ts >= window_start);

        if state.timestamps.len() >= self.max_per_window {
            let oldest = state.timestamps[0];
            let retry_after = self.window - (now - oldest);
            let should_warn = state
                .last_warning
                .is_none_or(|warned| now - warned >= self.window);
            if should_warn {
                state.last_warning = Some(now);
            }
            return Admission {
                admitted: false,
                retry_after_secs: ceil_secs(retry_after),
                should_warn,
            };
        }

        Admission {
            admitted: true,
            retry_after_secs: 0,
            should_warn: false,
        }
    }

    /// Consume one slot for `user_id`. Called by the pipeline only after the
    /// cooldown gate allows the message.
    pub fn record(&self, user_id: &str, now: DateTime<Utc>) {
        let mut states = self.states.lock();
        states.entry(user_id.to_string()).or_default().timestamps.push(now);
    }

    /// Drop users whose windows are empty and whose last warning is stale.
    /// Call opportunistically to bound the map.
    pub fn cleanup_stale(&self, now: DateTime<Utc>) {
        let window_start = now - self.window;
        let mut states = self.states.lock();
        states.retain(|_, state| {
            state.timestamps.retain(|&ts| ts >= window_start);
            !state.timestamps.is_empty()
                || state.last_warning.is_some_and(|w| now - w < self.window)
        });
    }

    /// Number of tracked users.
    pub fn tracked_users(&self) -> usize {
        self.states.lock().len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let ms = d.num_milliseconds().max(0) as u64;
    ms.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    /// admit + record in one step, as the pipeline does for a processed message.
    fn consume(limiter: &RateLimiter, user: &str, now: DateTime<Utc>) -> Admission {
        let admission = limiter.admit(user, now);
        if admission.admitted {
            limiter.record(user, now);
        }
        admission
    }

    #[test]
    fn first_call_from_unknown_user_admits() {
        let limiter = RateLimiter::default();
        assert!(limiter.admit("u1", at(0)).admitted);
    }

    #[test]
    fn sixth_message_in_window_is_denied() {
        let limiter = RateLimiter::with_limits(5, 60);
        for i in 0..5 {
            assert!(consume(&limiter, "u1", at(i * 10)).admitted);
        }
        let denied = consume(&limiter, "u1", at(50));
        assert!(!denied.admitted);
        assert!(denied.retry_after_secs > 0);
    }

    #[test]
    fn window_slides_past_oldest_timestamp() {
        let limiter = RateLimiter::with_limits(5, 60);
        for i in 0..5 {
            assert!(consume(&limiter, "u1", at(i * 10)).admitted);
        }
        // 61 s after the first message its timestamp has left the window
        assert!(consume(&limiter, "u1", at(61)).admitted);
    }

    #[test]
    fn retry_after_counts_from_the_oldest_slot() {
        let limiter = RateLimiter::with_limits(2, 60);
        limiter.record("u1", at(0));
        limiter.record("u1", at(10));
        let denied = limiter.admit("u1", at(30));
        // oldest slot frees at t=60, 30 s from now
        assert_eq!(denied.retry_after_secs, 30);
    }

    #[test]
    fn admit_alone_never_consumes_a_slot() {
        let limiter = RateLimiter::with_limits(2, 60);
        for _ in 0..10 {
            assert!(limiter.admit("u1", at(0)).admitted);
        }
    }

    #[test]
    fn denial_warns_once_per_window() {
        let limiter = RateLimiter::with_limits(1, 60);
        limiter.record("u1", at(0));

        let first = limiter.admit("u1", at(1));
        assert!(!first.admitted);
        assert!(first.should_warn);

        let second = limiter.admit("u1", at(2));
        assert!(!second.admitted);
        assert!(!second.should_warn);

        // a full window after the first warning, warn again
        limiter.record("u1", at(70));
        let later = limiter.admit("u1", at(80));
        assert!(!later.admitted);
        assert!(later.should_warn);
    }

    #[test]
    fn users_are_tracked_independently() {
        let limiter = RateLimiter::with_limits(1, 60);
        limiter.record("u1", at(0));
        assert!(!limiter.admit("u1", at(1)).admitted);
        assert!(limiter.admit("u2", at(1)).admitted);
    }

    #[test]
    fn cleanup_drops_idle_users() {
        let limiter = RateLimiter::with_limits(5, 60);
        limiter.record("u1", at(0));
        limiter.record("u2", at(100));
        assert_eq!(limiter.tracked_users(), 2);

        limiter.cleanup_stale(at(120));
        assert_eq!(limiter.tracked_users(), 1);
    }
}
