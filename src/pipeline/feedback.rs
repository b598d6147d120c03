//! Reaction-feedback collection windows.
//!
//! After an FAQ reply goes out, the asking user gets a fixed window (60 s by
//! default) to react with a verdict. The router holds one pending window per
//! user; a reaction that arrives inside the window for the right FAQ is
//! claimed exactly once, everything else is ignored. Expired windows are
//! purged lazily — no background reaper.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Default reaction collection window: 60 seconds.
const DEFAULT_WINDOW_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct PendingFeedback {
    faq_id: String,
    opened_at: DateTime<Utc>,
}

pub struct FeedbackRouter {
    window: Duration,
    pending: Mutex<HashMap<String, PendingFeedback>>,
}

impl Default for FeedbackRouter {
    fn default() -> Self {
        Self::with_window(DEFAULT_WINDOW_SECS)
    }
}

impl FeedbackRouter {
    pub fn with_window(window_secs: i64) -> Self {
        Self {
            window: Duration::seconds(window_secs),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window.num_seconds().max(0) as u64
    }

    /// Open a collection window for `user_id` on `faq_id`. A newer reply
    /// replaces any previous window for the same user.
    pub fn open(&self, user_id: &str, faq_id: &str, now: DateTime<Utc>) {
        let mut pending = self.pending.lock();
        pending.insert(
            user_id.to_string(),
            PendingFeedback {
                faq_id: faq_id.to_string(),
                opened_at: now,
            },
        );
        // Lazy purge keeps the map bounded by active users.
        let window = self.window;
        pending.retain(|_, p| now - p.opened_at <= window);
    }

    /// Claim the pending window for this reaction. Returns true exactly once
    /// per window, and only while the window is fresh and the FAQ matches.
    pub fn claim(&self, user_id: &str, faq_id: &str, now: DateTime<Utc>) -> bool {
        let mut pending = self.pending.lock();
        let Some(p) = pending.get(user_id) else {
            return false;
        };
        let fresh = now - p.opened_at <= self.window;
        let matched = p.faq_id == faq_id;

        if !fresh {
            pending.remove(user_id);
            return false;
        }
        if matched {
            pending.remove(user_id);
            return true;
        }
        false
    }

    /// Number of open windows (stale ones included until next purge).
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
