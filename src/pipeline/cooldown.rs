//! Persisted per-user FAQ answering cooldown.
//!
//! Distinct policy from the rate limiter: a short fixed interval that
//! throttles how often the FAQ machinery runs for one user, re-armed on
//! every allowed check whether or not a match is found. Expiries live in the
//! store so the gate survives process restarts.
//!
//! Two concurrent messages from one user can both read "not on cooldown"
//! before either arm-write lands. That race is accepted: the gate is a
//! best-effort throttle, and store-level last-writer-wins on the expiry is
//! all the coordination it needs.

use crate::storage::CooldownStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Default cooldown between answered questions: 3 seconds.
const DEFAULT_COOLDOWN_MS: i64 = 3000;

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownStatus {
    pub allowed: bool,
    /// Whole seconds until the gate reopens, rounded up (0 when allowed).
    pub remaining_secs: u64,
}

pub struct CooldownGate {
    store: Arc<dyn CooldownStore>,
    duration: Duration,
}

impl CooldownGate {
    pub fn new(store: Arc<dyn CooldownStore>) -> Self {
        Self::with_duration(store, DEFAULT_COOLDOWN_MS)
    }

    pub fn with_duration(store: Arc<dyn CooldownStore>, cooldown_ms: i64) -> Self {
        Self {
            store,
            duration: Duration::milliseconds(cooldown_ms),
        }
    }

    /// Check the gate for `user_id` and, when it allows, immediately re-arm
    /// it for the full cooldown duration.
    ///
    /// Store failures fail open: answering is a convenience feature, so a
    /// broken store must not suppress it. Both the failed read and the
    /// failed arm are logged and otherwise ignored.
    pub async fn check_and_arm(&self, user_id: &str, now: DateTime<Utc>) -> CooldownStatus {
        let key = cooldown_key(user_id);

        match self.store.get_expiry(&key).await {
            Ok(Some(expires_at)) if expires_at > now => {
                return CooldownStatus {
                    allowed: false,
                    remaining_secs: ceil_secs(expires_at - now),
                };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(user_id, error = %e, "cooldown lookup failed; allowing message");
            }
        }

        if let Err(e) = self.store.upsert_expiry(&key, now + self.duration).await {
            tracing::warn!(user_id, error = %e, "failed to arm cooldown");
        }

        CooldownStatus {
            allowed: true,
            remaining_secs: 0,
        }
    }
}

fn cooldown_key(user_id: &str) -> String {
    format!("faq_cooldown_{user_id}")
}

fn ceil_secs(d: Duration) -> u64 {
    let ms = d.num_milliseconds().max(0) as u64;
    ms.div_ceil(1000)
}
