//! Persistence seams for the responder core.
//!
//! The core consumes narrow trait objects rather than a concrete database so
//! tests can substitute in-memory doubles and the admin tooling can own the
//! write side of the FAQ corpus. [`sqlite::SqliteStore`] implements every
//! trait over one WAL database.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::faq::FaqEntry;
use crate::stats::response_log::BotResponseLog;
use crate::stats::{FaqUsageStat, Sentiment, UsageEvent, UsageFilter, UsageSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Classified persistence failure surfaced by the store traits.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only view of the admin-curated FAQ corpus.
#[async_trait]
pub trait FaqStore: Send + Sync {
    /// Full corpus in insertion order.
    async fn list_all(&self) -> StoreResult<Vec<FaqEntry>>;
}

/// Persisted per-user cooldown expiries (epoch-millis precision).
#[async_trait]
pub trait CooldownStore: Send + Sync {
    async fn get_expiry(&self, key: &str) -> StoreResult<Option<DateTime<Utc>>>;
    /// Upsert with last-writer-wins semantics on `expires_at`.
    async fn upsert_expiry(&self, key: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;
}

/// Usage/feedback telemetry keyed by FAQ identity.
///
/// Both write operations must be atomic against the store — no
/// read-modify-write round trip exists for concurrent tasks to interleave.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Increment usage count and category rollup, refresh the denormalized
    /// question/category/last-used fields, and append one history row — all
    /// as a single atomic operation.
    async fn record_usage(&self, event: &UsageEvent) -> StoreResult<()>;

    /// Upsert-increment the positive or negative tally.
    async fn record_feedback(&self, faq_id: &str, sentiment: Sentiment) -> StoreResult<()>;

    /// Full stat row (including history) for one FAQ, if any usage exists.
    async fn stat(&self, faq_id: &str) -> StoreResult<Option<FaqUsageStat>>;

    /// Aggregate summary over the filtered stat rows.
    async fn summary(&self, filter: &UsageFilter) -> StoreResult<UsageSummary>;
}

/// Bot-level settings mutated by external admin tooling.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Channel ids where auto-response is switched off.
    async fn disabled_channels(&self) -> StoreResult<HashSet<String>>;
    async fn set_channel_disabled(&self, channel_id: &str, disabled: bool) -> StoreResult<()>;
}

/// Append-only audit log of bot responses.
#[async_trait]
pub trait ResponseLogStore: Send + Sync {
    async fn append(&self, entry: &BotResponseLog) -> StoreResult<()>;
}
