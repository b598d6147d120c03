//! FAQ usage and feedback telemetry.
//!
//! [`UsageTracker`] is the write-side service: every answered question bumps
//! the per-FAQ stat row and appends a history entry in one atomic store
//! operation, so `usage_count` always equals the history length. Reaction
//! feedback lands in an independent positive/negative tally.
//!
//! Write failures never propagate — FAQ answering is a convenience feature,
//! and a broken stats store must not stop the bot from answering.

pub mod response_log;

use crate::faq::FaqEntry;
use crate::storage::UsageStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// User verdict on an FAQ reply, delivered through the reaction channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// One answered question, ready to be recorded.
#[derive(Debug, Clone)]
pub struct UsageEvent {
    pub faq_id: String,
    pub question: String,
    pub category: String,
    pub user_id: String,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
}

/// One row of the append-only usage history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Positive/negative reaction tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackTally {
    pub positive: i64,
    pub negative: i64,
}

/// Full per-FAQ stat row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqUsageStat {
    pub faq_id: String,
    pub question: String,
    pub category: String,
    pub usage_count: i64,
    /// Denormalized per-category rollup. Redundant with `category`; tolerated.
    pub categories: BTreeMap<String, i64>,
    pub feedback: FeedbackTally,
    pub last_used: DateTime<Utc>,
    pub usage_history: Vec<UsageRecord>,
}

/// Filters for the aggregate summary (all optional).
#[derive(Debug, Clone, Default)]
pub struct UsageFilter {
    /// Exact category path.
    pub category: Option<String>,
    /// Only rows last used at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only FAQs this user has triggered at least once.
    pub user_id: Option<String>,
    /// Cap on the `top_faqs` list (default 10).
    pub limit: Option<u32>,
}

/// Lightweight row for summary listings (no history).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqUsageRow {
    pub faq_id: String,
    pub question: String,
    pub category: String,
    pub usage_count: i64,
    pub feedback: FeedbackTally,
    pub last_used: DateTime<Utc>,
}

/// Aggregate usage report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_uses: i64,
    pub faq_count: i64,
    pub feedback: FeedbackTally,
    /// Per-category totals, most used first.
    pub by_category: Vec<(String, i64)>,
    /// Most used FAQs, strongest first.
    pub top_faqs: Vec<FaqUsageRow>,
}

/// Write-side telemetry recorder.
pub struct UsageTracker {
    store: Arc<dyn UsageStore>,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    /// Record one answered question. Best-effort: store failures are logged
    /// and swallowed so the reply still goes out.
    pub async fn record_usage(
        &self,
        faq: &FaqEntry,
        user_id: &str,
        user_name: &str,
        now: DateTime<Utc>,
    ) {
        let event = UsageEvent {
            faq_id: faq.id.clone(),
            question: faq.question.clone(),
            category: faq.category.clone(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            timestamp: now,
        };
        if let Err(e) = self.store.record_usage(&event).await {
            tracing::warn!(faq_id = %faq.id, error = %e, "failed to record FAQ usage");
        }
    }

    /// Record one reaction verdict. Best-effort, same policy as usage.
    pub async fn record_feedback(&self, faq_id: &str, sentiment: Sentiment) {
        if let Err(e) = self.store.record_feedback(faq_id, sentiment).await {
            tracing::warn!(faq_id, sentiment = sentiment.as_str(), error = %e, "failed to record FAQ feedback");
        }
    }

    /// Read side for operators; store failures propagate to the caller here.
    pub async fn summary(&self, filter: &UsageFilter) -> anyhow::Result<UsageSummary> {
        Ok(self.store.summary(filter).await?)
    }

    pub async fn stat(&self, faq_id: &str) -> anyhow::Result<Option<FaqUsageStat>> {
        Ok(self.store.stat(faq_id).await?)
    }
}
