//! Sage — community-support bot core.
//!
//! Given an inbound chat message, decide whether to process it (per-user
//! sliding-window rate limit, persisted cooldown), find the best-matching
//! curated FAQ entry (exact-match short-circuit, token-overlap scoring with
//! a numeric-code veto), and record usage/feedback telemetry atomically.
//! Platform concerns (embeds, buttons, permissions) stay outside; the
//! surrounding bot framework talks to the core through plain data types and
//! the webhook event server.

pub mod config;
pub mod faq;
pub mod pipeline;
pub mod server;
pub mod stats;
pub mod storage;

pub use config::SageConfig;
pub use faq::{FaqEntry, FaqMatcher};
pub use pipeline::{AutoResponder, InboundMessage, MatchOutcome, ReactionEvent};
pub use storage::SqliteStore;

use pipeline::CooldownGate;
use stats::response_log::ResponseLogger;
use stats::UsageTracker;
use std::sync::Arc;

/// Wire the pipeline over a single concrete store.
pub fn build_responder(
    store: Arc<SqliteStore>,
    config: &config::ResponderConfig,
) -> AutoResponder {
    AutoResponder::new(
        config,
        store.clone(),
        store.clone(),
        CooldownGate::with_duration(store.clone(), config.cooldown_ms),
        UsageTracker::new(store.clone()),
        ResponseLogger::new(store),
    )
}
