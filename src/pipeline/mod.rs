//! The auto-response pipeline.
//!
//! One inbound message flows rate limiter → cooldown gate → matcher →
//! telemetry, producing a [`MatchOutcome`] that the surrounding bot
//! framework renders (reply embed, message deletion, DM warning). The core
//! never sees a platform message type — callers hand it an
//! [`InboundMessage`] and get a plain data outcome back.
//!
//! ## Design
//! - a rate-limit denial is decided before anything touches the store
//! - a cooldown-denied message does not consume a rate-limit slot; the slot
//!   is recorded only once the cooldown allows
//! - every store failure downgrades to the neutral outcome for that stage
//!   (deny-path reads fail open, telemetry writes are best-effort) so one
//!   bad message never destabilizes the event loop

pub mod cooldown;
pub mod feedback;
pub mod rate_limiter;

pub use cooldown::{CooldownGate, CooldownStatus};
pub use feedback::FeedbackRouter;
pub use rate_limiter::{Admission, RateLimiter};

use crate::config::ResponderConfig;
use crate::faq::{FaqEntry, FaqMatcher};
use crate::stats::response_log::ResponseLogger;
use crate::stats::{Sentiment, UsageTracker};
use crate::storage::{FaqStore, SettingsStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Platform-agnostic view of one inbound chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    /// Authored by a bot account; such messages are never answered.
    #[serde(default)]
    pub from_bot: bool,
}

/// A reaction verdict delivered by the platform glue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub user_id: String,
    pub faq_id: String,
    pub sentiment: Sentiment,
}

/// Why a message was skipped without touching the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    BotAuthor,
    ChannelDisabled,
}

/// A weak candidate offered when no strong match exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedFaq {
    pub faq: FaqEntry,
    pub score: f64,
}

/// Terminal outcome for one message, rendered by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Not a candidate for auto-response at all; no reply, no side effects.
    Skipped { reason: SkipReason },
    /// Over the per-user question quota. The caller deletes the message and,
    /// when `should_warn`, notifies the user out-of-band.
    RateLimited {
        retry_after_secs: u64,
        should_warn: bool,
    },
    /// Asking again too quickly; the caller replies with the wait time.
    OnCooldown { remaining_secs: u64 },
    /// Nothing cleared the threshold. Silence is the correct reply; the
    /// related list is available for an optional "maybe you meant".
    NoMatch { related: Vec<RelatedFaq> },
    /// A match was found and telemetry recorded; the caller renders the
    /// answer and collects reactions for `feedback_window_secs`.
    Matched {
        faq: FaqEntry,
        feedback_window_secs: u64,
    },
}

/// The assembled pipeline. Construct once at startup and share.
pub struct AutoResponder {
    faqs: Arc<dyn FaqStore>,
    settings: Arc<dyn SettingsStore>,
    matcher: FaqMatcher,
    rate_limiter: RateLimiter,
    cooldown: CooldownGate,
    usage: UsageTracker,
    response_log: ResponseLogger,
    feedback: FeedbackRouter,
    related_limit: usize,
}

impl AutoResponder {
    pub fn new(
        config: &ResponderConfig,
        faqs: Arc<dyn FaqStore>,
        settings: Arc<dyn SettingsStore>,
        cooldown: CooldownGate,
        usage: UsageTracker,
        response_log: ResponseLogger,
    ) -> Self {
        Self {
            faqs,
            settings,
            matcher: FaqMatcher::new(),
            rate_limiter: RateLimiter::with_limits(
                config.max_per_window,
                config.window_secs as i64,
            ),
            cooldown,
            usage,
            response_log,
            feedback: FeedbackRouter::with_window(config.feedback_window_secs as i64),
            related_limit: config.related_limit,
        }
    }

    /// Run one message through the pipeline.
    pub async fn handle_message(&self, msg: &InboundMessage, now: DateTime<Utc>) -> MatchOutcome {
        if msg.from_bot {
            return MatchOutcome::Skipped {
                reason: SkipReason::BotAuthor,
            };
        }

        if self.channel_disabled(&msg.channel_id).await {
            return MatchOutcome::Skipped {
                reason: SkipReason::ChannelDisabled,
            };
        }

        let admission = self.rate_limiter.admit(&msg.user_id, now);
        if !admission.admitted {
            tracing::debug!(user_id = %msg.user_id, retry_after = admission.retry_after_secs, "rate limited");
            return MatchOutcome::RateLimited {
                retry_after_secs: admission.retry_after_secs,
                should_warn: admission.should_warn,
            };
        }

        let gate = self.cooldown.check_and_arm(&msg.user_id, now).await;
        if !gate.allowed {
            return MatchOutcome::OnCooldown {
                remaining_secs: gate.remaining_secs,
            };
        }

        // The message is now being processed; only here does it burn a slot,
        // so cooldown denials above never touch the user's quota.
        self.rate_limiter.record(&msg.user_id, now);

        let corpus = match self.faqs.list_all().await {
            Ok(corpus) => corpus,
            Err(e) => {
                tracing::warn!(error = %e, "FAQ corpus fetch failed; treating as no match");
                return MatchOutcome::NoMatch { related: Vec::new() };
            }
        };

        let Some(hit) = self.matcher.match_best(&msg.text, &corpus) else {
            let related = self
                .matcher
                .match_top_k(&msg.text, &corpus, self.related_limit)
                .into_iter()
                .map(|s| RelatedFaq {
                    faq: s.entry.clone(),
                    score: s.score,
                })
                .collect();
            return MatchOutcome::NoMatch { related };
        };

        self.usage
            .record_usage(hit, &msg.user_id, &msg.user_name, now)
            .await;
        self.response_log
            .log_faq_response(
                &msg.user_id,
                &msg.user_name,
                &msg.text,
                &hit.answer,
                &msg.channel_id,
                now,
            )
            .await;
        self.feedback.open(&msg.user_id, &hit.id, now);

        tracing::info!(user_id = %msg.user_id, faq_id = %hit.id, "FAQ matched");
        MatchOutcome::Matched {
            faq: hit.clone(),
            feedback_window_secs: self.feedback.window_secs(),
        }
    }

    /// Route one reaction verdict. Returns true when it was claimed by an
    /// open feedback window and recorded.
    pub async fn handle_reaction(&self, event: &ReactionEvent, now: DateTime<Utc>) -> bool {
        if !self.feedback.claim(&event.user_id, &event.faq_id, now) {
            return false;
        }
        self.usage.record_feedback(&event.faq_id, event.sentiment).await;
        true
    }

    /// Read access for the stats CLI.
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    async fn channel_disabled(&self, channel_id: &str) -> bool {
        match self.settings.disabled_channels().await {
            Ok(disabled) => disabled.contains(channel_id),
            Err(e) => {
                // Fail open: a settings read failure must not mute the bot.
                tracing::warn!(error = %e, "disabled-channel lookup failed");
                false
            }
        }
    }
}
