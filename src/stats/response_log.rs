//! Append-only audit log of bot responses.
//!
//! Every auto-answer is journaled with who asked, what they asked, and what
//! the bot said. Operators read this out-of-band; nothing in the response
//! path depends on it, so append failures are logged and swallowed.

use crate::storage::ResponseLogStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What kind of interaction produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Faq,
    Command,
    Other,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Faq => "faq",
            Self::Command => "command",
            Self::Other => "other",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "faq" => Self::Faq,
            "command" => Self::Command,
            _ => Self::Other,
        }
    }
}

/// One audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotResponseLog {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    /// The user's message content.
    pub question: String,
    /// What the bot replied with (the FAQ answer for auto-responses).
    pub response: String,
    pub channel_id: String,
    pub response_type: ResponseType,
    pub timestamp: DateTime<Utc>,
}

/// Best-effort audit journaler.
pub struct ResponseLogger {
    store: Arc<dyn ResponseLogStore>,
}

impl ResponseLogger {
    pub fn new(store: Arc<dyn ResponseLogStore>) -> Self {
        Self { store }
    }

    /// Journal an FAQ auto-response. Failures are logged, never propagated.
    pub async fn log_faq_response(
        &self,
        user_id: &str,
        user_name: &str,
        question: &str,
        response: &str,
        channel_id: &str,
        now: DateTime<Utc>,
    ) {
        let entry = BotResponseLog {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            question: question.to_string(),
            response: response.to_string(),
            channel_id: channel_id.to_string(),
            response_type: ResponseType::Faq,
            timestamp: now,
        };
        if let Err(e) = self.store.append(&entry).await {
            tracing::warn!(user_id, error = %e, "failed to journal bot response");
        }
    }
}
