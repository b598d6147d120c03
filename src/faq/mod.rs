//! Curated FAQ corpus model.
//!
//! Entries are created and edited by external admin tooling; the responder
//! core only ever reads them. The corpus is re-fetched per message so admin
//! edits are visible on the next question without cache invalidation.

pub mod keywords;
pub mod matcher;
pub mod similarity;

pub use keywords::{KeywordExtractor, TokenSet};
pub use matcher::FaqMatcher;

use serde::{Deserialize, Serialize};

/// A single admin-curated question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Stable store-assigned identity, referenced by usage stats and feedback.
    pub id: String,
    /// The matching key. Unique within a category.
    pub question: String,
    pub answer: String,
    /// Hierarchical `/` path, e.g. `"Course/367"`.
    pub category: String,
    /// Optional supplementary URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl FaqEntry {
    /// Segment before the first `/` of the category path.
    pub fn top_level_category(&self) -> &str {
        self.category.split('/').next().unwrap_or("")
    }

    /// An entry with a blank question can never match and is skipped
    /// defensively during corpus scans.
    pub fn is_matchable(&self) -> bool {
        !self.question.trim().is_empty()
    }
}
