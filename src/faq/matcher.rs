//! FAQ corpus matching.
//!
//! Two-pass scan per query:
//! 1. exact pass — punctuation/case-insensitive full-string equality with any
//!    entry's question short-circuits immediately (corpus order wins ties)
//! 2. scored pass — token-set similarity with numeric-code veto, keeping the
//!    strictly highest score seen (first-seen entry wins equal scores)
//!
//! Pure over its inputs: the caller supplies the corpus fresh each call, so
//! admin edits are always visible and no cache invalidation exists to get
//! wrong.

use super::keywords::KeywordExtractor;
use super::similarity::{self, RELATED_FLOOR};
use super::FaqEntry;

/// A weak candidate from the ranked related-FAQ list.
#[derive(Debug, Clone)]
pub struct ScoredEntry<'a> {
    pub entry: &'a FaqEntry,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FaqMatcher {
    extractor: KeywordExtractor,
}

impl FaqMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extractor(&self) -> &KeywordExtractor {
        &self.extractor
    }

    /// Best match for `query` in `corpus`, or `None` when nothing clears the
    /// acceptance threshold. Blank-question entries are skipped, never an
    /// error. Empty corpus yields `None`.
    pub fn match_best<'a>(&self, query: &str, corpus: &'a [FaqEntry]) -> Option<&'a FaqEntry> {
        let needle = self.extractor.normalize_exact(query);
        if needle.is_empty() {
            return None;
        }

        // Exact pass: first equal question ends the scan.
        for entry in corpus.iter().filter(|e| e.is_matchable()) {
            if self.extractor.normalize_exact(&entry.question) == needle {
                return Some(entry);
            }
        }

        // Scored pass: query tokens computed once, strictly-highest retained.
        let user_tokens = self.extractor.extract(query);
        let mut best: Option<(&FaqEntry, f64)> = None;
        for entry in corpus.iter().filter(|e| e.is_matchable()) {
            let faq_tokens = self.extractor.extract(&entry.question);
            let Some(score) = similarity::score(&user_tokens, &faq_tokens) else {
                continue;
            };
            if similarity::accepted(score) && best.is_none_or(|(_, b)| score > b) {
                best = Some((entry, score));
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// Ranked list of up to `k` related entries, strongest first. Candidates
    /// below [`RELATED_FLOOR`] and numeric-disqualified pairs are excluded.
    /// Ties keep corpus order. Intended for a "maybe you meant" affordance
    /// when [`match_best`](Self::match_best) finds nothing.
    pub fn match_top_k<'a>(
        &self,
        query: &str,
        corpus: &'a [FaqEntry],
        k: usize,
    ) -> Vec<ScoredEntry<'a>> {
        if k == 0 {
            return Vec::new();
        }
        let user_tokens = self.extractor.extract(query);
        let mut scored: Vec<ScoredEntry<'a>> = corpus
            .iter()
            .filter(|e| e.is_matchable())
            .filter_map(|entry| {
                let faq_tokens = self.extractor.extract(&entry.question);
                similarity::score(&user_tokens, &faq_tokens)
                    .filter(|s| *s >= RELATED_FLOOR)
                    .map(|score| ScoredEntry { entry, score })
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, question: &str) -> FaqEntry {
        FaqEntry {
            id: id.into(),
            question: question.into(),
            answer: format!("answer for {id}"),
            category: "General".into(),
            link: None,
        }
    }

    #[test]
    fn exact_match_wins_over_higher_scoring_entry() {
        let corpus = vec![
            entry("a", "homework policy homework policy homework"),
            entry("b", "What is the homework policy?"),
        ];
        // "b" is an exact match; "a" would out-score it on raw overlap.
        let hit = FaqMatcher::new()
            .match_best("what is the homework policy", &corpus)
            .expect("exact match");
        assert_eq!(hit.id, "b");
    }

    #[test]
    fn exact_match_is_case_and_punctuation_insensitive() {
        let corpus = vec![entry("a", "What is the homework policy?")];
        let hit = FaqMatcher::new().match_best("what is the homework policy", &corpus);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("a"));
    }

    #[test]
    fn first_exact_match_in_corpus_order_wins() {
        let corpus = vec![entry("first", "Office hours?"), entry("second", "office hours")];
        let hit = FaqMatcher::new().match_best("office hours", &corpus);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("first"));
    }

    #[test]
    fn scored_match_with_shared_course_code() {
        let corpus = vec![entry("a", "What is the CS101 homework policy?")];
        let hit = FaqMatcher::new().match_best("homework policy for CS101", &corpus);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("a"));
    }

    #[test]
    fn cross_course_query_is_rejected() {
        let corpus = vec![entry("a", "CS101 homework policy")];
        assert!(FaqMatcher::new()
            .match_best("CS202 homework policy", &corpus)
            .is_none());
    }

    #[test]
    fn score_of_exactly_half_is_accepted() {
        // overlap 2 / max(2, 4) lands exactly on the threshold
        let corpus = vec![entry("a", "homework policy deadline rules")];
        let hit = FaqMatcher::new().match_best("homework policy", &corpus);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("a"));
    }

    #[test]
    fn below_threshold_is_no_match() {
        let corpus = vec![entry("a", "exam schedule deadline rules grading")];
        assert!(FaqMatcher::new().match_best("homework policy", &corpus).is_none());
    }

    #[test]
    fn equal_scores_keep_the_earliest_entry() {
        let corpus = vec![
            entry("first", "homework policy deadline"),
            entry("second", "homework policy grading"),
        ];
        let hit = FaqMatcher::new().match_best("homework policy", &corpus);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("first"));
    }

    #[test]
    fn blank_questions_are_skipped_not_fatal() {
        let corpus = vec![entry("blank", "   "), entry("a", "homework policy")];
        let hit = FaqMatcher::new().match_best("homework policy", &corpus);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("a"));
    }

    #[test]
    fn empty_corpus_and_empty_query_yield_none() {
        let matcher = FaqMatcher::new();
        assert!(matcher.match_best("homework policy", &[]).is_none());
        assert!(matcher.match_best("", &[entry("a", "homework policy")]).is_none());
    }

    #[test]
    fn top_k_ranks_strongest_first_and_respects_floor() {
        let corpus = vec![
            entry("weak", "totally unrelated announcements channel"),
            entry("mid", "homework deadline"),
            entry("strong", "homework policy deadline"),
        ];
        let related = FaqMatcher::new().match_top_k("homework policy deadline", &corpus, 5);
        let ids: Vec<&str> = related.iter().map(|s| s.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["strong", "mid"]);
        assert!(related[0].score > related[1].score);
    }

    #[test]
    fn top_k_excludes_cross_code_entries() {
        let corpus = vec![entry("other", "CS201 homework policy")];
        assert!(FaqMatcher::new()
            .match_top_k("CS101 homework policy", &corpus, 3)
            .is_empty());
    }
}
