//! Similarity scoring between a user question and an FAQ question.
//!
//! Pure functions over [`TokenSet`]s. The score combines token overlap with
//! a numeric-code rule: differing course/item codes veto the pair outright,
//! matching codes earn a fixed bonus on top of the overlap score.

use super::keywords::TokenSet;

/// A candidate is accepted only when its final score reaches this value
/// (boundary-inclusive).
pub const ACCEPT_THRESHOLD: f64 = 0.5;

/// Bonus added when both sides carry the same numeric code.
pub const CODE_MATCH_BONUS: f64 = 0.2;

/// Floor for the ranked related-FAQ list; weaker candidates are noise.
pub const RELATED_FLOOR: f64 = 0.2;

/// Token overlap score in `[0, 1]`.
///
/// Denominator is `max(|user|, |faq|)` rather than the union size — the
/// softer of the two observed choices, kept for fidelity with the corpus
/// this matcher was tuned against. Two empty sets score 0.
pub fn token_similarity(user: &TokenSet, faq: &TokenSet) -> f64 {
    let denom = user.len().max(faq.len());
    if denom == 0 {
        return 0.0;
    }
    user.overlap(faq) as f64 / denom as f64
}

/// Full candidate score in `[0, 1.2]`, or `None` when the pair is
/// disqualified by differing numeric codes.
///
/// The veto is a hard filter, not a penalty: "CS 101 homework" must never
/// match a "CS 201" entry no matter how much the remaining text overlaps.
pub fn score(user: &TokenSet, faq: &TokenSet) -> Option<f64> {
    match (user.numeric_code(), faq.numeric_code()) {
        (Some(a), Some(b)) if a != b => None,
        (Some(_), Some(_)) => Some(token_similarity(user, faq) + CODE_MATCH_BONUS),
        _ => Some(token_similarity(user, faq)),
    }
}

/// Whether a final score clears the acceptance threshold.
pub fn accepted(score: f64) -> bool {
    score >= ACCEPT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faq::keywords::KeywordExtractor;

    fn set(text: &str) -> TokenSet {
        KeywordExtractor::new().extract(text)
    }

    #[test]
    fn overlap_uses_max_cardinality_denominator() {
        // user: {homework, policy} faq: {homework, policy, deadline, rules}
        let s = token_similarity(&set("homework policy"), &set("homework policy deadline rules"));
        assert!((s - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_sets_score_zero() {
        assert_eq!(token_similarity(&set(""), &set("")), 0.0);
        assert_eq!(token_similarity(&set("homework"), &set("")), 0.0);
    }

    #[test]
    fn differing_codes_disqualify_despite_high_overlap() {
        // 2/3 token overlap would otherwise clear the threshold
        let user = set("CS101 homework policy");
        let faq = set("CS201 homework policy");
        assert!(token_similarity(&user, &faq) >= ACCEPT_THRESHOLD);
        assert_eq!(score(&user, &faq), None);
    }

    #[test]
    fn matching_codes_earn_bonus() {
        let user = set("homework policy for CS101");
        let faq = set("what is the CS101 homework policy");
        let base = token_similarity(&user, &faq);
        let full = score(&user, &faq).expect("same code never disqualifies");
        assert!((full - (base + CODE_MATCH_BONUS)).abs() < 1e-9);
    }

    #[test]
    fn one_sided_code_is_not_a_veto() {
        let user = set("homework policy");
        let faq = set("CS101 homework policy");
        assert!(score(&user, &faq).is_some());
    }

    #[test]
    fn threshold_is_boundary_inclusive() {
        assert!(accepted(0.5));
        assert!(!accepted(0.49));
    }
}
