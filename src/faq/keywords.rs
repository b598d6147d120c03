//! Keyword extraction for FAQ matching.
//!
//! Turns free text into a deduplicated set of meaningful tokens:
//! - platform markup (user/channel mentions, custom emotes) is stripped first
//! - text is lowercased and reduced to `[a-z0-9\s]`
//! - tokens survive if longer than two chars, or if they carry a digit
//!   (preserves course codes like "cs2" or "367")
//!
//! First-seen token order is preserved so "the first numeric token" is a
//! deterministic question to ask of any input.

use regex::Regex;

/// Minimum length for a purely alphabetic token to be kept.
const MIN_WORD_LEN: usize = 3;

/// A deduplicated token set that remembers first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    tokens: Vec<String>,
}

impl TokenSet {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Number of tokens present in both sets.
    pub fn overlap(&self, other: &TokenSet) -> usize {
        self.tokens.iter().filter(|t| other.contains(t)).count()
    }

    /// The first token containing an ASCII digit, if any. Used as the
    /// course/item code for cross-code match disqualification.
    pub fn numeric_code(&self) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.chars().any(|c| c.is_ascii_digit()))
            .map(String::as_str)
    }

    fn push_unique(&mut self, token: String) {
        if !self.contains(&token) {
            self.tokens.push(token);
        }
    }
}

/// Tokenizer shared by the matcher. Holds the compiled markup pattern so
/// per-message extraction allocates nothing but the tokens themselves.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    markup: Regex,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        // `<@123>` / `<@!123>` / `<@&123>` mentions, `<#123>` channel refs,
        // `<:name:123>` / `<a:name:123>` custom emotes.
        let markup = Regex::new(r"<(?:@[!&]?|#|a?:\w+:)\d+>").expect("markup pattern");
        Self { markup }
    }

    /// Extract the meaningful-token set from free text.
    /// Empty or markup-only input yields an empty set.
    pub fn extract(&self, text: &str) -> TokenSet {
        let stripped = self.markup.replace_all(text, " ");
        let normalized = normalize(&stripped);

        let mut set = TokenSet::default();
        for token in normalized.split_whitespace() {
            if token.len() >= MIN_WORD_LEN || token.chars().any(|c| c.is_ascii_digit()) {
                set.push_unique(token.to_string());
            }
        }
        set
    }

    /// Canonical form used for exact-match comparison: lowercased, stripped
    /// of punctuation, single-spaced. Makes `"policy?"` and `"policy"` equal
    /// without entering the scoring path.
    pub fn normalize_exact(&self, text: &str) -> String {
        let stripped = self.markup.replace_all(text, " ");
        normalize(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Lowercase and drop every char outside `[a-z0-9\s]`.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        KeywordExtractor::new()
            .extract(text)
            .iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(
            tokens("What's the Homework POLICY?!"),
            vec!["whats", "the", "homework", "policy"]
        );
    }

    #[test]
    fn drops_short_alphabetic_tokens() {
        // "is" and "a" fall below the length floor
        assert_eq!(tokens("is a deadline"), vec!["deadline"]);
    }

    #[test]
    fn keeps_short_tokens_with_digits() {
        assert_eq!(tokens("cs2 is ok"), vec!["cs2"]);
        assert_eq!(tokens("section 7"), vec!["section", "7"]);
    }

    #[test]
    fn deduplicates_preserving_first_seen_order() {
        assert_eq!(
            tokens("policy homework policy"),
            vec!["policy", "homework"]
        );
    }

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(KeywordExtractor::new().extract("").is_empty());
        assert!(KeywordExtractor::new().extract("?!.,").is_empty());
    }

    #[test]
    fn strips_platform_markup() {
        assert_eq!(
            tokens("<@!8675309> when is <#1234> office hours <:wave:555>"),
            vec!["when", "office", "hours"]
        );
    }

    #[test]
    fn numeric_code_is_first_digit_bearing_token() {
        let set = KeywordExtractor::new().extract("homework for cs101 and cs201");
        assert_eq!(set.numeric_code(), Some("cs101"));
        let none = KeywordExtractor::new().extract("homework policy");
        assert_eq!(none.numeric_code(), None);
    }

    #[test]
    fn overlap_counts_shared_tokens() {
        let ex = KeywordExtractor::new();
        let a = ex.extract("homework policy for cs101");
        let b = ex.extract("what is the cs101 homework policy");
        assert_eq!(a.overlap(&b), 3); // homework, policy, cs101
    }

    #[test]
    fn normalize_exact_collapses_case_and_punctuation() {
        let ex = KeywordExtractor::new();
        assert_eq!(
            ex.normalize_exact("What is  the homework policy?"),
            "what is the homework policy"
        );
        assert_eq!(
            ex.normalize_exact("what is the homework policy"),
            "what is the homework policy"
        );
    }
}
