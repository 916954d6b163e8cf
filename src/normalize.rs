//! Text canonicalization for query and title comparison.
//!
//! Two normalizers with different strictness:
//!
//! - [`normalize`] lower-cases, maps underscores and hyphens to spaces,
//!   and trims. Used for substring checks (series keys, keyword browse).
//! - [`normalize_text`] additionally replaces everything outside
//!   `[a-z0-9]` with spaces and collapses runs of whitespace. Used
//!   wherever punctuation must not affect token comparison.
//!
//! Both are total functions and idempotent.

use std::collections::HashSet;

/// Words that carry no retrieval signal on their own.
pub const STOPWORDS: [&str; 12] = [
    "the", "a", "an", "of", "in", "on", "at", "and", "to", "for", "with", "by",
];

/// Canonicalize text for loose comparison: lower-case, underscores and
/// hyphens become spaces, surrounding whitespace trimmed.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace('_', " ")
        .replace('-', " ")
        .trim()
        .to_string()
}

/// Strict canonical form: lower-case, every character outside `[a-z0-9]`
/// becomes a space, repeated whitespace collapses to a single space.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into its meaningful tokens: strictly normalized, stopwords
/// removed, and short function words (three characters or fewer) dropped.
///
/// Returns an unordered, deduplicated set.
pub fn tokenize_meaningful(text: &str) -> HashSet<String> {
    normalize_text(text)
        .split_whitespace()
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("  Hello_World-Again  "), "hello world again");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = ["Mixed-Case_Text", "  spaced  ", "63-0318 The First Seal.pdf"];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_text_strips_punctuation() {
        assert_eq!(normalize_text("What, then—shall we say?"), "what then shall we say");
    }

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("a   b\t\nc"), "a b c");
    }

    #[test]
    fn test_normalize_text_idempotent() {
        let inputs = ["A  B!! c", "63-0909E In His Presence.pdf", ""];
        for input in inputs {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_words() {
        let tokens = tokenize_meaningful("the presence of God in his word");
        assert!(tokens.contains("presence"));
        assert!(tokens.contains("word"));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("of"));
        assert!(!tokens.contains("in"));
        // Short function words carry no signal.
        assert!(!tokens.contains("his"));
        assert!(!tokens.contains("god"));
    }

    #[test]
    fn test_tokenize_never_returns_stopword_or_short_token() {
        let samples = [
            "the quick brown fox and a dog",
            "63-0318 The First Seal.pdf",
            "to for with by on at an of in",
        ];
        for sample in samples {
            for token in tokenize_meaningful(sample) {
                assert!(token.len() > 3, "short token {:?} from {:?}", token, sample);
                assert!(!STOPWORDS.contains(&token.as_str()));
            }
        }
    }

    #[test]
    fn test_tokenize_title_single_meaningful_word() {
        let tokens = tokenize_meaningful("in his presence");
        assert_eq!(tokens.len(), 1);
        assert!(tokens.contains("presence"));
    }
}
