//! Core data models for the sermon archive.
//!
//! A [`Passage`] is the atomic unit of retrieval: one labeled slice of a
//! transcribed sermon. Passages are created during ingestion, persisted in
//! the corpus snapshot, and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Number of leading content characters used as the deduplication key.
///
/// Two passages whose content begins with the same 120 characters are
/// treated as the same result within a single retrieval call, even if
/// their metadata differs.
pub const DEDUP_PREFIX_CHARS: usize = 120;

/// One retrievable passage of sermon text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Text body of the passage.
    pub content: String,
    /// Canonical filename of the originating document,
    /// e.g. `"63-0318 The First Seal.pdf"`. Stable after ingestion.
    pub source: String,
    /// Position label within the source: a paragraph marker (`"53"`,
    /// `"E-7"`, `"Intro"`) when the transcript numbers its paragraphs,
    /// or a synthetic `"Unnumbered (Chunk N)"` label when it does not.
    pub paragraph: String,
}

impl Passage {
    /// Deduplication key for merging results across retrieval stages.
    pub fn dedup_key(&self) -> String {
        self.content.chars().take(DEDUP_PREFIX_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_truncates_long_content() {
        let p = Passage {
            content: "x".repeat(500),
            source: "a.pdf".to_string(),
            paragraph: "1".to_string(),
        };
        assert_eq!(p.dedup_key().chars().count(), DEDUP_PREFIX_CHARS);
    }

    #[test]
    fn test_dedup_key_short_content_unchanged() {
        let p = Passage {
            content: "short".to_string(),
            source: "a.pdf".to_string(),
            paragraph: "1".to_string(),
        };
        assert_eq!(p.dedup_key(), "short");
    }

    #[test]
    fn test_dedup_key_is_char_based() {
        // Multibyte content must not split on a byte boundary.
        let p = Passage {
            content: "é".repeat(200),
            source: "a.pdf".to_string(),
            paragraph: "1".to_string(),
        };
        assert_eq!(p.dedup_key().chars().count(), DEDUP_PREFIX_CHARS);
    }
}
