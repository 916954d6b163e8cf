//! BM25 lexical ranking over the passage corpus.
//!
//! The ranker is built fresh from the full corpus for one query and
//! returns the top-`k` passages by descending relevance. Deterministic
//! for a fixed corpus and query. Its job in the cascade is only to be
//! invoked at the right priority with the right cutoff; the scoring
//! itself is the `bm25` crate's.

use bm25::{Document, Language, SearchEngineBuilder};

use crate::models::Passage;

/// Keyword ranker with a fixed result cap.
pub struct LexicalRanker {
    engine: bm25::SearchEngine<u32>,
    passages: Vec<Passage>,
    k: usize,
}

impl LexicalRanker {
    /// Index the corpus. Passage order is preserved through the index ids
    /// so ranked hits map back to their passages.
    pub fn new(passages: &[Passage], k: usize) -> Self {
        let documents: Vec<Document<u32>> = passages
            .iter()
            .enumerate()
            .map(|(i, p)| Document {
                id: i as u32,
                contents: p.content.clone(),
            })
            .collect();
        let engine = SearchEngineBuilder::<u32>::with_documents(Language::English, documents).build();
        Self {
            engine,
            passages: passages.to_vec(),
            k,
        }
    }

    /// Top-`k` passages by descending relevance score.
    pub fn rank(&self, query: &str) -> Vec<Passage> {
        self.engine
            .search(query, self.k)
            .into_iter()
            .filter_map(|hit| self.passages.get(hit.document.id as usize).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str, source: &str) -> Passage {
        Passage {
            content: content.to_string(),
            source: source.to_string(),
            paragraph: "1".to_string(),
        }
    }

    fn corpus() -> Vec<Passage> {
        vec![
            passage(
                "The lamb opened the seal and thunder followed.",
                "63-0318 The First Seal.pdf",
            ),
            passage(
                "A rider went forth on a white horse conquering.",
                "63-0318 The First Seal.pdf",
            ),
            passage(
                "Faith is the substance of things hoped for.",
                "57-0908 Hebrews Chapter One.pdf",
            ),
        ]
    }

    #[test]
    fn test_rank_prefers_matching_terms() {
        let ranker = LexicalRanker::new(&corpus(), 3);
        let results = ranker.rank("thunder seal");
        assert!(!results.is_empty());
        assert!(results[0].content.contains("thunder"));
    }

    #[test]
    fn test_rank_respects_cap() {
        let ranker = LexicalRanker::new(&corpus(), 1);
        let results = ranker.rank("the");
        assert!(results.len() <= 1);
    }

    #[test]
    fn test_rank_deterministic() {
        let ranker = LexicalRanker::new(&corpus(), 3);
        let first = ranker.rank("white horse");
        let second = ranker.rank("white horse");
        let firsts: Vec<&str> = first.iter().map(|p| p.content.as_str()).collect();
        let seconds: Vec<&str> = second.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(firsts, seconds);
    }

    #[test]
    fn test_empty_corpus_yields_nothing() {
        let ranker = LexicalRanker::new(&[], 10);
        assert!(ranker.rank("anything").is_empty());
    }
}
