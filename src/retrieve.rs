//! Hybrid retrieval cascade.
//!
//! A query runs through a strict priority cascade that accumulates
//! rather than replaces:
//!
//! 1. Classify the query (explicit reference code, named series, or
//!    neither).
//! 2. Explicit reference: scan the corpus for passages whose source the
//!    code names, in corpus order.
//! 3. Otherwise, series: scan the corpus once per series member, in
//!    series order then corpus order.
//! 4. Lexical fallback: only when fewer passages have accumulated than
//!    the threshold, append BM25-ranked candidates.
//! 5. Vector supplement: always attempted, bounded wait, every failure
//!    absorbed. This stage never aborts retrieval.
//!
//! Reference and series matches come first because they are unambiguous
//! user intent; lexical search recovers exact-term matches embeddings
//! can blur; vector search recovers paraphrases lexical search misses.
//! All stages merge into one order-preserving, deduplicated result.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::config::{RetrievalConfig, SeriesMap};
use crate::corpus::CorpusSource;
use crate::lexical::LexicalRanker;
use crate::models::Passage;
use crate::normalize::normalize;
use crate::title::title_matches;
use crate::vector::VectorSearch;

/// Ordered result accumulator with first-found-wins deduplication by
/// content-prefix key.
#[derive(Default)]
pub struct ResultSet {
    passages: Vec<Passage>,
    seen: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless a passage with the same leading content is already
    /// present. Returns whether the passage was added.
    pub fn push(&mut self, passage: Passage) -> bool {
        let key = passage.dedup_key();
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key);
        self.passages.push(passage);
        true
    }

    pub fn extend(&mut self, passages: impl IntoIterator<Item = Passage>) {
        for passage in passages {
            self.push(passage);
        }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn into_vec(self) -> Vec<Passage> {
        self.passages
    }
}

/// Plug-in contract the surrounding application consumes: one method,
/// ordered passages out. Retrieval has no fatal failure mode, so the
/// result is a plain (possibly empty) sequence.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Vec<Passage>;
}

/// The hybrid retrieval engine.
pub struct HybridRetriever {
    corpus: Box<dyn CorpusSource>,
    vector: Box<dyn VectorSearch>,
    series: SeriesMap,
    params: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(
        corpus: Box<dyn CorpusSource>,
        vector: Box<dyn VectorSearch>,
        series: SeriesMap,
        params: RetrievalConfig,
    ) -> Self {
        Self {
            corpus,
            vector,
            series,
            params,
        }
    }

    /// Keyword-only browsing mode.
    ///
    /// Substring containment of the normalized query over passage
    /// content, with a lexical fallback under its own threshold. Returns
    /// the results plus a human-readable trace of hit counts. Does not
    /// touch reference, series, or vector logic.
    pub fn search(&self, query: &str) -> (Vec<Passage>, Vec<String>) {
        let chunks = self.corpus.load_chunks();
        let query_clean = normalize(query);
        let mut results = ResultSet::new();
        let mut log = Vec::new();

        if !query_clean.is_empty() {
            for passage in &chunks {
                if passage.content.to_lowercase().contains(&query_clean) {
                    results.push(passage.clone());
                }
            }
        }
        log.push(format!("Keyword hits: {}", results.len()));

        if results.len() < self.params.browse_threshold {
            let ranker = LexicalRanker::new(&chunks, self.params.browse_lexical_k);
            results.extend(ranker.rank(query));
        }
        log.push(format!("Total results: {}", results.len()));

        (results.into_vec(), log)
    }
}

#[async_trait]
impl Retriever for HybridRetriever {
    async fn retrieve(&self, query: &str) -> Vec<Passage> {
        // Loaded fresh every call so results always reflect the current
        // snapshot.
        let chunks = self.corpus.load_chunks();
        let intent = classify(query, &self.series);
        let mut results = ResultSet::new();

        if let Some(code) = &intent.explicit_reference {
            for passage in &chunks {
                if title_matches(code, &passage.source) {
                    results.push(passage.clone());
                }
            }
            debug!(code = %code, hits = results.len(), "explicit reference stage");
        } else if let Some(members) = intent.series {
            // Each member is matched on its own pass so output follows
            // series order before corpus order.
            for member in members {
                for passage in &chunks {
                    if title_matches(member, &passage.source) {
                        results.push(passage.clone());
                    }
                }
            }
            debug!(hits = results.len(), "series stage");
        }

        if results.len() < self.params.lexical_threshold {
            let ranker = LexicalRanker::new(&chunks, self.params.lexical_k);
            results.extend(ranker.rank(query));
            debug!(total = results.len(), "lexical stage");
        }

        // Best-effort semantic supplement; absorbed on any failure so the
        // cascade always returns what the earlier stages found.
        let wait = Duration::from_secs(self.params.vector_timeout_secs);
        match tokio::time::timeout(wait, self.vector.search(query, self.params.vector_k)).await {
            Ok(Ok(passages)) => {
                results.extend(passages);
                debug!(total = results.len(), "vector stage");
            }
            Ok(Err(err)) => {
                warn!(error = %err, "vector search failed, continuing without it");
            }
            Err(_) => {
                warn!(
                    secs = self.params.vector_timeout_secs,
                    "vector search timed out, continuing without it"
                );
            }
        }

        results.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::InMemoryCorpus;
    use anyhow::bail;

    fn passage(content: &str, source: &str, paragraph: &str) -> Passage {
        Passage {
            content: content.to_string(),
            source: source.to_string(),
            paragraph: paragraph.to_string(),
        }
    }

    /// Vector double returning a fixed list.
    struct StaticVector(Vec<Passage>);

    #[async_trait]
    impl VectorSearch for StaticVector {
        async fn search(&self, _query: &str, k: usize) -> anyhow::Result<Vec<Passage>> {
            Ok(self.0.iter().take(k).cloned().collect())
        }
    }

    /// Vector double that always fails.
    struct FailingVector;

    #[async_trait]
    impl VectorSearch for FailingVector {
        async fn search(&self, _query: &str, _k: usize) -> anyhow::Result<Vec<Passage>> {
            bail!("connection refused")
        }
    }

    fn seals_series() -> SeriesMap {
        let mut map = SeriesMap::new();
        map.insert(
            "seven seals".to_string(),
            vec![
                "63-0318 The First Seal.pdf".to_string(),
                "63-0319 The Second Seal.pdf".to_string(),
                "63-0320 The Third Seal.pdf".to_string(),
            ],
        );
        map
    }

    fn retriever(
        corpus: Vec<Passage>,
        vector: Box<dyn VectorSearch>,
        series: SeriesMap,
    ) -> HybridRetriever {
        HybridRetriever::new(
            Box::new(InMemoryCorpus::new(corpus)),
            vector,
            series,
            RetrievalConfig::default(),
        )
    }

    #[test]
    fn test_result_set_first_found_wins() {
        let mut results = ResultSet::new();
        let head = "same leading content ".repeat(10);
        assert!(results.push(passage(&head, "a.pdf", "1")));
        // Identical 120-char prefix, different metadata and tail.
        let mut other = head.clone();
        other.push_str("different tail");
        assert!(!results.push(passage(&other, "b.pdf", "9")));

        let out = results.into_vec();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "a.pdf");
    }

    #[test]
    fn test_result_set_short_distinct_content() {
        let mut results = ResultSet::new();
        assert!(results.push(passage("alpha", "a.pdf", "1")));
        assert!(results.push(passage("beta", "a.pdf", "1")));
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_explicit_reference_path() {
        let corpus = vec![
            passage(
                "Faith is the substance of things hoped for.",
                "57-0908 Hebrews Chapter One.pdf",
                "1",
            ),
            passage(
                "The lamb stepped forth to open the first seal.",
                "63-0318 The First Seal.pdf",
                "12",
            ),
        ];
        let retriever = retriever(corpus, Box::new(StaticVector(Vec::new())), seals_series());

        let results = retriever.retrieve("Tell me about 63-0318").await;
        assert!(!results.is_empty());
        assert_eq!(results[0].source, "63-0318 The First Seal.pdf");
    }

    #[tokio::test]
    async fn test_series_results_in_series_order() {
        // Corpus deliberately out of series order.
        let corpus = vec![
            passage("Third seal: the black horse rider.", "63-0320 The Third Seal.pdf", "1"),
            passage("First seal: the white horse rider.", "63-0318 The First Seal.pdf", "1"),
            passage("Second seal: the red horse rider.", "63-0319 The Second Seal.pdf", "1"),
        ];
        let retriever = retriever(corpus, Box::new(StaticVector(Vec::new())), seals_series());

        let results = retriever.retrieve("summarize the seven seals series").await;
        let sources: Vec<&str> = results.iter().take(3).map(|p| p.source.as_str()).collect();
        assert_eq!(
            sources,
            vec![
                "63-0318 The First Seal.pdf",
                "63-0319 The Second Seal.pdf",
                "63-0320 The Third Seal.pdf",
            ]
        );
    }

    #[tokio::test]
    async fn test_vector_failure_is_absorbed() {
        let corpus = vec![passage(
            "The lamb stepped forth to open the first seal.",
            "63-0318 The First Seal.pdf",
            "12",
        )];
        let retriever = retriever(corpus, Box::new(FailingVector), seals_series());

        let results = retriever.retrieve("Tell me about 63-0318").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "63-0318 The First Seal.pdf");
    }

    #[tokio::test]
    async fn test_vector_supplement_appends_after_local_stages() {
        let corpus = vec![passage(
            "The lamb stepped forth to open the first seal.",
            "63-0318 The First Seal.pdf",
            "12",
        )];
        let remote = passage(
            "A paraphrased memory of the opening of the seals.",
            "63-0317E The Breach.pdf",
            "4",
        );
        let retriever = retriever(
            corpus,
            Box::new(StaticVector(vec![remote])),
            seals_series(),
        );

        let results = retriever.retrieve("Tell me about 63-0318").await;
        assert_eq!(results[0].source, "63-0318 The First Seal.pdf");
        assert!(results
            .iter()
            .any(|p| p.source == "63-0317E The Breach.pdf"));
    }

    #[tokio::test]
    async fn test_dedup_across_stages() {
        let shared = "The lamb stepped forth to open the first seal of the book written within and on the backside, sealed with seven seals entirely.";
        let corpus = vec![passage(shared, "63-0318 The First Seal.pdf", "12")];
        // The vector stage returns the same passage under different metadata.
        let duplicate = passage(shared, "copy.pdf", "99");
        let retriever = retriever(
            corpus,
            Box::new(StaticVector(vec![duplicate])),
            seals_series(),
        );

        let results = retriever.retrieve("Tell me about 63-0318").await;
        let hits: Vec<&Passage> = results
            .iter()
            .filter(|p| p.content.starts_with("The lamb stepped"))
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "63-0318 The First Seal.pdf");
    }

    #[tokio::test]
    async fn test_lexical_gated_when_enough_accumulated() {
        // 26 reference matches exceed the threshold, so the decoy that
        // only lexical ranking would surface must be absent.
        let mut corpus: Vec<Passage> = (0..26)
            .map(|i| {
                passage(
                    &format!("Seal opening paragraph number {} of the first seal sermon.", i),
                    "63-0318 The First Seal.pdf",
                    &i.to_string(),
                )
            })
            .collect();
        corpus.push(passage(
            "Thunder thunder thunder everywhere in this decoy.",
            "Decoy.pdf",
            "1",
        ));
        let retriever = retriever(corpus, Box::new(StaticVector(Vec::new())), SeriesMap::new());

        let results = retriever.retrieve("63-0318 thunder").await;
        assert_eq!(results.len(), 26);
        assert!(results.iter().all(|p| p.source != "Decoy.pdf"));
    }

    #[tokio::test]
    async fn test_lexical_runs_below_threshold() {
        let corpus = vec![
            passage(
                "The lamb stepped forth to open the first seal.",
                "63-0318 The First Seal.pdf",
                "12",
            ),
            passage(
                "Thunder followed the opening in the west.",
                "Decoy.pdf",
                "1",
            ),
        ];
        let retriever = retriever(corpus, Box::new(StaticVector(Vec::new())), SeriesMap::new());

        let results = retriever.retrieve("63-0318 thunder").await;
        assert_eq!(results[0].source, "63-0318 The First Seal.pdf");
        assert!(results.iter().any(|p| p.source == "Decoy.pdf"));
    }

    #[tokio::test]
    async fn test_empty_corpus_returns_empty() {
        let retriever = retriever(Vec::new(), Box::new(FailingVector), seals_series());
        let results = retriever.retrieve("anything at all").await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_browse_search_trace() {
        let corpus = vec![
            passage("Grace and redemption in the blood.", "55-0112 Redemption.pdf", "1"),
            passage("A completely unrelated passage here.", "Other.pdf", "2"),
        ];
        let retriever = retriever(corpus, Box::new(FailingVector), SeriesMap::new());

        let (results, log) = retriever.search("redemption");
        assert!(!results.is_empty());
        assert_eq!(results[0].source, "55-0112 Redemption.pdf");
        assert!(log[0].starts_with("Keyword hits: "));
        assert!(log[1].starts_with("Total results: "));
    }

    #[test]
    fn test_browse_search_empty_corpus() {
        let retriever = retriever(Vec::new(), Box::new(FailingVector), SeriesMap::new());
        let (results, log) = retriever.search("anything");
        assert!(results.is_empty());
        assert_eq!(log, vec!["Keyword hits: 0", "Total results: 0"]);
    }
}
