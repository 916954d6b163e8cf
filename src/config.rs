use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::links::DEFAULT_READ_URL_TEMPLATE;
use crate::normalize::normalize;

/// Named series: a lowercase key phrase mapped to the ordered list of
/// source-document identifiers that make up the series.
///
/// Read-only reference data; handed to the retriever at construction.
pub type SeriesMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default = "default_series")]
    pub series: SeriesMap,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Path of the persisted corpus snapshot (JSON array of passages).
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot(),
        }
    }
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("./data/sermon_chunks.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Maximum tokens per passage when falling back to size-bounded
    /// chunking for unnumbered transcripts.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_max_tokens() -> usize {
    250
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Below this many accumulated passages the lexical ranker runs.
    #[serde(default = "default_lexical_threshold")]
    pub lexical_threshold: usize,
    /// Candidate cutoff handed to the lexical ranker.
    #[serde(default = "default_lexical_k")]
    pub lexical_k: usize,
    /// Candidate count requested from the vector index.
    #[serde(default = "default_vector_k")]
    pub vector_k: usize,
    /// Bounded wait for the vector stage; it is the only stage with
    /// unbounded external latency.
    #[serde(default = "default_vector_timeout_secs")]
    pub vector_timeout_secs: u64,
    /// Below this many substring hits the browse mode falls back to the
    /// lexical ranker.
    #[serde(default = "default_browse_threshold")]
    pub browse_threshold: usize,
    /// Lexical cutoff used by the browse mode.
    #[serde(default = "default_browse_lexical_k")]
    pub browse_lexical_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_threshold: default_lexical_threshold(),
            lexical_k: default_lexical_k(),
            vector_k: default_vector_k(),
            vector_timeout_secs: default_vector_timeout_secs(),
            browse_threshold: default_browse_threshold(),
            browse_lexical_k: default_browse_lexical_k(),
        }
    }
}

fn default_lexical_threshold() -> usize {
    25
}
fn default_lexical_k() -> usize {
    60
}
fn default_vector_k() -> usize {
    30
}
fn default_vector_timeout_secs() -> u64 {
    10
}
fn default_browse_threshold() -> usize {
    20
}
fn default_browse_lexical_k() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 50,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    50
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Base URL of the remote vector index, e.g.
    /// `https://sermon-index-abc123.svc.us-east1.pinecone.io`.
    /// Empty means no index is configured; the vector stage then
    /// contributes nothing.
    #[serde(default)]
    pub host: String,
    /// Optional namespace within the index.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_index_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            namespace: None,
            timeout_secs: default_index_timeout_secs(),
        }
    }
}

fn default_index_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    #[serde(default = "default_answer_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_answer_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            model: default_answer_model(),
            temperature: default_temperature(),
            timeout_secs: default_answer_timeout_secs(),
        }
    }
}

fn default_answer_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_temperature() -> f64 {
    0.25
}
fn default_answer_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinksConfig {
    /// URL template for read-online links; `{code}` is replaced with the
    /// document's reference code.
    #[serde(default = "default_read_url_template")]
    pub read_url_template: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            read_url_template: default_read_url_template(),
        }
    }
}

fn default_read_url_template() -> String {
    DEFAULT_READ_URL_TEMPLATE.to_string()
}

/// The ten-document Seven Seals canon, in preaching order.
fn default_series() -> SeriesMap {
    let seals = vec![
        "63-0317E The Breach Between The Church Ages And The Seven Seals.pdf".to_string(),
        "63-0317M God Hiding Himself In Simplicity, Then Revealing Himself In The Same.pdf"
            .to_string(),
        "63-0318 The First Seal.pdf".to_string(),
        "63-0319 The Second Seal.pdf".to_string(),
        "63-0320 The Third Seal.pdf".to_string(),
        "63-0321 The Fourth Seal.pdf".to_string(),
        "63-0322 The Fifth Seal.pdf".to_string(),
        "63-0323 The Sixth Seal.pdf".to_string(),
        "63-0324E The Seventh Seal.pdf".to_string(),
        "63-0324M Questions And Answers On The Seals.pdf".to_string(),
    ];
    let mut map = SeriesMap::new();
    map.insert("seven seals".to_string(), seals);
    map
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.chunking.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }

    if config.retrieval.lexical_k < 1 || config.retrieval.vector_k < 1 {
        anyhow::bail!("retrieval.lexical_k and retrieval.vector_k must be >= 1");
    }

    if !(0.0..=2.0).contains(&config.answer.temperature) {
        anyhow::bail!("answer.temperature must be in [0.0, 2.0]");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }

    // Series keys are matched as substrings of the normalized query, so a
    // key that is not already in normalized form could never match.
    for key in config.series.keys() {
        if key != &normalize(key) {
            anyhow::bail!("series key '{}' must be lowercase with plain spaces", key);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.retrieval.lexical_threshold, 25);
        assert_eq!(config.retrieval.lexical_k, 60);
        assert_eq!(config.retrieval.vector_k, 30);
        assert_eq!(config.retrieval.browse_threshold, 20);
        assert_eq!(config.embedding.provider, "disabled");
        assert!(config.series.contains_key("seven seals"));
        assert_eq!(config.series["seven seals"].len(), 10);
    }

    #[test]
    fn test_series_override() {
        let config: Config = toml::from_str(
            r#"
            [series]
            "church ages" = ["54-0512 The Seven Church Ages.pdf"]
            "#,
        )
        .unwrap();
        assert!(config.series.contains_key("church ages"));
        assert!(!config.series.contains_key("seven seals"));
    }

    #[test]
    fn test_load_config_rejects_bad_series_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sermon.toml");
        std::fs::write(
            &path,
            r#"
            [series]
            "Seven Seals" = ["63-0318 The First Seal.pdf"]
            "#,
        )
        .unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_load_config_rejects_enabled_embedding_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sermon.toml");
        std::fs::write(
            &path,
            r#"
            [embedding]
            provider = "gemini"
            dims = 768
            "#,
        )
        .unwrap();
        assert!(load_config(&path).is_err());
    }
}
