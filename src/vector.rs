//! Remote vector index client.
//!
//! The index stores one vector per passage with the passage itself
//! carried in metadata, so query results come back as complete
//! [`Passage`]s without a corpus lookup. The retrieval cascade treats
//! this collaborator as best-effort: every error here surfaces as `Err`
//! and is absorbed by the caller.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::{EmbeddingConfig, IndexConfig};
use crate::embedding;
use crate::models::Passage;

/// Similarity-search collaborator: top-`k` passages for a query.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>>;
}

/// One vector plus the passage metadata stored alongside it.
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub passage: Passage,
}

/// Client for a Pinecone-style HTTP vector index.
///
/// Requires the `PINECONE_API_KEY` environment variable.
pub struct RemoteIndex {
    index: IndexConfig,
    embedding: EmbeddingConfig,
}

impl RemoteIndex {
    pub fn new(index: IndexConfig, embedding: EmbeddingConfig) -> Self {
        Self { index, embedding }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var("PINECONE_API_KEY")
            .map_err(|_| anyhow!("PINECONE_API_KEY environment variable not set"))
    }

    fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.index.timeout_secs))
            .build()
            .map_err(Into::into)
    }

    fn endpoint(&self, path: &str) -> Result<String> {
        if self.index.host.is_empty() {
            bail!("index.host is not configured");
        }
        Ok(format!("{}/{}", self.index.host.trim_end_matches('/'), path))
    }

    /// Upsert a batch of vectors with their passage metadata.
    pub async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        let url = self.endpoint("vectors/upsert")?;
        let api_key = self.api_key()?;
        let client = self.client()?;

        let vectors: Vec<serde_json::Value> = records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "values": r.values,
                    "metadata": {
                        "text": r.passage.content,
                        "source": r.passage.source,
                        "paragraph": r.passage.paragraph,
                    },
                })
            })
            .collect();

        let mut body = serde_json::json!({ "vectors": vectors });
        if let Some(ns) = &self.index.namespace {
            body["namespace"] = serde_json::json!(ns);
        }

        let resp = client
            .post(&url)
            .header("Api-Key", api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("vector index upsert error {}: {}", status, text);
        }
        Ok(())
    }
}

#[async_trait]
impl VectorSearch for RemoteIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        let url = self.endpoint("query")?;
        let query_vec = embedding::embed_query(&self.embedding, query).await?;
        let api_key = self.api_key()?;
        let client = self.client()?;

        let mut body = serde_json::json!({
            "vector": query_vec,
            "topK": k,
            "includeMetadata": true,
        });
        if let Some(ns) = &self.index.namespace {
            body["namespace"] = serde_json::json!(ns);
        }

        let resp = client
            .post(&url)
            .header("Api-Key", api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("vector index query error {}: {}", status, text);
        }

        let json: serde_json::Value = resp.json().await?;
        parse_query_response(&json)
    }
}

/// Parse the index query response, rebuilding passages from metadata.
///
/// Matches without usable metadata are skipped rather than failing the
/// whole response.
fn parse_query_response(json: &serde_json::Value) -> Result<Vec<Passage>> {
    let matches = json
        .get("matches")
        .and_then(|m| m.as_array())
        .ok_or_else(|| anyhow!("Invalid index response: missing matches array"))?;

    let mut passages = Vec::with_capacity(matches.len());
    for m in matches {
        let Some(meta) = m.get("metadata") else {
            continue;
        };
        let content = meta.get("text").and_then(|v| v.as_str()).unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        passages.push(Passage {
            content: content.to_string(),
            source: meta
                .get("source")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            paragraph: meta
                .get("paragraph")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        });
    }
    Ok(passages)
}
