//! Embedding upload: corpus snapshot to remote vector index.
//!
//! Embeds every snapshot passage and upserts it in batches. Each batch
//! gets its own retry loop on top of the embedding client's backoff; a
//! batch that still fails is reported and skipped so a long upload is
//! never lost to one bad batch. `--start` resumes a partial upload.

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::warn;

use crate::config::Config;
use crate::corpus::{CorpusSource, SnapshotCorpus};
use crate::embedding::{self, create_provider};
use crate::models::Passage;
use crate::vector::{IndexRecord, RemoteIndex};

const BATCH_RETRIES: u32 = 3;
const BATCH_RETRY_PAUSE_SECS: u64 = 10;

/// Embed the corpus and upload it to the remote index.
pub async fn run_push(
    config: &Config,
    start: usize,
    batch_size_override: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let provider = create_provider(&config.embedding)?;
    let chunks = SnapshotCorpus::new(config.corpus.snapshot.clone()).load_chunks();
    let batch_size = batch_size_override.unwrap_or(config.embedding.batch_size).max(1);

    if dry_run {
        println!("push (dry-run)");
        println!("  passages: {}", chunks.len());
        println!("  starting at: {}", start);
        println!("  model: {} ({} dims)", provider.model_name(), provider.dims());
        return Ok(());
    }

    if chunks.len() <= start {
        println!("push");
        println!("  nothing to upload");
        return Ok(());
    }

    let index = RemoteIndex::new(config.index.clone(), config.embedding.clone());
    let pending = &chunks[start..];
    let total = pending.len();

    println!("push");
    let mut uploaded = 0usize;
    let mut failed_batches = 0usize;

    for (batch_no, batch) in pending.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|p| p.content.clone()).collect();
        let vectors = embedding::embed_texts(&config.embedding, &texts).await?;

        let records: Vec<IndexRecord> = batch
            .iter()
            .zip(vectors)
            .map(|(p, values)| IndexRecord {
                id: vector_id(p),
                values,
                passage: p.clone(),
            })
            .collect();

        let mut ok = false;
        for attempt in 1..=BATCH_RETRIES {
            match index.upsert(&records).await {
                Ok(()) => {
                    ok = true;
                    break;
                }
                Err(err) => {
                    warn!(batch = batch_no, attempt, error = %err, "batch upload failed");
                    if attempt < BATCH_RETRIES {
                        tokio::time::sleep(Duration::from_secs(BATCH_RETRY_PAUSE_SECS)).await;
                    }
                }
            }
        }

        if ok {
            uploaded += batch.len();
            println!("  uploaded {}/{}", uploaded, total);
        } else {
            failed_batches += 1;
        }
    }

    println!("  uploaded: {}", uploaded);
    if failed_batches > 0 {
        println!("  failed batches: {}", failed_batches);
    }
    Ok(())
}

/// Stable id so re-pushing the same passage overwrites rather than
/// duplicates.
fn vector_id(passage: &Passage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(passage.source.as_bytes());
    hasher.update([0]);
    hasher.update(passage.paragraph.as_bytes());
    hasher.update([0]);
    hasher.update(passage.content.as_bytes());
    format!("{:x}", hasher.finalize())
}
