//! Ingestion: source documents to corpus snapshot.
//!
//! Scans a directory for sermon transcripts, extracts their text, splits
//! each into labeled passages, and writes the corpus snapshot. A file
//! that fails to read is reported and skipped; ingestion continues.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use walkdir::WalkDir;

use crate::chunking::split_passages;
use crate::config::Config;
use crate::corpus;
use crate::models::Passage;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Scan `dir`, split every supported document, and write the snapshot.
pub fn run_ingest(config: &Config, dir: &Path, dry_run: bool, limit: Option<usize>) -> Result<()> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_supported_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    if let Some(limit) = limit {
        files.truncate(limit);
    }

    let mut passages: Vec<Passage> = Vec::new();
    let mut failed = 0usize;

    for path in &files {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        match read_document(path) {
            Ok(text) => {
                passages.extend(split_passages(&filename, &text, config.chunking.max_tokens));
            }
            Err(err) => {
                failed += 1;
                warn!(file = %path.display(), error = %err, "failed to read document");
            }
        }
    }

    if dry_run {
        println!("ingest (dry-run)");
        println!("  files scanned: {}", files.len());
        println!("  passages: {}", passages.len());
        return Ok(());
    }

    corpus::save_chunks(&config.corpus.snapshot, &passages)?;

    println!("ingest");
    println!("  files scanned: {}", files.len());
    if failed > 0 {
        println!("  files failed: {}", failed);
    }
    println!("  passages: {}", passages.len());
    println!("  snapshot: {}", config.corpus.snapshot.display());
    Ok(())
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_document(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        pdf_extract::extract_text(path)
            .map_err(|e| anyhow::anyhow!("pdf extraction failed: {}", e))
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}
