//! # Sermon Archive CLI (`sermon`)
//!
//! The `sermon` binary is the interface to the archive. It provides
//! commands for ingesting transcripts, uploading embeddings, and
//! querying the corpus.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sermon ingest <dir>` | Split transcripts into passages and write the corpus snapshot |
//! | `sermon push` | Embed the corpus and upload it to the remote vector index |
//! | `sermon ask "<question>"` | Retrieve context and generate a sourced answer |
//! | `sermon retrieve "<query>"` | Print the hybrid retrieval result without an answer |
//! | `sermon search "<query>"` | Keyword browse with a stage-by-stage trace |
//!
//! ## Examples
//!
//! ```bash
//! # Build the corpus snapshot from a directory of transcripts
//! sermon ingest ./sermons --config ./config/sermon.toml
//!
//! # Upload embeddings (requires GOOGLE_API_KEY and PINECONE_API_KEY)
//! sermon push --config ./config/sermon.toml
//!
//! # Ask a question
//! sermon ask "What was revealed under the first seal?"
//!
//! # Target one sermon by its reference code
//! sermon retrieve "Tell me about 63-0318"
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sermon_archive::answer;
use sermon_archive::config::{load_config, Config};
use sermon_archive::corpus::SnapshotCorpus;
use sermon_archive::ingest;
use sermon_archive::links::reference_link;
use sermon_archive::models::Passage;
use sermon_archive::push;
use sermon_archive::retrieve::{HybridRetriever, Retriever};
use sermon_archive::vector::RemoteIndex;

/// Sermon Archive CLI: hybrid retrieval and question answering over a
/// corpus of transcribed sermons.
#[derive(Parser)]
#[command(
    name = "sermon",
    about = "Hybrid retrieval and question answering over a transcribed sermon archive",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sermon.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest sermon transcripts into the corpus snapshot.
    ///
    /// Scans the directory for pdf/txt/md files, splits each into
    /// labeled passages (exact paragraph markers when the transcript is
    /// numbered, synthetic chunk labels otherwise), and writes the
    /// snapshot the retriever reads.
    Ingest {
        /// Directory containing the transcripts.
        dir: PathBuf,

        /// Show file and passage counts without writing the snapshot.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Embed the corpus and upload it to the remote vector index.
    ///
    /// Uploads in batches with per-batch retry. Requires an enabled
    /// embedding provider plus GOOGLE_API_KEY and PINECONE_API_KEY.
    Push {
        /// Passage offset to resume a partial upload from.
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Override the configured batch size.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Show what would be uploaded without calling any API.
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask a question; retrieves context and generates a sourced answer.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Run hybrid retrieval and print ranked passages without generating
    /// an answer.
    Retrieve {
        /// The query string.
        query: String,

        /// Maximum number of passages to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Keyword browse over the corpus with a stage-by-stage trace.
    Search {
        /// The search phrase.
        query: String,

        /// Maximum number of passages to print.
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest {
            dir,
            dry_run,
            limit,
        } => ingest::run_ingest(&config, &dir, dry_run, limit),
        Commands::Push {
            start,
            batch_size,
            dry_run,
        } => push::run_push(&config, start, batch_size, dry_run).await,
        Commands::Ask { question } => run_ask(&config, &question).await,
        Commands::Retrieve { query, limit } => run_retrieve(&config, &query, limit).await,
        Commands::Search { query, limit } => run_search(&config, &query, limit),
    }
}

fn build_retriever(config: &Config) -> HybridRetriever {
    HybridRetriever::new(
        Box::new(SnapshotCorpus::new(config.corpus.snapshot.clone())),
        Box::new(RemoteIndex::new(
            config.index.clone(),
            config.embedding.clone(),
        )),
        config.series.clone(),
        config.retrieval.clone(),
    )
}

async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let retriever = build_retriever(config);
    let outcome = answer::ask(&retriever, &config.answer, question).await?;

    println!("{}", outcome.answer.trim());

    if !outcome.passages.is_empty() {
        println!();
        println!("Sources:");
        let mut seen = HashSet::new();
        for passage in &outcome.passages {
            if !seen.insert(passage.source.clone()) {
                continue;
            }
            match reference_link(&passage.source, &config.links.read_url_template) {
                Some(url) => println!("  {} ({})", passage.source, url),
                None => println!("  {}", passage.source),
            }
        }
    }
    Ok(())
}

async fn run_retrieve(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let retriever = build_retriever(config);
    let mut passages = retriever.retrieve(query).await;
    if let Some(limit) = limit {
        passages.truncate(limit);
    }
    print_passages(&passages);
    Ok(())
}

fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let retriever = build_retriever(config);
    let (mut passages, log) = retriever.search(query);
    for line in &log {
        println!("{}", line);
    }
    if let Some(limit) = limit {
        passages.truncate(limit);
    }
    print_passages(&passages);
    Ok(())
}

fn print_passages(passages: &[Passage]) {
    if passages.is_empty() {
        println!("No results.");
        return;
    }
    for (i, passage) in passages.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, passage.source, passage.paragraph);
        println!("   {}", excerpt(&passage.content));
    }
}

fn excerpt(content: &str) -> String {
    content
        .chars()
        .take(240)
        .collect::<String>()
        .replace('\n', " ")
        .trim()
        .to_string()
}
