//! # Sermon Archive
//!
//! Hybrid retrieval and question answering over a corpus of transcribed
//! sermons.
//!
//! Free-text questions are resolved through a priority cascade: exact
//! reference lookup (date-coded document identifiers), named-series
//! matching, BM25 keyword ranking, and best-effort semantic vector
//! search against a remote index. The merged, deduplicated passage set
//! can then be handed to a language model to produce a prose answer
//! with source citations.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐
//! │ Sermons  │──▶│   Ingest      │──▶│ JSON snapshot  │
//! │ pdf/txt  │   │ split+label  │   │   (corpus)     │
//! └──────────┘   └──────┬───────┘   └──────┬────────┘
//!                       │ push             │ load per query
//!                       ▼                  ▼
//!                ┌────────────┐    ┌──────────────┐
//!                │ Remote vec │◀───│   Hybrid     │──▶ ask / retrieve
//!                │   index    │    │  retriever   │──▶ search (browse)
//!                └────────────┘    └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`normalize`] | Text canonicalization and meaningful tokens |
//! | [`classify`] | Query intent (reference code / series) |
//! | [`title`] | Sermon title extraction and matching |
//! | [`chunking`] | Adaptive passage splitting |
//! | [`ingest`] | Directory scan to corpus snapshot |
//! | [`corpus`] | Snapshot persistence and corpus trait |
//! | [`lexical`] | BM25 keyword ranking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`vector`] | Remote vector index client |
//! | [`push`] | Batch embedding upload |
//! | [`retrieve`] | The hybrid retrieval cascade |
//! | [`answer`] | Prompt rendering and answer generation |
//! | [`links`] | Read-online links for sources |

pub mod answer;
pub mod chunking;
pub mod classify;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod ingest;
pub mod lexical;
pub mod links;
pub mod models;
pub mod normalize;
pub mod push;
pub mod retrieve;
pub mod title;
pub mod vector;
