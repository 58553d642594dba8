//! # groundwork
//!
//! Prepares a document corpus for retrieval-augmented question answering and
//! answers questions against it.
//!
//! ## Overview
//!
//! ```text
//! *.txt --split--> chunks --embed--> records --replace_all--> SQLite
//!                                                               |
//! question --embed--> query vector --cosine top-k + gate--------+--> prompt --> answer
//! ```
//!
//! groundwork can be used in two ways:
//!
//! 1. **As a CLI** - Run the `groundwork` binary (`scrape`, `pipeline`, `ingest`, `chat`, `build`)
//! 2. **As a library** - Use the splitter, store and retriever directly
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use groundwork::{ChunkingConfig, EmbeddingStore, OllamaClient, Pipeline, TextChunker};
//! use std::time::Duration;
//!
//! let chunker = TextChunker::new(ChunkingConfig::new(1200, 200)?);
//! let embedder =
//!     OllamaClient::new("http://127.0.0.1:11434", "nomic-embed-text", Duration::from_secs(60))?;
//! let store = EmbeddingStore::open("artifacts/ingest/rag.sqlite3").await?;
//!
//! let report = Pipeline::new(chunker, &embedder, &store)
//!     .run_dir("scraped_pages".as_ref())
//!     .await?;
//! println!("ingested {} chunks", report.ingested);
//! ```
//!
//! ### Retrieval
//!
//! ```rust,ignore
//! use groundwork::rag::search::{retrieve, EvidenceGate};
//!
//! let records = store.read_all().await?;
//! let ranked = retrieve(&query_vector, &records, 4);
//! if EvidenceGate::new(0.15).assess(&ranked).is_sufficient() {
//!     // build a prompt from `ranked`
//! }
//! ```
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, similarity search and prompt assembly
//! - [`db`] - The SQLite embedding store
//! - [`llm`] - Embedding / generation traits and the Ollama client
//! - [`pipeline`] - Chunk, embed, ingest orchestration and JSONL artifacts
//! - [`scraper`] - Wikipedia document acquisition
//! - [`chat`] - Interactive question answering
//! - [`types`] - Common types and error handling

#![warn(rustdoc::missing_crate_level_docs)]

/// Interactive grounded Q&A loop.
pub mod chat;
/// Command-line definition and terminal output.
pub mod cli;
/// Embedding record storage (libsql/SQLite).
pub mod db;
/// Model service clients (Ollama).
pub mod llm;
/// Chunk, embed and ingest pipeline.
pub mod pipeline;
/// Chunking, retrieval and prompt assembly.
pub mod rag;
/// Wikipedia document acquisition.
pub mod scraper;
/// Core types and errors.
pub mod types;
/// Configuration and logging.
pub mod utils;

// Re-export commonly used types
pub use chat::{ChatSession, ChatSettings, TurnOutcome};
pub use db::EmbeddingStore;
pub use llm::{Embedder, LLMClient, OllamaClient};
pub use pipeline::{Pipeline, PipelineError, PipelineReport, PipelineStage, PipelineState};
pub use rag::chunker::{ChunkingConfig, SourceDocument, TextChunker};
pub use rag::search::{cosine_similarity, retrieve, Evidence, EvidenceGate};
pub use types::{AppError, Chunk, EmbeddingRecord, Result, ScoredChunk};
pub use utils::config::Config;
