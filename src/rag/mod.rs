//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! This module provides the algorithmic core: splitting source text into
//! chunks, ranking stored chunks against a query, and assembling the grounded
//! prompt sent to the generation model.
//!
//! # Module Structure
//!
//! - [`rag::chunker`](crate::rag::chunker) - Paragraph-aware chunking with overlap
//! - [`rag::search`](crate::rag::search) - Exact cosine top-k and the evidence gate
//! - [`rag::prompt`](crate::rag::prompt) - Context packing under a character budget
//!
//! # RAG Pipeline
//!
//! 1. **Chunking** - Documents are split into bounded, overlapping chunks
//! 2. **Embedding** - Each chunk is embedded by the model service
//! 3. **Storage** - Records replace the previous snapshot in the store
//! 4. **Retrieval** - The query is embedded and every record is scored
//! 5. **Generation** - The model answers from the top-ranked context
//!
//! # Example
//!
//! ```ignore
//! use groundwork::rag::chunker::{ChunkingConfig, TextChunker};
//! use groundwork::rag::search::{retrieve, EvidenceGate};
//!
//! let chunker = TextChunker::new(ChunkingConfig::new(1200, 200)?);
//! let chunks = chunker.split(&document_text);
//!
//! let ranked = retrieve(&query_embedding, &records, 4);
//! if EvidenceGate::new(0.15).assess(&ranked).is_sufficient() {
//!     // build the prompt
//! }
//! ```

pub mod chunker;
pub mod prompt;
pub mod search;
