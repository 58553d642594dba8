//! Persistent storage.
//!
//! The embedding store is a single SQLite table (via libsql) holding the
//! latest ingested snapshot of chunk + vector records:
//!
//! ```text
//! chunks(chunk_id PK, chunk_index, source_file, text,
//!        embedding_json, embedding_dim, model, created_at)
//! ```
//!
//! Each ingestion run deletes every row and bulk-inserts the new set inside
//! one transaction, so readers see either the old snapshot or the new one.

pub mod embedding_store;

pub use embedding_store::EmbeddingStore;
