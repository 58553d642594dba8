//! Model Service Clients
//!
//! This module wraps the remote model service used for two capabilities:
//!
//! - **Embedding**: text to vector, one request per text
//! - **Generation**: prompt to answer, non-streaming
//!
//! # Architecture
//!
//! - [`Embedder`] / [`LLMClient`] - The traits the pipeline and chat loop depend on
//! - [`OllamaClient`] - The HTTP implementation against an Ollama server
//!
//! # Example
//!
//! ```ignore
//! use groundwork::llm::{Embedder, LLMClient, OllamaClient};
//! use std::time::Duration;
//!
//! let embedder =
//!     OllamaClient::new("http://127.0.0.1:11434", "nomic-embed-text", Duration::from_secs(60))?;
//! let vector = embedder.embed("What is Rust?").await?;
//!
//! let chat = OllamaClient::new("http://127.0.0.1:11434", "llama3.2", Duration::from_secs(300))?;
//! let answer = chat.generate("Say hello").await?;
//! ```

/// Core embedding and generation traits.
pub mod client;
/// Ollama HTTP implementation.
pub mod ollama;

pub use client::{Embedder, LLMClient};
pub use ollama::OllamaClient;
