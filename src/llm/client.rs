//! Model service abstractions
//!
//! The pipeline and the chat loop only see these traits, so tests can swap
//! in in-process fakes for the HTTP client:
//! - [`Embedder`]: text to vector
//! - [`LLMClient`]: prompt to completion

use crate::types::Result;
use async_trait::async_trait;

/// Maps text to an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Identifier recorded alongside every vector this embedder produces
    fn model_name(&self) -> &str;
}

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a non-streaming completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}
