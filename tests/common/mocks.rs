//! Mock implementations for testing.
//!
//! In-process stand-ins for the embedding and generation services so the
//! pipeline and chat loop can be exercised without a running Ollama.

use async_trait::async_trait;
use groundwork::llm::{Embedder, LLMClient};
use groundwork::types::{AppError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock embedder mapping texts to vectors by keyword.
///
/// The first keyword contained in the text (case-insensitive) decides the
/// vector; texts without a keyword get `fallback`.
///
/// ```ignore
/// let embedder = MockEmbedder::new(vec![("rust", vec![1.0, 0.0])], vec![0.0, 1.0]);
/// ```
#[derive(Clone)]
pub struct MockEmbedder {
    keywords: Vec<(String, Vec<f32>)>,
    fallback: Vec<f32>,
    fail_after: Option<usize>,
    failure: fn(String) -> AppError,
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    pub fn new(keywords: Vec<(&str, Vec<f32>)>, fallback: Vec<f32>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
            fallback,
            fail_after: None,
            failure: AppError::LLM,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Succeed for the first `n` calls, then fail with an LLM error.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Fail every call with a timeout.
    pub fn timing_out(mut self) -> Self {
        self.fail_after = Some(0);
        self.failure = AppError::Timeout;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| call >= n) {
            return Err((self.failure)("Mock embedding failure".to_string()));
        }

        let lowered = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .find(|(k, _)| lowered.contains(k.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

/// Mock LLM client returning a fixed answer and recording prompts.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}
