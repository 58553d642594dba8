use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::llm::client::{Embedder, LLMClient};
use crate::types::{AppError, Result};

const EMBED_PATH: &str = "/api/embed";
const LEGACY_EMBED_PATH: &str = "/api/embeddings";
const GENERATE_PATH: &str = "/api/generate";
const NUM_PREDICT: u32 = 220;

/// HTTP client for an Ollama server, bound to one model.
///
/// Embedding prefers `/api/embed` and falls back to the legacy
/// `/api/embeddings` endpoint only when the former answers 404. Generation
/// uses non-streaming `/api/generate`.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Build a client whose requests time out after `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http(http, base_url, model))
    }

    /// Build a client on top of an existing `reqwest::Client`.
    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            model: model.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(path, e))
    }

    /// Returns `None` when the endpoint does not exist on this server.
    async fn embed_current(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };
        let response = self.post(EMBED_PATH, &request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let payload: EmbedResponse =
            decode(ensure_success(response, EMBED_PATH).await?, EMBED_PATH).await?;
        let vector = payload.embeddings.into_iter().next().ok_or_else(|| {
            AppError::Decode(format!("Unexpected embedding response from {}", EMBED_PATH))
        })?;

        Ok(Some(vector))
    }

    async fn embed_legacy(&self, text: &str) -> Result<Vec<f32>> {
        let request = LegacyEmbedRequest {
            model: &self.model,
            prompt: text,
        };
        let response = self.post(LEGACY_EMBED_PATH, &request).await?;
        let payload: LegacyEmbedResponse =
            decode(ensure_success(response, LEGACY_EMBED_PATH).await?, LEGACY_EMBED_PATH).await?;

        Ok(payload.embedding)
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = match self.embed_current(text).await? {
            Some(vector) => vector,
            None => {
                tracing::debug!(
                    model = %self.model,
                    "{} not found, using {}",
                    EMBED_PATH,
                    LEGACY_EMBED_PATH
                );
                self.embed_legacy(text).await?
            }
        };

        if vector.is_empty() {
            return Err(AppError::Decode(format!(
                "Model {} returned an empty embedding",
                self.model
            )));
        }
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: NUM_PREDICT,
            },
        };
        let response = self.post(GENERATE_PATH, &request).await?;
        let payload: GenerateResponse =
            decode(ensure_success(response, GENERATE_PATH).await?, GENERATE_PATH).await?;

        Ok(payload.response.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn transport_error(path: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(format!("Ollama request to {} timed out", path))
    } else {
        AppError::LLM(format!("Ollama request to {} failed: {}", path, e))
    }
}

async fn ensure_success(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(AppError::LLM(format!(
        "Ollama {} returned {}: {}",
        path, status, body
    )))
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    path: &str,
) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            AppError::Timeout(format!("Ollama response from {} timed out", path))
        } else {
            AppError::Decode(format!("Unexpected response from {}: {}", path, e))
        }
    })
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct LegacyEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct LegacyEmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}
