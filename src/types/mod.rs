use serde::{Deserialize, Serialize};

// ============= Chunk Types =============

/// A contiguous slice of one source document after splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic id derived from the source path and `chunk_index`
    pub chunk_id: String,
    /// Dense 0-based position within the source document
    pub chunk_index: usize,
    /// Path of the originating document
    pub source_file: String,
    /// Non-empty chunk text
    pub text: String,
}

// ============= Embedding Types =============

/// A [`Chunk`] annotated with the vector an embedding model produced for it.
///
/// Serializes flat, matching the embedding artifact line format:
/// `{chunk_id, chunk_index, source_file, text, embedding, embedding_dim, model}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
    pub embedding_dim: usize,
    pub model: String,
}

impl EmbeddingRecord {
    /// Build a record, deriving `embedding_dim` from the vector.
    pub fn new(chunk: Chunk, embedding: Vec<f32>, model: impl Into<String>) -> Self {
        let embedding_dim = embedding.len();
        Self {
            chunk,
            embedding,
            embedding_dim,
            model: model.into(),
        }
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk.chunk_id
    }

    /// Check the record is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.is_empty() {
            return Err(AppError::Data(format!(
                "Empty embedding for chunk_id={}",
                self.chunk.chunk_id
            )));
        }
        if self.embedding.len() != self.embedding_dim {
            return Err(AppError::Data(format!(
                "Dimension mismatch for chunk_id={}: embedding_dim={} but vector has {} values",
                self.chunk.chunk_id,
                self.embedding_dim,
                self.embedding.len()
            )));
        }
        if let Some(pos) = self.embedding.iter().position(|v| !v.is_finite()) {
            return Err(AppError::Data(format!(
                "Non-finite value at position {} in embedding for chunk_id={}",
                pos, self.chunk.chunk_id
            )));
        }
        if self.chunk.text.trim().is_empty() {
            return Err(AppError::Data(format!(
                "Empty text for chunk_id={}",
                self.chunk.chunk_id
            )));
        }
        Ok(())
    }
}

// ============= Retrieval Types =============

/// A chunk paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1]; -1.0 also marks "not comparable"
    pub score: f32,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Store is empty: {0}")]
    EmptyStore(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("LLM error: {0}")]
    LLM(String),

    /// A service answered, but not with the payload we expected
    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Timeouts and connection/status failures talking to a remote service.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_) | AppError::LLM(_) | AppError::Network(_)
        )
    }

    /// The store has no snapshot to read (missing database or zero rows).
    pub fn is_missing_store(&self) -> bool {
        matches!(self, AppError::EmptyStore(_) | AppError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
