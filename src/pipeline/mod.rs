//! Ingestion pipeline
//!
//! Runs the corpus through three stages, in order:
//!
//! ```text
//! Chunking -> Embedding -> Ingesting -> Done
//!     \           \            \
//!      +-----------+------------+--> Failed(stage)
//! ```
//!
//! Each stage hands a typed value to the next one in memory. The JSONL
//! artifacts are written alongside when enabled, so a run can be re-ingested
//! later without re-embedding. Any error stops the run in the stage where it
//! happened; nothing is retried and the store is only touched by the final
//! stage, so a failed embedding leaves the previous snapshot in place.

pub mod artifacts;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::db::EmbeddingStore;
use crate::llm::Embedder;
use crate::rag::chunker::{discover_sources, SourceDocument, TextChunker};
use crate::types::{AppError, Chunk, EmbeddingRecord};

const PROGRESS_EVERY: usize = 10;

/// A stage of the pipeline that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Chunking,
    Embedding,
    Ingesting,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Chunking => "chunking",
            PipelineStage::Embedding => "embedding",
            PipelineStage::Ingesting => "ingesting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Chunking,
    Embedding,
    Ingesting,
    Done,
    Failed(PipelineStage),
}

/// A run that stopped in `stage`.
#[derive(Debug, thiserror::Error)]
#[error("Pipeline failed during {stage}: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: AppError,
}

/// Where to write the intermediate JSONL files.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub chunks: PathBuf,
    pub embeddings: PathBuf,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub documents: usize,
    pub chunks: usize,
    pub ingested: u64,
    pub embedding_dim: usize,
    pub model: String,
}

/// Chunk, embed and ingest a corpus.
pub struct Pipeline<'a> {
    chunker: TextChunker,
    embedder: &'a dyn Embedder,
    store: &'a EmbeddingStore,
    artifacts: Option<ArtifactPaths>,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        chunker: TextChunker,
        embedder: &'a dyn Embedder,
        store: &'a EmbeddingStore,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
            artifacts: None,
            state: PipelineState::Chunking,
        }
    }

    /// Also write chunk and embedding artifacts during the run.
    pub fn with_artifacts(mut self, paths: ArtifactPaths) -> Self {
        self.artifacts = Some(paths);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Discover and read every `*.txt` under `dir`, then run the pipeline.
    pub async fn run_dir(&mut self, dir: &Path) -> Result<PipelineReport, PipelineError> {
        self.state = PipelineState::Chunking;
        let documents: Result<Vec<SourceDocument>, AppError> = discover_sources(dir)
            .and_then(|paths| paths.iter().map(|p| SourceDocument::read(p)).collect());

        match documents {
            Ok(documents) => self.run(&documents).await,
            Err(e) => Err(self.fail(PipelineStage::Chunking, e)),
        }
    }

    /// Run all stages over already loaded documents.
    pub async fn run(
        &mut self,
        documents: &[SourceDocument],
    ) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();

        self.state = PipelineState::Chunking;
        let chunks = self
            .chunk_documents(documents)
            .map_err(|e| self.fail(PipelineStage::Chunking, e))?;

        self.state = PipelineState::Embedding;
        let records = self
            .embed_chunks(&chunks)
            .await
            .map_err(|e| self.fail(PipelineStage::Embedding, e))?;

        let ingested = self.ingest(records.as_slice()).await?;

        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        Ok(PipelineReport {
            documents: documents.len(),
            chunks: chunks.len(),
            ingested,
            embedding_dim: records.first().map(|r| r.embedding_dim).unwrap_or(0),
            model: self.embedder.model_name().to_string(),
        })
    }

    /// Ingesting stage on its own, for records loaded from an artifact.
    pub async fn ingest(&mut self, records: &[EmbeddingRecord]) -> Result<u64, PipelineError> {
        self.state = PipelineState::Ingesting;
        if records.is_empty() {
            return Err(self.fail(
                PipelineStage::Ingesting,
                AppError::Data("No embedding records to ingest".to_string()),
            ));
        }

        let ingested = self
            .store
            .replace_all(records)
            .await
            .map_err(|e| self.fail(PipelineStage::Ingesting, e))?;

        tracing::info!(rows = ingested, db = %self.store.location(), "Ingested embeddings");
        self.state = PipelineState::Done;
        Ok(ingested)
    }

    fn chunk_documents(&self, documents: &[SourceDocument]) -> Result<Vec<Chunk>, AppError> {
        let mut chunks = Vec::new();
        for document in documents {
            let produced = document.chunk(&self.chunker);
            tracing::info!(
                source = %document.path.display(),
                chunks = produced.len(),
                "Chunked document"
            );
            chunks.extend(produced);
        }

        if chunks.is_empty() {
            return Err(AppError::Data(format!(
                "No chunks produced from {} source document(s)",
                documents.len()
            )));
        }

        if let Some(paths) = &self.artifacts {
            artifacts::write_jsonl(&paths.chunks, &chunks)?;
            tracing::info!(path = %paths.chunks.display(), "Wrote chunk artifact");
        }
        Ok(chunks)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<EmbeddingRecord>, AppError> {
        let model = self.embedder.model_name().to_string();
        let total = chunks.len();
        let mut records = Vec::with_capacity(total);

        for (i, chunk) in chunks.iter().enumerate() {
            let vector = self.embedder.embed(&chunk.text).await.map_err(|e| {
                tracing::error!(chunk_id = %chunk.chunk_id, "Embedding failed: {}", e);
                e
            })?;
            records.push(EmbeddingRecord::new(chunk.clone(), vector, model.as_str()));

            let done = i + 1;
            if done % PROGRESS_EVERY == 0 || done == total {
                tracing::info!("Embedded {}/{} chunks", done, total);
            }
        }

        if let Some(paths) = &self.artifacts {
            artifacts::write_jsonl(&paths.embeddings, &records)?;
            tracing::info!(path = %paths.embeddings.display(), "Wrote embedding artifact");
        }
        Ok(records)
    }

    fn fail(&mut self, stage: PipelineStage, source: AppError) -> PipelineError {
        tracing::error!(%stage, "Pipeline failed: {}", source);
        self.state = PipelineState::Failed(stage);
        PipelineError { stage, source }
    }
}

/// Re-run only the Ingesting stage from an embedding artifact.
pub async fn ingest_artifact(store: &EmbeddingStore, path: &Path) -> Result<u64, PipelineError> {
    let fail = |source: AppError| {
        tracing::error!(stage = %PipelineStage::Ingesting, "Pipeline failed: {}", source);
        PipelineError {
            stage: PipelineStage::Ingesting,
            source,
        }
    };

    let records: Vec<EmbeddingRecord> = artifacts::read_jsonl(path).map_err(fail)?;
    if records.is_empty() {
        return Err(fail(AppError::Data(format!(
            "No embedding records in {}",
            path.display()
        ))));
    }
    tracing::info!(records = records.len(), path = %path.display(), "Loaded embedding artifact");

    let ingested = store.replace_all(&records).await.map_err(fail)?;
    tracing::info!(rows = ingested, db = %store.location(), "Ingested embeddings");
    Ok(ingested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::chunker::ChunkingConfig;
    use crate::types::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds by text length; fails on the call numbered `fail_at`.
    struct CountingEmbedder {
        calls: AtomicUsize,
        fail_at: Option<usize>,
    }

    impl CountingEmbedder {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_at,
            }
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(call) == self.fail_at {
                return Err(AppError::Timeout("embed timed out".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn model_name(&self) -> &str {
            "fake-embed"
        }
    }

    fn chunker() -> TextChunker {
        TextChunker::new(ChunkingConfig::new(40, 5).unwrap())
    }

    fn docs() -> Vec<SourceDocument> {
        vec![
            SourceDocument::new("/corpus/a.txt", "Alpha paragraph.\n\nBeta paragraph here."),
            SourceDocument::new("/corpus/b.txt", "Gamma."),
        ]
    }

    #[tokio::test]
    async fn test_run_reaches_done() {
        let store = EmbeddingStore::new_memory().await.unwrap();
        let embedder = CountingEmbedder::new(None);
        let mut pipeline = Pipeline::new(chunker(), &embedder, &store);

        let report = pipeline.run(&docs()).await.unwrap();

        assert_eq!(pipeline.state(), PipelineState::Done);
        assert_eq!(report.documents, 2);
        assert_eq!(report.ingested as usize, report.chunks);
        assert_eq!(report.embedding_dim, 2);
        assert_eq!(report.model, "fake-embed");
        assert_eq!(store.count().await.unwrap() as usize, report.chunks);
    }

    #[tokio::test]
    async fn test_zero_chunks_fails_in_chunking() {
        let store = EmbeddingStore::new_memory().await.unwrap();
        let embedder = CountingEmbedder::new(None);
        let mut pipeline = Pipeline::new(chunker(), &embedder, &store);

        let err = pipeline
            .run(&[SourceDocument::new("/corpus/blank.txt", "  \n\n  ")])
            .await
            .unwrap_err();

        assert_eq!(err.stage, PipelineStage::Chunking);
        assert!(matches!(err.source, AppError::Data(_)));
        assert_eq!(pipeline.state(), PipelineState::Failed(PipelineStage::Chunking));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_fail_fast() {
        let store = EmbeddingStore::new_memory().await.unwrap();
        let embedder = CountingEmbedder::new(Some(1));
        let mut pipeline = Pipeline::new(chunker(), &embedder, &store);

        let err = pipeline.run(&docs()).await.unwrap_err();

        assert_eq!(err.stage, PipelineStage::Embedding);
        assert!(err.source.is_transport());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_records() {
        let store = EmbeddingStore::new_memory().await.unwrap();
        let embedder = CountingEmbedder::new(None);
        let mut pipeline = Pipeline::new(chunker(), &embedder, &store);

        let err = pipeline.ingest(&[]).await.unwrap_err();
        assert_eq!(err.stage, PipelineStage::Ingesting);
    }

    #[tokio::test]
    async fn test_artifacts_then_ingest_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths {
            chunks: dir.path().join("chunks").join("chunks.jsonl"),
            embeddings: dir.path().join("embeddings").join("embeddings.jsonl"),
        };
        let embedder = CountingEmbedder::new(None);
        let first = EmbeddingStore::new_memory().await.unwrap();
        let report = Pipeline::new(chunker(), &embedder, &first)
            .with_artifacts(paths.clone())
            .run(&docs())
            .await
            .unwrap();

        assert!(paths.chunks.exists());
        let second = EmbeddingStore::new_memory().await.unwrap();
        let ingested = ingest_artifact(&second, &paths.embeddings).await.unwrap();

        assert_eq!(ingested, report.ingested);
        assert_eq!(second.read_all().await.unwrap(), first.read_all().await.unwrap());
    }

    #[tokio::test]
    async fn test_ingest_artifact_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingStore::new_memory().await.unwrap();
        let err = ingest_artifact(&store, &dir.path().join("none.jsonl"))
            .await
            .unwrap_err();
        assert_eq!(err.stage, PipelineStage::Ingesting);
        assert!(matches!(err.source, AppError::NotFound(_)));
    }

    #[test]
    fn test_error_display_names_stage() {
        let err = PipelineError {
            stage: PipelineStage::Embedding,
            source: AppError::Timeout("slow".to_string()),
        };
        assert!(err.to_string().contains("embedding"));
    }
}
