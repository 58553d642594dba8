//! End-to-end pipeline tests over a temporary corpus directory.

mod common;

use common::mocks::MockEmbedder;
use groundwork::pipeline::{artifacts, ArtifactPaths, Pipeline, PipelineStage, PipelineState};
use groundwork::rag::chunker::{ChunkingConfig, TextChunker};
use groundwork::types::{AppError, Chunk, EmbeddingRecord};
use groundwork::EmbeddingStore;
use tempfile::TempDir;

fn write_corpus(dir: &TempDir) -> std::path::PathBuf {
    let corpus = dir.path().join("scraped_pages");
    std::fs::create_dir_all(&corpus).unwrap();
    std::fs::write(
        corpus.join("Rust.txt"),
        "Rust is a systems programming language.\n\nIt focuses on memory safety.",
    )
    .unwrap();
    std::fs::write(
        corpus.join("Python.txt"),
        "Python is an interpreted language.\n\nIt is popular for scripting.",
    )
    .unwrap();
    std::fs::write(corpus.join("notes.md"), "ignored").unwrap();
    corpus
}

fn chunker() -> TextChunker {
    TextChunker::new(ChunkingConfig::new(50, 10).unwrap())
}

fn embedder() -> MockEmbedder {
    MockEmbedder::new(
        vec![("rust", vec![1.0, 0.0, 0.0]), ("python", vec![0.0, 1.0, 0.0])],
        vec![0.0, 0.0, 1.0],
    )
}

#[tokio::test]
async fn test_pipeline_ingests_corpus_and_writes_artifacts() {
    let dir = TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    let store = EmbeddingStore::open(dir.path().join("artifacts/ingest/rag.sqlite3"))
        .await
        .unwrap();
    let paths = ArtifactPaths {
        chunks: dir.path().join("artifacts/chunks/chunks.jsonl"),
        embeddings: dir.path().join("artifacts/embeddings/embeddings.jsonl"),
    };
    let embedder = embedder();

    let mut pipeline = Pipeline::new(chunker(), &embedder, &store).with_artifacts(paths.clone());
    let report = pipeline.run_dir(&corpus).await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Done);
    assert_eq!(report.documents, 2);
    assert_eq!(report.embedding_dim, 3);
    assert_eq!(report.model, "mock-embed");
    assert_eq!(embedder.calls(), report.chunks);

    let chunks: Vec<Chunk> = artifacts::read_jsonl(&paths.chunks).unwrap();
    let embedded: Vec<EmbeddingRecord> = artifacts::read_jsonl(&paths.embeddings).unwrap();
    assert_eq!(chunks.len(), report.chunks);
    assert_eq!(embedded.len(), report.chunks);
    assert!(chunks.iter().all(|c| c.text.chars().count() <= 50));

    // Python.txt sorts before Rust.txt
    assert!(chunks[0].source_file.ends_with("Python.txt"));
    assert!(chunks[0].chunk_id.starts_with("Python-"));
    assert!(chunks[0].chunk_id.ends_with("-0000"));

    let stored = store.read_all().await.unwrap();
    assert_eq!(stored.len(), report.chunks);
    assert!(stored.iter().all(|r| r.model == "mock-embed"));
}

#[tokio::test]
async fn test_rerun_converges_to_same_snapshot() {
    let dir = TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    let store = EmbeddingStore::open(dir.path().join("rag.sqlite3")).await.unwrap();
    let embedder = embedder();

    Pipeline::new(chunker(), &embedder, &store)
        .run_dir(&corpus)
        .await
        .unwrap();
    let first = store.read_all().await.unwrap();

    Pipeline::new(chunker(), &embedder, &store)
        .run_dir(&corpus)
        .await
        .unwrap();
    let second = store.read_all().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_embedding_failure_keeps_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    let store = EmbeddingStore::open(dir.path().join("rag.sqlite3")).await.unwrap();

    let healthy = embedder();
    Pipeline::new(chunker(), &healthy, &store)
        .run_dir(&corpus)
        .await
        .unwrap();
    let before = store.read_all().await.unwrap();

    let flaky = embedder().failing_after(1);
    let mut pipeline = Pipeline::new(chunker(), &flaky, &store);
    let err = pipeline.run_dir(&corpus).await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Embedding);
    assert_eq!(pipeline.state(), PipelineState::Failed(PipelineStage::Embedding));
    assert_eq!(flaky.calls(), 2);
    assert_eq!(store.read_all().await.unwrap(), before);
}

#[tokio::test]
async fn test_missing_corpus_fails_in_chunking() {
    let dir = TempDir::new().unwrap();
    let store = EmbeddingStore::open(dir.path().join("rag.sqlite3")).await.unwrap();
    let embedder = embedder();

    let err = Pipeline::new(chunker(), &embedder, &store)
        .run_dir(&dir.path().join("does-not-exist"))
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Chunking);
    assert!(matches!(err.source, AppError::Data(_)));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_timeout_during_embedding_is_transport_failure() {
    let dir = TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    let store = EmbeddingStore::open(dir.path().join("rag.sqlite3")).await.unwrap();
    let embedder = embedder().timing_out();

    let err = Pipeline::new(chunker(), &embedder, &store)
        .run_dir(&corpus)
        .await
        .unwrap_err();

    assert!(matches!(err.source, AppError::Timeout(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}
