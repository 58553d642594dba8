use std::collections::{HashMap, HashSet};
use std::path::Path;

use libsql::{Builder, Connection, Database};
use tokio::sync::Mutex;

use crate::types::{AppError, Chunk, EmbeddingRecord, Result};

/// SQLite-backed store holding the current snapshot of embedding records.
///
/// The table is keyed by `chunk_id`. Writes only happen through
/// [`replace_all`](Self::replace_all), which swaps the whole snapshot inside a
/// single transaction. A coarse lock serializes it against readers in this
/// process; the transaction covers readers in other processes.
pub struct EmbeddingStore {
    _db: Database,
    conn: Mutex<Connection>,
    location: String,
}

impl EmbeddingStore {
    /// Open (or create) a store at `path`, creating parent directories.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::open_location(path.to_string_lossy().to_string()).await
    }

    /// Open a store that must already exist on disk.
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::NotFound(format!(
                "Ingest DB not found: {}",
                path.display()
            )));
        }
        Self::open_location(path.to_string_lossy().to_string()).await
    }

    /// In-memory store, for tests.
    pub async fn new_memory() -> Result<Self> {
        Self::open_location(":memory:".to_string()).await
    }

    async fn open_location(location: String) -> Result<Self> {
        let db = Builder::new_local(&location)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {}: {}", location, e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self {
            _db: db,
            conn: Mutex::new(conn),
            location,
        };
        store.initialize_schema().await?;
        Ok(store)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                chunk_index INTEGER NOT NULL,
                source_file TEXT NOT NULL,
                text TEXT NOT NULL,
                embedding_json TEXT NOT NULL,
                embedding_dim INTEGER NOT NULL,
                model TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create chunks table: {}", e)))?;

        Ok(())
    }

    /// Replace the entire snapshot with `records`.
    ///
    /// Records are validated before anything is written. On any failure the
    /// transaction rolls back and the previous snapshot stays in place.
    pub async fn replace_all(&self, records: &[EmbeddingRecord]) -> Result<u64> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            record.validate()?;
            if !seen.insert(record.chunk_id()) {
                return Err(AppError::Data(format!(
                    "Duplicate chunk_id={} in ingest batch",
                    record.chunk_id()
                )));
            }
        }
        check_dimensions(records)?;

        let conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to clear chunks: {}", e)))?;

        for record in records {
            let embedding_json = serde_json::to_string(&record.embedding)?;
            tx.execute(
                "INSERT INTO chunks
                 (chunk_id, chunk_index, source_file, text, embedding_json, embedding_dim, model)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                (
                    record.chunk.chunk_id.as_str(),
                    record.chunk.chunk_index as i64,
                    record.chunk.source_file.as_str(),
                    record.chunk.text.as_str(),
                    embedding_json,
                    record.embedding_dim as i64,
                    record.model.as_str(),
                ),
            )
            .await
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to insert chunk_id={}: {}",
                    record.chunk.chunk_id, e
                ))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit snapshot: {}", e)))?;

        Ok(records.len() as u64)
    }

    /// Read the full snapshot ordered by `chunk_index`.
    ///
    /// Fails with [`AppError::EmptyStore`] when there are no rows and with
    /// [`AppError::Data`] when a stored vector is malformed.
    pub async fn read_all(&self) -> Result<Vec<EmbeddingRecord>> {
        let conn = self.conn.lock().await;

        let mut rows = conn
            .query(
                "SELECT chunk_id, chunk_index, source_file, text,
                        embedding_json, embedding_dim, model
                 FROM chunks
                 ORDER BY chunk_index ASC, rowid ASC",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query chunks: {}", e)))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let chunk_id: String = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;
            let chunk_index: i64 = row.get(1).map_err(|e| AppError::Database(e.to_string()))?;
            let source_file: String = row.get(2).map_err(|e| AppError::Database(e.to_string()))?;
            let text: String = row.get(3).map_err(|e| AppError::Database(e.to_string()))?;
            let embedding_json: String =
                row.get(4).map_err(|e| AppError::Database(e.to_string()))?;
            let embedding_dim: i64 = row.get(5).map_err(|e| AppError::Database(e.to_string()))?;
            let model: String = row.get(6).map_err(|e| AppError::Database(e.to_string()))?;

            let embedding: Vec<f32> = serde_json::from_str(&embedding_json).map_err(|_| {
                AppError::Data(format!("Invalid embedding_json for chunk_id={}", chunk_id))
            })?;
            let chunk_index = usize::try_from(chunk_index).map_err(|_| {
                AppError::Data(format!("Negative chunk_index for chunk_id={}", chunk_id))
            })?;
            let embedding_dim = usize::try_from(embedding_dim).map_err(|_| {
                AppError::Data(format!("Negative embedding_dim for chunk_id={}", chunk_id))
            })?;

            let record = EmbeddingRecord {
                chunk: Chunk {
                    chunk_id,
                    chunk_index,
                    source_file,
                    text,
                },
                embedding,
                embedding_dim,
                model,
            };
            record.validate()?;
            records.push(record);
        }

        if records.is_empty() {
            return Err(AppError::EmptyStore(format!(
                "No records found in ingest DB: {}",
                self.location
            )));
        }
        check_dimensions(&records)?;

        Ok(records)
    }

    pub async fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().await;

        let mut rows = conn
            .query("SELECT COUNT(*) FROM chunks", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count chunks: {}", e)))?;

        let count: i64 = match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            None => 0,
        };

        Ok(count.max(0) as u64)
    }
}

/// All records of one model must share a dimension.
fn check_dimensions(records: &[EmbeddingRecord]) -> Result<()> {
    let mut dims: HashMap<&str, (usize, &str)> = HashMap::new();
    for record in records {
        let (dim, first_id) = *dims
            .entry(record.model.as_str())
            .or_insert((record.embedding_dim, record.chunk_id()));
        if dim != record.embedding_dim {
            return Err(AppError::Data(format!(
                "Dimension mismatch for model {}: chunk_id={} has {} but chunk_id={} has {}",
                record.model,
                first_id,
                dim,
                record.chunk_id(),
                record.embedding_dim
            )));
        }
    }
    Ok(())
}
