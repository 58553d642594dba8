//! Paragraph-aware text chunking.
//!
//! Text is split on blank lines into paragraphs, which are packed greedily
//! into chunks of at most `chunk_size` characters. When a chunk is closed,
//! the next one is seeded with the last `overlap` characters of it so that
//! neighbouring chunks share context. Paragraphs that cannot fit are
//! hard-split into `chunk_size` windows advancing by `chunk_size - overlap`.
//!
//! All lengths are measured in characters, not bytes.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::types::{AppError, Chunk, Result};

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Validated splitter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    /// Validate `chunk_size > 0` and `0 <= overlap < chunk_size`.
    ///
    /// Takes signed values so that configuration read from the environment can
    /// be rejected here instead of wrapping around.
    pub fn new(chunk_size: i64, overlap: i64) -> Result<Self> {
        if chunk_size <= 0 {
            return Err(AppError::Configuration(
                "CHUNK_SIZE must be greater than 0".to_string(),
            ));
        }
        if overlap < 0 {
            return Err(AppError::Configuration(
                "CHUNK_OVERLAP cannot be negative".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(AppError::Configuration(
                "CHUNK_OVERLAP must be smaller than CHUNK_SIZE".to_string(),
            ));
        }
        let out_of_range = |name: &str, value: i64| {
            AppError::Configuration(format!("{name} out of range: {value}"))
        };
        let chunk_size =
            usize::try_from(chunk_size).map_err(|_| out_of_range("CHUNK_SIZE", chunk_size))?;
        let overlap = usize::try_from(overlap).map_err(|_| out_of_range("CHUNK_OVERLAP", overlap))?;

        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

/// Splits raw text into bounded, overlapping chunks.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Split `text` into trimmed, non-empty chunks.
    ///
    /// Output is a pure function of the text and the configuration.
    pub fn split(&self, text: &str) -> Vec<String> {
        let size = self.config.chunk_size;
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for paragraph in paragraphs(text) {
            let candidate = if current.is_empty() {
                paragraph.to_string()
            } else {
                format!("{current}{PARAGRAPH_SEPARATOR}{paragraph}")
            };

            if char_len(&candidate) <= size {
                current = candidate;
                continue;
            }

            let seeded = if current.is_empty() {
                // A lone paragraph that is too long on its own: no carry.
                paragraph.to_string()
            } else {
                let carry = tail_chars(&current, self.config.overlap).to_string();
                chunks.push(std::mem::take(&mut current));
                if carry.is_empty() {
                    paragraph.to_string()
                } else {
                    format!("{carry}{PARAGRAPH_SEPARATOR}{paragraph}")
                }
            };

            current = self.hard_split(seeded, &mut chunks);
        }

        if !current.trim().is_empty() {
            chunks.push(current);
        }

        chunks
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Emit `chunk_size` windows from `buffer` until the remainder fits.
    fn hard_split(&self, buffer: String, chunks: &mut Vec<String>) -> String {
        let size = self.config.chunk_size;
        if char_len(&buffer) <= size {
            return buffer;
        }

        let stride = size - self.config.overlap;
        let chars: Vec<char> = buffer.chars().collect();
        let mut start = 0;
        while chars.len() - start > size {
            chunks.push(chars[start..start + size].iter().collect());
            start += stride;
        }
        chars[start..].iter().collect()
    }
}

/// Blank-line separated paragraphs with surrounding whitespace removed.
pub fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split(PARAGRAPH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The last `n` characters of `s`.
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

// ============================================================================
// Source documents
// ============================================================================

/// A raw text document to be chunked.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Resolved path of the document; also the basis of its chunk ids
    pub path: PathBuf,
    pub text: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a document from disk, resolving its path to an absolute one.
    pub fn read(path: &Path) -> Result<Self> {
        let resolved = std::fs::canonicalize(path)?;
        let text = std::fs::read_to_string(&resolved)?;
        Ok(Self {
            path: resolved,
            text,
        })
    }

    /// Chunk this document into records with deterministic ids.
    pub fn chunk(&self, chunker: &TextChunker) -> Vec<Chunk> {
        let source_file = self.path.to_string_lossy().to_string();
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let key = file_key(&self.path);

        chunker
            .split(&self.text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                chunk_id: chunk_id(&stem, &key, chunk_index),
                chunk_index,
                source_file: source_file.clone(),
                text,
            })
            .collect()
    }
}

/// First 8 hex digits of the SHA-256 of the path.
pub fn file_key(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    hex::encode(digest)[..8].to_string()
}

pub fn chunk_id(stem: &str, file_key: &str, chunk_index: usize) -> String {
    format!("{stem}-{file_key}-{chunk_index:04}")
}

/// All `*.txt` files directly under `dir`, sorted by path.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let not_found = || {
        AppError::Data(format!(
            "No source .txt files found in {}/. Run the scrape command first.",
            dir.display()
        ))
    };

    if !dir.is_dir() {
        return Err(not_found());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(not_found());
    }
    Ok(files)
}
