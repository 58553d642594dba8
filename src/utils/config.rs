//! Environment-driven configuration.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory. Every setting has a default except the
//! model names, whose presence is checked by the commands that need them.

use std::path::PathBuf;
use std::time::Duration;

use crate::rag::chunker::ChunkingConfig;
use crate::types::{AppError, Result};

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_WIKI_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_WIKI_WORKERS: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub chunking: ChunkingSettings,
    pub chat: ChatConfig,
    pub paths: PathsConfig,
    pub scraper: ScraperConfig,
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub embed_model: Option<String>,
    pub chat_model: Option<String>,
    pub embed_timeout: Duration,
}

/// Raw splitter settings; validated by [`ChunkingSettings::validate`].
#[derive(Debug, Clone, Copy)]
pub struct ChunkingSettings {
    pub chunk_size: i64,
    pub chunk_overlap: i64,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub top_k: usize,
    pub min_similarity: f32,
    pub max_context_chars: usize,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub scraped_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub ingest_db_path: PathBuf,
    pub log_dir: PathBuf,
    pub write_artifacts: bool,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub subjects: Vec<String>,
    pub max_workers: Option<i64>,
    pub allow_insecure: bool,
    pub api_url: String,
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let artifacts_dir = PathBuf::from(env.string("ARTIFACTS_DIR", "artifacts"));
        let ingest_db_path = env
            .optional("INGEST_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| artifacts_dir.join("ingest").join("rag.sqlite3"));

        Ok(Config {
            ollama: OllamaConfig {
                base_url: env
                    .string("OLLAMA_BASE_URL", DEFAULT_OLLAMA_URL)
                    .trim_end_matches('/')
                    .to_string(),
                embed_model: env.optional("OLLAMA_EMBED_MODEL"),
                chat_model: env.optional("OLLAMA_CHAT_MODEL"),
                embed_timeout: Duration::from_secs(env.unsigned("EMBED_REQUEST_TIMEOUT", 60)?),
            },
            chunking: ChunkingSettings {
                chunk_size: env.int("CHUNK_SIZE", 1200)?,
                chunk_overlap: env.int("CHUNK_OVERLAP", 200)?,
            },
            chat: ChatConfig {
                top_k: env.unsigned("CHAT_TOP_K", 4)? as usize,
                min_similarity: env.float("CHAT_MIN_SIMILARITY", 0.15)?,
                max_context_chars: env.unsigned("CHAT_MAX_CONTEXT_CHARS", 3600)? as usize,
                request_timeout: Duration::from_secs(env.unsigned("CHAT_REQUEST_TIMEOUT", 300)?),
            },
            paths: PathsConfig {
                scraped_dir: PathBuf::from(env.string("SCRAPED_DIR", "scraped_pages")),
                artifacts_dir,
                ingest_db_path,
                log_dir: PathBuf::from(env.string("LOG_DIR", "logs")),
                write_artifacts: env.flag("WRITE_ARTIFACTS", true)?,
            },
            scraper: ScraperConfig {
                subjects: parse_subjects(&env.string("WIKI_SUBJECT", "")),
                max_workers: env.optional_int("WIKI_MAX_WORKERS")?,
                allow_insecure: env.flag("WIKI_ALLOW_INSECURE", false)?,
                api_url: env.string("WIKI_API_URL", DEFAULT_WIKI_API_URL),
            },
        })
    }
}

impl OllamaConfig {
    pub fn require_embed_model(&self) -> Result<&str> {
        self.embed_model
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Missing OLLAMA_EMBED_MODEL".to_string()))
    }

    pub fn require_chat_model(&self) -> Result<&str> {
        self.chat_model
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Missing OLLAMA_CHAT_MODEL".to_string()))
    }
}

impl ChunkingSettings {
    pub fn validate(&self) -> Result<ChunkingConfig> {
        ChunkingConfig::new(self.chunk_size, self.chunk_overlap)
    }
}

impl PathsConfig {
    pub fn chunk_file(&self) -> PathBuf {
        self.artifacts_dir.join("chunks").join("chunks.jsonl")
    }

    pub fn embedding_file(&self) -> PathBuf {
        self.artifacts_dir.join("embeddings").join("embeddings.jsonl")
    }

    pub fn error_log_file(&self) -> PathBuf {
        self.log_dir.join("errorlogs.txt")
    }
}

impl ScraperConfig {
    /// Worker count for `subject_count` subjects: the configured maximum (or
    /// 4) capped at the number of subjects.
    pub fn workers_for(&self, subject_count: usize) -> Result<usize> {
        let configured = match self.max_workers {
            Some(n) if n <= 0 => {
                return Err(AppError::Configuration(
                    "WIKI_MAX_WORKERS must be greater than 0".to_string(),
                ))
            }
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
            None => DEFAULT_WIKI_WORKERS,
        };
        Ok(configured.min(subject_count).max(1))
    }
}

/// Split a comma-separated subject list, dropping blanks and
/// case-insensitive duplicates while keeping first-seen order.
pub fn parse_subjects(value: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-blank, trimmed value.
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn optional_int(&self, name: &str) -> Result<Option<i64>> {
        self.optional(name)
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    AppError::Configuration(format!("Invalid integer for {}: {}", name, v))
                })
            })
            .transpose()
    }

    fn int(&self, name: &str, default: i64) -> Result<i64> {
        Ok(self.optional_int(name)?.unwrap_or(default))
    }

    fn unsigned(&self, name: &str, default: u64) -> Result<u64> {
        match self.optional(name) {
            None => Ok(default),
            Some(v) => v.parse::<u64>().map_err(|_| {
                AppError::Configuration(format!("Invalid non-negative integer for {}: {}", name, v))
            }),
        }
    }

    fn float(&self, name: &str, default: f32) -> Result<f32> {
        match self.optional(name) {
            None => Ok(default),
            Some(v) => v
                .parse::<f32>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| {
                    AppError::Configuration(format!("Invalid float for {}: {}", name, v))
                }),
        }
    }

    fn flag(&self, name: &str, default: bool) -> Result<bool> {
        match self.optional(name) {
            None => Ok(default),
            Some(v) => match v.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(AppError::Configuration(format!(
                    "Invalid boolean for {}: {}",
                    name, v
                ))),
            },
        }
    }
}
