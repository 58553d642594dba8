//! Interactive question answering over the ingested corpus.
//!
//! Each turn embeds the question, ranks every stored chunk against it and
//! passes the best ones to the chat model, but only when the top score clears
//! the similarity floor. Otherwise the turn answers with
//! [`INSUFFICIENT_ANSWER`] without calling the model at all.
//!
//! Failures inside a turn are reported to the user and logged; the session
//! keeps going until `exit`, `quit` or end of input.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::db::EmbeddingStore;
use crate::llm::{Embedder, LLMClient};
use crate::rag::prompt::{build_context, build_prompt, INSUFFICIENT_ANSWER};
use crate::rag::search::{retrieve, Evidence, EvidenceGate};
use crate::types::{AppError, EmbeddingRecord, Result};
use crate::utils::config::ChatConfig;

/// Retrieval and prompt limits for a session.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub top_k: usize,
    pub min_similarity: f32,
    pub max_context_chars: usize,
    /// Shown to the user when a turn fails unexpectedly
    pub error_log: PathBuf,
}

impl ChatSettings {
    pub fn from_config(config: &ChatConfig, error_log: impl Into<PathBuf>) -> Self {
        Self {
            top_k: config.top_k,
            min_similarity: config.min_similarity,
            max_context_chars: config.max_context_chars,
            error_log: error_log.into(),
        }
    }
}

/// Result of a single question.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answered {
        answer: String,
        /// Ids of every retrieved chunk, best first
        sources: Vec<String>,
        top_score: f32,
    },
    Insufficient {
        top_score: Option<f32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Blank,
    Exit,
    Question(String),
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Blank
    } else if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        Input::Exit
    } else {
        Input::Question(trimmed.to_string())
    }
}

pub struct ChatSession {
    embedder: Box<dyn Embedder>,
    llm: Box<dyn LLMClient>,
    records: Vec<EmbeddingRecord>,
    gate: EvidenceGate,
    settings: ChatSettings,
}

impl ChatSession {
    pub fn new(
        embedder: Box<dyn Embedder>,
        llm: Box<dyn LLMClient>,
        records: Vec<EmbeddingRecord>,
        settings: ChatSettings,
    ) -> Self {
        let records = same_model(records, embedder.model_name());
        Self {
            embedder,
            llm,
            records,
            gate: EvidenceGate::new(settings.min_similarity),
            settings,
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Answer one question.
    pub async fn answer(&self, question: &str) -> Result<TurnOutcome> {
        if self.records.is_empty() {
            return Ok(TurnOutcome::Insufficient { top_score: None });
        }

        let query = self.embedder.embed(question).await?;
        let ranked = retrieve(&query, &self.records, self.settings.top_k);

        match self.gate.assess(&ranked) {
            Evidence::Insufficient { top_score } => {
                tracing::debug!(?top_score, "Evidence below similarity floor");
                Ok(TurnOutcome::Insufficient { top_score })
            }
            Evidence::Sufficient { top_score } => {
                let context = build_context(&ranked, self.settings.max_context_chars);
                tracing::debug!(
                    retrieved = ranked.len(),
                    included = context.included,
                    "Built prompt context"
                );
                let answer = self.llm.generate(&build_prompt(question, &context)).await?;

                Ok(TurnOutcome::Answered {
                    answer,
                    sources: ranked.into_iter().map(|s| s.chunk.chunk_id).collect(),
                    top_score,
                })
            }
        }
    }

    /// Read questions line by line from `input` until `exit`/`quit` or EOF.
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(output, "Type 'exit' to quit.")?;
        let mut lines = input.lines();

        loop {
            write!(output, "\nYou: ")?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(output)?;
                break;
            };

            match parse_input(&line) {
                Input::Blank => continue,
                Input::Exit => break,
                Input::Question(question) => {
                    let reply = match self.answer(&question).await {
                        Ok(outcome) => render_outcome(&outcome, self.settings.min_similarity),
                        Err(e) => {
                            tracing::error!(error = %e, "Chat turn failed");
                            vec![turn_error_message(&e, &self.settings.error_log)]
                        }
                    };
                    for line in reply {
                        writeln!(output, "{}", line)?;
                    }
                }
            }
        }

        writeln!(output, "Bye.")?;
        Ok(())
    }
}

/// Keep only records embedded with `model`; vectors from other models are
/// not comparable with the question.
fn same_model(records: Vec<EmbeddingRecord>, model: &str) -> Vec<EmbeddingRecord> {
    let total = records.len();
    let kept: Vec<EmbeddingRecord> = records.into_iter().filter(|r| r.model == model).collect();

    let dropped = total - kept.len();
    if dropped > 0 {
        tracing::warn!(
            dropped,
            kept = kept.len(),
            model,
            "Ignoring records embedded with a different model"
        );
    }
    kept
}

/// Lines printed for a completed turn.
pub fn render_outcome(outcome: &TurnOutcome, min_similarity: f32) -> Vec<String> {
    match outcome {
        TurnOutcome::Answered {
            answer,
            sources,
            top_score,
        } => vec![
            format!("Assistant: {}", answer),
            format!("Sources: {}", sources.join(", ")),
            format!("Top similarity: {:.4}", top_score),
        ],
        TurnOutcome::Insufficient { top_score } => {
            let mut lines = vec![format!("Assistant: {}", INSUFFICIENT_ANSWER)];
            if let Some(score) = top_score {
                lines.push(format!(
                    "Top similarity: {:.4} (below {:.4})",
                    score, min_similarity
                ));
            }
            lines
        }
    }
}

/// User-facing message for a failed turn.
pub fn turn_error_message(error: &AppError, error_log: &Path) -> String {
    match error {
        AppError::Timeout(_) => {
            "Assistant: Request timed out. Try again or increase CHAT_REQUEST_TIMEOUT.".to_string()
        }
        e if e.is_transport() => {
            "Assistant: Ollama request failed. Check Ollama is running.".to_string()
        }
        _ => format!(
            "Assistant: An unexpected error occurred. Check {}.",
            error_log.display()
        ),
    }
}

/// Load the current store snapshot for a session.
///
/// A missing database or an empty table is not fatal: it is logged and an
/// empty snapshot is returned, so every question reports insufficient
/// information. Other failures (corrupt vectors, I/O) propagate.
pub async fn load_snapshot(db_path: &Path) -> Result<Vec<EmbeddingRecord>> {
    let loaded = match EmbeddingStore::open_existing(db_path).await {
        Ok(store) => store.read_all().await,
        Err(e) => Err(e),
    };

    match loaded {
        Ok(records) => {
            tracing::info!(
                records = records.len(),
                db = %db_path.display(),
                "Loaded embedded chunks"
            );
            Ok(records)
        }
        Err(e) if e.is_missing_store() => {
            tracing::error!("{}; run the pipeline first", e);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Pick the model used to embed questions.
///
/// The configured model wins; otherwise the model recorded in the store is
/// used. With an empty snapshot no question is ever embedded, so a missing
/// model is only an error when records exist.
pub fn resolve_embed_model(
    configured: Option<&str>,
    records: &[EmbeddingRecord],
) -> Result<String> {
    let stored = records
        .first()
        .map(|r| r.model.trim())
        .filter(|m| !m.is_empty());

    match (configured, stored) {
        (Some(configured), Some(stored)) => {
            if configured != stored {
                tracing::warn!(
                    configured,
                    stored,
                    "Configured embedding model differs from the one in the store"
                );
            }
            Ok(configured.to_string())
        }
        (Some(configured), None) => Ok(configured.to_string()),
        (None, Some(stored)) => Ok(stored.to_string()),
        (None, None) if records.is_empty() => Ok(String::new()),
        (None, None) => Err(AppError::Configuration(
            "Embedding model is missing. Set OLLAMA_EMBED_MODEL.".to_string(),
        )),
    }
}
