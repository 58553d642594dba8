//! Grounded prompt assembly.

use crate::types::ScoredChunk;

/// Reply the model is told to give when the context does not hold the answer.
pub const INSUFFICIENT_ANSWER: &str = "I do not have enough information in the provided context.";

/// Retrieved chunk text packed under a character budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub text: String,
    /// How many of the ranked chunks made it into `text`
    pub included: usize,
}

/// Label ranked chunks `[1]`, `[2]`, ... and join them with blank lines while
/// the running length (each part plus its separator) stays within
/// `max_chars`. The first chunk is always included.
pub fn build_context(ranked: &[ScoredChunk], max_chars: usize) -> PromptContext {
    let mut parts: Vec<String> = Vec::new();
    let mut running = 0usize;

    for (idx, scored) in ranked.iter().enumerate() {
        let part = format!("[{}] {}", idx + 1, scored.chunk.text);
        let next = running + part.chars().count() + 2;
        if !parts.is_empty() && next > max_chars {
            break;
        }
        parts.push(part);
        running = next;
    }

    PromptContext {
        included: parts.len(),
        text: parts.join("\n\n"),
    }
}

pub fn build_prompt(question: &str, context: &PromptContext) -> String {
    format!(
        "You are a strict RAG assistant.\n\
         Answer ONLY from the CONTEXT below.\n\
         If the answer is not in the context, reply exactly:\n\
         {INSUFFICIENT_ANSWER}\n\n\
         CONTEXT:\n{}\n\n\
         QUESTION: {question}\n\
         ANSWER (brief and accurate):",
        context.text
    )
}
