//! CLI module for groundwork
//!
//! Provides command-line parsing for the `groundwork` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// groundwork - build a retrieval corpus and ask questions against it
///
/// Scrapes source pages, chunks and embeds them with an Ollama model, stores
/// the vectors in SQLite and answers questions grounded in the stored chunks.
#[derive(Parser, Debug)]
#[command(
    name = "groundwork",
    version,
    about = "groundwork - retrieval corpus builder and grounded Q&A",
    long_about = "Builds a retrieval corpus from plain-text documents and answers questions\n\
                  grounded in it.\n\n\
                  Settings are read from the environment and from a .env file in the\n\
                  working directory (OLLAMA_EMBED_MODEL, OLLAMA_CHAT_MODEL, CHUNK_SIZE, ...).",
    after_help = "EXAMPLES:\n    \
                  groundwork scrape                         # Download WIKI_SUBJECT pages\n    \
                  groundwork pipeline                       # Chunk, embed and ingest\n    \
                  groundwork ingest --embeddings emb.jsonl  # Ingest an embedding artifact\n    \
                  groundwork chat                           # Interactive Q&A\n    \
                  groundwork build                          # scrape + pipeline"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Download Wikipedia pages for WIKI_SUBJECT into SCRAPED_DIR
    Scrape,

    /// Chunk, embed and ingest every document in SCRAPED_DIR
    Pipeline,

    /// Replace the store contents with records from an embedding artifact
    Ingest {
        /// Embedding JSONL file (defaults to the pipeline's artifact)
        #[arg(long, value_name = "FILE")]
        embeddings: Option<PathBuf>,
    },

    /// Ask questions against the ingested corpus
    Chat,

    /// Scrape, then run the pipeline
    Build,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ingest_with_global_flags() {
        let cli = Cli::try_parse_from([
            "groundwork",
            "ingest",
            "--embeddings",
            "out.jsonl",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert!(!cli.no_color);
        assert_eq!(
            cli.command,
            Commands::Ingest {
                embeddings: Some(PathBuf::from("out.jsonl"))
            }
        );
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["groundwork"]).is_err());
    }
}
