use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use groundwork::chat::{load_snapshot, resolve_embed_model, ChatSession, ChatSettings};
use groundwork::cli::{output::Output, Cli, Commands};
use groundwork::pipeline::{ingest_artifact, ArtifactPaths, Pipeline};
use groundwork::scraper::{scrape_all, WikipediaClient};
use groundwork::utils::{config::Config, logging};
use groundwork::{EmbeddingStore, OllamaClient, TextChunker};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.paths.log_dir, cli.verbose) {
        output.error(&e.to_string());
        return ExitCode::FAILURE;
    }

    match run(&cli.command, &config, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &Commands, config: &Config, output: &Output) -> anyhow::Result<()> {
    match command {
        Commands::Scrape => {
            output.banner();
            scrape(config, output).await
        }
        Commands::Pipeline => {
            output.banner();
            pipeline(config, output).await
        }
        Commands::Ingest { embeddings } => {
            let path = embeddings
                .clone()
                .unwrap_or_else(|| config.paths.embedding_file());
            ingest(config, output, &path).await
        }
        Commands::Chat => chat(config).await,
        Commands::Build => {
            output.banner();
            output.step(1, 2, "Scraping source pages");
            scrape(config, output).await?;
            output.step(2, 2, "Running ingestion pipeline");
            pipeline(config, output).await
        }
    }
}

async fn scrape(config: &Config, output: &Output) -> anyhow::Result<()> {
    let subjects = &config.scraper.subjects;
    if subjects.is_empty() {
        bail!("Missing WIKI_SUBJECT (example: WIKI_SUBJECT=AI,Machine learning)");
    }
    let workers = config.scraper.workers_for(subjects.len())?;
    let client = Arc::new(WikipediaClient::new(
        config.scraper.api_url.as_str(),
        config.scraper.allow_insecure,
    )?);

    output.info(&format!(
        "Parallel scraping started for {} subjects (workers={})",
        subjects.len(),
        workers
    ));
    let outcomes = scrape_all(client, subjects, workers, &config.paths.scraped_dir).await?;
    output.scrape_summary(&outcomes);

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.is_success())
        .map(|o| o.subject.as_str())
        .collect();
    if !failed.is_empty() {
        bail!("Failed subjects: {}", failed.join(", "));
    }
    Ok(())
}

async fn pipeline(config: &Config, output: &Output) -> anyhow::Result<()> {
    let chunking = config.chunking.validate()?;
    let model = config.ollama.require_embed_model()?;
    let embedder = OllamaClient::new(
        config.ollama.base_url.as_str(),
        model,
        config.ollama.embed_timeout,
    )?;
    let store = EmbeddingStore::open(&config.paths.ingest_db_path)
        .await
        .context("Failed to open ingest DB")?;

    tracing::info!(
        model,
        chunk_size = chunking.chunk_size(),
        overlap = chunking.overlap(),
        "Starting pipeline"
    );

    let mut pipeline = Pipeline::new(TextChunker::new(chunking), &embedder, &store);
    if config.paths.write_artifacts {
        pipeline = pipeline.with_artifacts(ArtifactPaths {
            chunks: config.paths.chunk_file(),
            embeddings: config.paths.embedding_file(),
        });
    }

    let report = pipeline.run_dir(&config.paths.scraped_dir).await?;
    output.pipeline_report(&report, store.location());
    Ok(())
}

async fn ingest(config: &Config, output: &Output, path: &std::path::Path) -> anyhow::Result<()> {
    let store = EmbeddingStore::open(&config.paths.ingest_db_path)
        .await
        .context("Failed to open ingest DB")?;
    let ingested = ingest_artifact(&store, path).await?;

    output.success(&format!("Ingested {} rows into {}", ingested, store.location()));
    Ok(())
}

async fn chat(config: &Config) -> anyhow::Result<()> {
    let chat_model = config.ollama.require_chat_model()?;
    let records = load_snapshot(&config.paths.ingest_db_path).await?;
    let embed_model = resolve_embed_model(config.ollama.embed_model.as_deref(), &records)?;

    let embedder = OllamaClient::new(
        config.ollama.base_url.as_str(),
        embed_model.as_str(),
        config.ollama.embed_timeout,
    )?;
    let llm = OllamaClient::new(
        config.ollama.base_url.as_str(),
        chat_model,
        config.chat.request_timeout,
    )?;

    tracing::info!(
        chat_model,
        embed_model = %embed_model,
        records = records.len(),
        "Chatbot started"
    );

    let session = ChatSession::new(
        Box::new(embedder),
        Box::new(llm),
        records,
        ChatSettings::from_config(&config.chat, config.paths.error_log_file()),
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    session.run(stdin, &mut stdout).await?;
    Ok(())
}
