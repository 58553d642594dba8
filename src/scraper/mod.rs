//! Document acquisition from Wikipedia.
//!
//! For every subject the client looks up the best matching article title
//! (`action=opensearch`) and then downloads its plain-text extract
//! (`action=query&prop=extracts`). Pages are written as `{title}.txt` into the
//! output directory, which is what the ingestion pipeline reads.
//!
//! Subjects are fetched concurrently with at most `max_workers` requests in
//! flight. A failing subject never cancels the others; every subject gets an
//! outcome, reported back in input order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::types::{AppError, Result};

const USER_AGENT: &str = concat!("groundwork/", env!("CARGO_PKG_VERSION"), " (corpus builder)");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// A downloaded article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtract {
    /// Title after redirects
    pub title: String,
    pub text: String,
}

/// Where a subject's article ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedPage {
    pub title: String,
    pub url: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct ScrapeOutcome {
    pub subject: String,
    pub result: Result<ScrapedPage>,
}

impl ScrapeOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Thin client over the MediaWiki action API.
#[derive(Clone)]
pub struct WikipediaClient {
    http: reqwest::Client,
    api_url: String,
}

impl WikipediaClient {
    pub fn new(api_url: impl Into<String>, allow_insecure: bool) -> Result<Self> {
        if allow_insecure {
            tracing::warn!("TLS certificate verification disabled for Wikipedia requests");
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(allow_insecure)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    /// Best matching article title for `subject`.
    pub async fn search_title(&self, subject: &str) -> Result<String> {
        let payload: Vec<serde_json::Value> = self
            .get(&[
                ("action", "opensearch"),
                ("search", subject),
                ("limit", "1"),
                ("namespace", "0"),
                ("format", "json"),
            ])
            .await?;

        payload
            .get(1)
            .and_then(|titles| titles.as_array())
            .and_then(|titles| titles.first())
            .and_then(|title| title.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::NotFound(format!("No Wikipedia article found for subject: {}", subject))
            })
    }

    /// Plain-text extract of the article `title`, following redirects.
    pub async fn fetch_extract(&self, title: &str) -> Result<PageExtract> {
        let payload: QueryResponse = self
            .get(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;

        let page = payload
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| {
                AppError::Data(format!("No page content returned for title: {}", title))
            })?;

        if page.missing {
            return Err(AppError::NotFound(format!(
                "Wikipedia page is missing for title: {}",
                title
            )));
        }

        let text = page.extract.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(AppError::Data(format!(
                "Wikipedia page has no extract text for title: {}",
                title
            )));
        }

        Ok(PageExtract {
            title: page.title.unwrap_or_else(|| title.to_string()),
            text,
        })
    }

    /// Public article URL on the wiki serving `api_url`.
    pub fn page_url(&self, title: &str) -> String {
        let slug = title.trim().replace(' ', "_");
        let base = self
            .api_url
            .strip_suffix("/w/api.php")
            .unwrap_or("https://en.wikipedia.org");

        reqwest::Url::parse(base)
            .ok()
            .and_then(|mut url| {
                url.path_segments_mut().ok()?.pop_if_empty().push("wiki").push(&slug);
                Some(url.to_string())
            })
            .unwrap_or_else(|| format!("{}/wiki/{}", base, slug))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let response = self
            .http
            .get(&self.api_url)
            .query(params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(network_error)?;

        response.json::<T>().await.map_err(network_error)
    }
}

fn network_error(e: reqwest::Error) -> AppError {
    AppError::Network(format!("Network/API error while contacting Wikipedia: {}", e))
}

/// File name for a page title: spaces and `\ / : * ? " < > |` become `_`.
pub fn safe_filename(title: &str) -> String {
    let safe: String = title
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();

    if safe.is_empty() {
        "wikipedia_page".to_string()
    } else {
        safe
    }
}

/// Remove every `*.txt` file directly under `dir`.
pub fn clear_text_files(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Fetch one subject and save it under `output_dir`.
pub async fn scrape_subject(
    client: &WikipediaClient,
    subject: &str,
    output_dir: &Path,
) -> Result<ScrapedPage> {
    let title = client.search_title(subject).await?;
    let page = client.fetch_extract(&title).await?;

    let path = output_dir.join(format!("{}.txt", safe_filename(&page.title)));
    tokio::fs::write(&path, &page.text).await?;

    Ok(ScrapedPage {
        url: client.page_url(&page.title),
        title: page.title,
        path,
    })
}

/// Scrape all `subjects` into a freshly cleared `output_dir`.
///
/// Returns one outcome per subject, in the order given.
pub async fn scrape_all(
    client: Arc<WikipediaClient>,
    subjects: &[String],
    max_workers: usize,
    output_dir: &Path,
) -> Result<Vec<ScrapeOutcome>> {
    std::fs::create_dir_all(output_dir)?;
    let removed = clear_text_files(output_dir)?;
    if removed > 0 {
        tracing::debug!(removed, dir = %output_dir.display(), "Cleared previous pages");
    }

    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut set = JoinSet::new();

    for (idx, subject) in subjects.iter().enumerate() {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let subject = subject.clone();
        let output_dir = output_dir.to_path_buf();

        set.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => scrape_subject(&client, &subject, &output_dir).await,
                Err(e) => Err(AppError::Internal(format!("Worker pool closed: {}", e))),
            };
            match &result {
                Ok(page) => tracing::info!(%subject, title = %page.title, "Scraped subject"),
                Err(e) => tracing::error!(%subject, "Scrape failed: {}", e),
            }
            (idx, result)
        });
    }

    let mut results: Vec<Option<Result<ScrapedPage>>> = subjects.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, result)) => results[idx] = Some(result),
            Err(e) => tracing::error!("Scrape task aborted: {}", e),
        }
    }

    Ok(subjects
        .iter()
        .zip(results)
        .map(|(subject, result)| ScrapeOutcome {
            subject: subject.clone(),
            result: result
                .unwrap_or_else(|| Err(AppError::Internal("Scrape task aborted".to_string()))),
        })
        .collect())
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryPages>,
}

#[derive(Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: Option<String>,
}
