//! Wikipedia acquisition tests against a mocked MediaWiki API.

use std::sync::Arc;

use groundwork::scraper::{scrape_all, WikipediaClient};
use groundwork::types::AppError;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_subject(server: &MockServer, subject: &str, title: &str, extract: &str) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "opensearch"))
        .and(query_param("search", subject))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            subject,
            [title],
            [""],
            [format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))]
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "query"))
        .and(query_param("titles", title))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": true,
            "query": {"pages": [{"pageid": 1, "ns": 0, "title": title, "extract": extract}]}
        })))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> WikipediaClient {
    WikipediaClient::new(format!("{}/w/api.php", server.uri()), false).unwrap()
}

#[tokio::test]
async fn test_search_and_fetch() {
    let server = MockServer::start().await;
    mount_subject(&server, "rust lang", "Rust (programming language)", "  Rust is fast.  ").await;
    let client = client(&server);

    let title = client.search_title("rust lang").await.unwrap();
    let page = client.fetch_extract(&title).await.unwrap();

    assert_eq!(title, "Rust (programming language)");
    assert_eq!(page.text, "Rust is fast.");
    assert_eq!(
        client.page_url(&page.title),
        format!("{}/wiki/Rust_(programming_language)", server.uri())
    );
}

#[tokio::test]
async fn test_search_without_results_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "opensearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["zzzz", [], [], []])))
        .mount(&server)
        .await;

    let err = client(&server).search_title("zzzz").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert!(err.to_string().contains("zzzz"));
}

#[tokio::test]
async fn test_missing_page_and_empty_extract() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("titles", "Gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"pages": [{"ns": 0, "title": "Gone", "missing": true}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("titles", "Stub"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"pages": [{"title": "Stub", "extract": "   "}]}
        })))
        .mount(&server)
        .await;
    let client = client(&server);

    assert!(matches!(
        client.fetch_extract("Gone").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        client.fetch_extract("Stub").await,
        Err(AppError::Data(_))
    ));
}

#[tokio::test]
async fn test_http_error_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).search_title("anything").await.unwrap_err();

    assert!(matches!(err, AppError::Network(_)));
    assert!(err.to_string().contains("Network/API error while contacting Wikipedia"));
}

#[tokio::test]
async fn test_scrape_all_reports_every_subject_in_order() {
    let server = MockServer::start().await;
    mount_subject(&server, "AI", "Artificial intelligence", "AI text.").await;
    mount_subject(&server, "ML", "Machine learning", "ML text.").await;
    Mock::given(method("GET"))
        .and(query_param("action", "opensearch"))
        .and(query_param("search", "Nothing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Nothing", [], [], []])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("scraped_pages");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("stale.txt"), "old").unwrap();

    let subjects: Vec<String> = ["AI", "Nothing", "ML"].iter().map(|s| s.to_string()).collect();
    let outcomes = scrape_all(Arc::new(client(&server)), &subjects, 2, &out)
        .await
        .unwrap();

    let order: Vec<&str> = outcomes.iter().map(|o| o.subject.as_str()).collect();
    assert_eq!(order, vec!["AI", "Nothing", "ML"]);
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert!(outcomes[2].is_success());

    assert!(!out.join("stale.txt").exists());
    assert_eq!(
        std::fs::read_to_string(out.join("Artificial_intelligence.txt")).unwrap(),
        "AI text."
    );
    assert_eq!(
        std::fs::read_to_string(out.join("Machine_learning.txt")).unwrap(),
        "ML text."
    );
}
