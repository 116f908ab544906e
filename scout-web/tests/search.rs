mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use scout_common::ScoutError;
use scout_web::{SearchEngine, SearchOptions};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn results_page(n: usize) -> String {
    let mut html = String::from("<html><body><div class=\"results\">");
    for i in 1..=n {
        html.push_str(&format!(
            r##"<div class="result results_links web-result">
                 <h2 class="result__title"><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fsite{i}.test%2Fpage&amp;rut=x{i}">Result {i}</a></h2>
                 <a class="result__url" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fsite{i}.test%2Fpage&amp;rut=x{i}">site{i}.test/page</a>
                 <a class="result__snippet" href="#">Snippet number {i}</a>
               </div>"##
        ));
    }
    html.push_str("</div></body></html>");
    html
}

async fn engine_for(server: &MockServer) -> SearchEngine {
    SearchEngine::new(SearchOptions {
        endpoint: format!("{}/html", server.uri()),
        timeout: Duration::from_secs(5),
        user_agent: "scout-test/1.0".to_string(),
        ..SearchOptions::default()
    })
    .unwrap()
}

#[tokio::test]
async fn returns_requested_count_in_page_order() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/html"))
        .and(header("user-agent", "scout-test/1.0"))
        .and(body_string_contains("q=rust+async"))
        .and(body_string_contains("kl=jp-jp"))
        .and(body_string_contains("bing_market=jp-jp"))
        .and(body_string_contains("no_redirect=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(8)))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let text = engine.search("rust async", 5).await.unwrap();

    assert!(text.starts_with("# DuckDuckGo search results\nquery: rust async\nresult count: 5\n\n-----\n\n"));
    let titles: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("### "))
        .collect();
    assert_eq!(titles, vec!["Result 1", "Result 2", "Result 3", "Result 4", "Result 5"]);
    assert!(text.contains("### Result 1\n- snippet: Snippet number 1\n- page_url: https://site1.test/page\n\n### Result 2"));
    assert!(!text.contains("Result 6"));
}

#[tokio::test]
async fn fewer_results_than_requested_are_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(3)))
        .mount(&server)
        .await;

    let entries = engine_for(&server)
        .await
        .search_entries("anything", 20)
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].url, "https://site3.test/page");
}

#[tokio::test]
async fn non_success_status_surfaces_as_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = engine_for(&server).await.search("rust", 5).await.unwrap_err();
    match &err {
        ScoutError::SearchBackend { status, body } => {
            assert_eq!(*status, 500);
            assert!(body.contains("upstream exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("DuckDuckGo API error: 500\n"));
}

#[tokio::test]
async fn unreachable_backend_reports_status_zero() {
    let server = MockServer::start().await;
    let endpoint = format!("{}/html", server.uri());
    drop(server);

    let engine = SearchEngine::new(SearchOptions {
        endpoint,
        timeout: Duration::from_secs(2),
        ..SearchOptions::default()
    })
    .unwrap();
    let err = engine.search("rust", 5).await.unwrap_err();

    assert!(matches!(err, ScoutError::SearchBackend { status: 0, .. }));
}
