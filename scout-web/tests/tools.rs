mod common;

use std::sync::Arc;
use std::time::Duration;

use common::FakeRenderer;
use scout_web::rate::{LongWindow, RateGovernor, RateLimits};
use scout_web::{FetchPolicy, PageFetcher, SearchEngine, SearchOptions, WebTools};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "<html><head><title>Hello</title></head><body><p>World</p></body></html>";

const RESULTS: &str = r#"<html><body>
  <div class="result">
    <h2 class="result__title">Only hit</h2>
    <a class="result__url" href="https://only.test/">only.test</a>
    <a class="result__snippet">The one result</a>
  </div>
</body></html>"#;

struct Harness {
    tools: WebTools,
    renderer: Arc<FakeRenderer>,
    _server: MockServer,
}

async fn harness(per_second: u32) -> Harness {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
        .mount(&server)
        .await;

    let search = SearchEngine::new(SearchOptions {
        endpoint: format!("{}/html", server.uri()),
        timeout: Duration::from_secs(5),
        ..SearchOptions::default()
    })
    .unwrap();
    let renderer = Arc::new(FakeRenderer::serving(PAGE));
    let fetcher = PageFetcher::new(
        renderer.clone(),
        FetchPolicy {
            navigation_timeout: Duration::from_secs(5),
            settle: scout_web::SettlePolicy::Fixed(Duration::ZERO),
            ..FetchPolicy::default()
        },
    );
    let governor = Arc::new(RateGovernor::new(RateLimits {
        per_second,
        per_month: 15_000,
        long_window: LongWindow::Day,
    }));

    Harness {
        tools: WebTools::new(governor, search, fetcher),
        renderer,
        _server: server,
    }
}

#[tokio::test]
async fn search_tool_returns_formatted_results() {
    common::init_test_tracing();
    let h = harness(10).await;

    let out = h
        .tools
        .call("duckduckgo_web_search", json!({ "query": "only", "count": 3 }))
        .await;

    assert!(!out.is_error, "{}", out.text);
    assert!(out.text.contains("result count: 1"));
    assert!(out.text.contains("### Only hit\n- snippet: The one result\n- page_url: https://only.test/"));
}

#[tokio::test]
async fn browse_tool_returns_structured_document() {
    let h = harness(10).await;

    let out = h
        .tools
        .call("web_browse", json!({ "url": "https://example.com/" }))
        .await;

    assert!(!out.is_error, "{}", out.text);
    assert_eq!(out.text, "# Hello\n\n## Content\nWorld");
}

#[tokio::test]
async fn invalid_arguments_are_reported_without_consuming_quota() {
    let h = harness(1).await;

    let missing = h.tools.call("duckduckgo_web_search", json!({ "count": 3 })).await;
    assert!(missing.is_error);
    assert!(missing.text.starts_with("Error: Invalid arguments:"));

    let bad_url = h.tools.call("web_browse", json!({ "url": "not a url" })).await;
    assert!(bad_url.is_error);
    assert!(bad_url.text.starts_with("Error: Invalid arguments:"));

    assert_eq!(h.tools.governor().usage().month, 0);
    assert_eq!(h.renderer.log.opened(), 0);
}

#[tokio::test]
async fn second_call_within_a_second_is_rate_limited() {
    let h = harness(1).await;

    let first = h
        .tools
        .call("web_browse", json!({ "url": "https://example.com/" }))
        .await;
    let second = h
        .tools
        .call("duckduckgo_web_search", json!({ "query": "rust" }))
        .await;

    assert!(!first.is_error);
    assert!(second.is_error);
    assert_eq!(
        second.text,
        "Error: Rate limit exceeded (limits: 1/second, 15000/month)"
    );
    assert_eq!(h.renderer.log.opened(), 1);
}

#[tokio::test]
async fn unknown_tool_is_an_error_payload() {
    let h = harness(10).await;
    let out = h.tools.call("web_teleport", json!({})).await;

    assert!(out.is_error);
    assert_eq!(out.text, "Unknown tool: web_teleport");
}
