use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scout_common::{Result, ScoutError};
use scout_http::{HttpClient, HttpError, RequestOpts};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::types::{SearchResultEntry, format_results};
use crate::locate::compile;

pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Request shape for the DuckDuckGo HTML endpoint.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub endpoint: String,
    /// `kl` form field.
    pub region: String,
    /// `bing_market` form field.
    pub market: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: "jp-jp".to_string(),
            market: "jp-jp".to_string(),
            timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

struct ResultSelectors {
    container: Selector,
    title: Selector,
    link: Selector,
    snippet: Selector,
}

impl ResultSelectors {
    fn compile() -> Option<Self> {
        Some(Self {
            container: compile(".result")?,
            title: compile(".result__title")?,
            link: compile(".result__url")?,
            snippet: compile(".result__snippet")?,
        })
    }
}

/// Keyword search against DuckDuckGo. One request per call, no retries.
pub struct SearchEngine {
    http: HttpClient,
    options: SearchOptions,
    selectors: Option<ResultSelectors>,
}

impl SearchEngine {
    pub fn new(options: SearchOptions) -> Result<Self> {
        let http = HttpClient::new(&options.endpoint)
            .map_err(|e| ScoutError::Config(format!("search endpoint: {e}")))?
            .with_timeout(options.timeout);
        Ok(Self {
            http,
            options,
            selectors: ResultSelectors::compile(),
        })
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Search and return at most `count` entries rendered as text.
    pub async fn search(&self, query: &str, count: usize) -> Result<String> {
        let entries = self.search_entries(query, count).await?;
        Ok(format_results(query, &entries))
    }

    pub async fn search_entries(&self, query: &str, count: usize) -> Result<Vec<SearchResultEntry>> {
        let form = [
            ("q", query),
            ("s", "0"),
            ("o", "json"),
            ("api", "d.js"),
            ("vqd", ""),
            ("kl", self.options.region.as_str()),
            ("bing_market", self.options.market.as_str()),
            ("format", "json"),
            ("no_html", "1"),
            ("no_redirect", "1"),
            ("skip_disambig", "1"),
        ];
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&self.options.user_agent) {
            Ok(value) => {
                headers.insert(USER_AGENT, value);
            }
            Err(err) => warn!(target: "web.search", error = %err, "user agent rejected"),
        }
        let opts = RequestOpts {
            timeout: Some(self.options.timeout),
            headers: Some(headers),
            ..Default::default()
        };

        let started = Instant::now();
        let html = self
            .http
            .post_form_text("", &form, opts)
            .await
            .map_err(backend_error)?;
        let entries = self.parse(&html, count);

        info!(
            target: "web.search",
            query,
            requested = count,
            returned = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search completed"
        );
        Ok(entries)
    }

    fn parse(&self, html: &str, count: usize) -> Vec<SearchResultEntry> {
        match &self.selectors {
            Some(selectors) => parse_with(selectors, html, count),
            None => Vec::new(),
        }
    }
}

/// Parse a DuckDuckGo HTML results page, keeping at most `count` entries.
pub fn parse_results(html: &str, count: usize) -> Vec<SearchResultEntry> {
    ResultSelectors::compile()
        .map(|selectors| parse_with(&selectors, html, count))
        .unwrap_or_default()
}

fn parse_with(selectors: &ResultSelectors, html: &str, count: usize) -> Vec<SearchResultEntry> {
    let document = Html::parse_document(html);
    let entries: Vec<SearchResultEntry> = document
        .select(&selectors.container)
        .filter_map(|result| {
            let title = first_text(result, &selectors.title);
            let url = result
                .select(&selectors.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(resolve_result_link)
                .unwrap_or_default();
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(SearchResultEntry {
                title,
                url,
                snippet: first_text(result, &selectors.snippet),
            })
        })
        .take(count)
        .collect();
    debug!(target: "web.search", parsed = entries.len(), "results parsed");
    entries
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|el| {
            el.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Unwrap `//duckduckgo.com/l/?uddg=<target>` redirect links; other hrefs pass through.
pub fn resolve_result_link(href: &str) -> String {
    if href.contains("uddg=") {
        let absolute = if href.starts_with("//") {
            format!("https:{href}")
        } else if href.starts_with('/') {
            format!("https://duckduckgo.com{href}")
        } else {
            href.to_string()
        };
        if let Ok(parsed) = Url::parse(&absolute) {
            if let Some((_, target)) = parsed.query_pairs().find(|(key, _)| key == "uddg") {
                return target.into_owned();
            }
        }
    }
    href.to_string()
}

fn backend_error(err: HttpError) -> ScoutError {
    match err {
        HttpError::Api { status, body, .. } => ScoutError::SearchBackend {
            status: status.as_u16(),
            body,
        },
        other => ScoutError::SearchBackend {
            status: 0,
            body: other.to_string(),
        },
    }
}
