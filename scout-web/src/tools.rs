//! The two tool endpoints exposed to a calling agent.
//!
//! Both tools validate their arguments, pass through the shared
//! [`RateGovernor`], and return a [`ToolOutput`]. Failures never escape as
//! `Err`: they become text payloads prefixed with `Error:` and flagged with
//! `is_error`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use scout_common::{Result, ScoutError};
use tracing::{info, warn};
use url::Url;

use crate::browser::PageFetcher;
use crate::rate::RateGovernor;
use crate::search::SearchEngine;

pub const SEARCH_TOOL: &str = "duckduckgo_web_search";
pub const BROWSE_TOOL: &str = "web_browse";

pub const MAX_QUERY_CHARS: usize = 400;
pub const DEFAULT_COUNT: i64 = 10;
pub const MAX_COUNT: i64 = 20;

fn default_count() -> f64 {
    DEFAULT_COUNT as f64
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    /// Any JSON number; fractions are truncated.
    #[serde(default = "default_count")]
    pub count: f64,
}

impl SearchArgs {
    /// Check the query bounds and clamp `count` into `1..=20`.
    pub fn validate(&self) -> Result<(String, usize)> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(ScoutError::InvalidArguments("query must not be empty".into()));
        }
        let chars = query.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(ScoutError::InvalidArguments(format!(
                "query is {chars} characters; the limit is {MAX_QUERY_CHARS}"
            )));
        }
        let count = (self.count.trunc() as i64).clamp(1, MAX_COUNT) as usize;
        Ok((query.to_string(), count))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchArgs {
    pub url: String,
}

impl FetchArgs {
    /// Parse the target, which must be an absolute http(s) URL.
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(self.url.trim())
            .map_err(|e| ScoutError::InvalidArguments(format!("url {:?}: {e}", self.url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ScoutError::InvalidArguments(format!(
                "unsupported url scheme {other:?}; expected http or https"
            ))),
        }
    }
}

/// Text payload handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    pub fn failure(message: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error: {message}"),
            is_error: true,
        }
    }

    fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::success(text),
            Err(err) => Self::failure(err),
        }
    }
}

/// Name, description and JSON-schema input of one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: SEARCH_TOOL,
            description: "Performs a web search using DuckDuckGo. Use this for general \
                          queries, news, articles and online content. Returns up to 20 \
                          results with title, snippet and page URL.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query (max 400 chars)",
                        "maxLength": MAX_QUERY_CHARS,
                    },
                    "count": {
                        "type": "number",
                        "description": "Number of results (1-20, default 10)",
                        "default": DEFAULT_COUNT,
                        "minimum": 1,
                        "maximum": MAX_COUNT,
                    },
                },
                "required": ["query"],
            }),
        },
        ToolDefinition {
            name: BROWSE_TOOL,
            description: "Fetches a web page in a real browser and returns its title, \
                          description and main content as markdown-like text.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Absolute http(s) URL of the page to fetch",
                    },
                },
                "required": ["url"],
            }),
        },
    ]
}

/// Search and browse tools sharing one rate governor.
pub struct WebTools {
    governor: Arc<RateGovernor>,
    search: SearchEngine,
    fetcher: PageFetcher,
}

impl WebTools {
    pub fn new(governor: Arc<RateGovernor>, search: SearchEngine, fetcher: PageFetcher) -> Self {
        Self {
            governor,
            search,
            fetcher,
        }
    }

    pub fn definitions() -> Vec<ToolDefinition> {
        definitions()
    }

    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    /// Dispatch a call by tool name with raw JSON arguments.
    pub async fn call(&self, name: &str, args: Value) -> ToolOutput {
        match name {
            SEARCH_TOOL => match serde_json::from_value::<SearchArgs>(args) {
                Ok(args) => self.search(&args).await,
                Err(err) => ToolOutput::failure(ScoutError::InvalidArguments(err.to_string())),
            },
            BROWSE_TOOL => match serde_json::from_value::<FetchArgs>(args) {
                Ok(args) => self.browse(&args).await,
                Err(err) => ToolOutput::failure(ScoutError::InvalidArguments(err.to_string())),
            },
            other => {
                warn!(target: "tools", tool = other, "unknown tool");
                ToolOutput {
                    text: format!("Unknown tool: {other}"),
                    is_error: true,
                }
            }
        }
    }

    pub async fn search(&self, args: &SearchArgs) -> ToolOutput {
        let output = ToolOutput::from_result(self.run_search(args).await);
        info!(target: "tools", tool = SEARCH_TOOL, is_error = output.is_error, "tool call finished");
        output
    }

    pub async fn browse(&self, args: &FetchArgs) -> ToolOutput {
        let output = ToolOutput::from_result(self.run_browse(args).await);
        info!(target: "tools", tool = BROWSE_TOOL, is_error = output.is_error, "tool call finished");
        output
    }

    async fn run_search(&self, args: &SearchArgs) -> Result<String> {
        let (query, count) = args.validate()?;
        self.governor.admit()?;
        self.search.search(&query, count).await
    }

    async fn run_browse(&self, args: &FetchArgs) -> Result<String> {
        let url = args.validate()?;
        self.governor.admit()?;
        self.fetcher.fetch(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(query: &str, count: f64) -> SearchArgs {
        SearchArgs {
            query: query.into(),
            count,
        }
    }

    #[test]
    fn count_is_clamped_into_range() {
        assert_eq!(search_args("q", 0.0).validate().unwrap().1, 1);
        assert_eq!(search_args("q", 7.0).validate().unwrap().1, 7);
        assert_eq!(search_args("q", 500.0).validate().unwrap().1, 20);
        assert_eq!(search_args("q", -3.0).validate().unwrap().1, 1);
    }

    #[test]
    fn fractional_counts_are_accepted_and_truncated() {
        let args: SearchArgs =
            serde_json::from_value(json!({ "query": "rust", "count": 5.0 })).unwrap();
        assert_eq!(args.validate().unwrap(), ("rust".to_string(), 5));

        let args: SearchArgs =
            serde_json::from_value(json!({ "query": "rust", "count": 7.9 })).unwrap();
        assert_eq!(args.validate().unwrap().1, 7);

        let args: SearchArgs =
            serde_json::from_value(json!({ "query": "rust", "count": 0.5 })).unwrap();
        assert_eq!(args.validate().unwrap().1, 1);
    }

    #[test]
    fn non_numeric_count_is_rejected() {
        assert!(serde_json::from_value::<SearchArgs>(json!({ "query": "q", "count": "five" })).is_err());
    }

    #[test]
    fn missing_count_defaults_to_ten() {
        let args: SearchArgs = serde_json::from_value(json!({ "query": "rust" })).unwrap();
        assert_eq!(args.validate().unwrap(), ("rust".to_string(), 10));
    }

    #[test]
    fn empty_or_overlong_queries_are_rejected() {
        assert!(matches!(
            search_args("   ", 5.0).validate(),
            Err(ScoutError::InvalidArguments(_))
        ));
        let long = "q".repeat(MAX_QUERY_CHARS + 1);
        assert!(search_args(&long, 5.0).validate().is_err());
        let at_limit = "q".repeat(MAX_QUERY_CHARS);
        assert!(search_args(&at_limit, 5.0).validate().is_ok());
    }

    #[test]
    fn fetch_args_require_http_urls() {
        let ok = FetchArgs { url: "https://example.com/a".into() };
        assert_eq!(ok.validate().unwrap().as_str(), "https://example.com/a");

        for bad in ["example.com", "ftp://example.com/", "file:///etc/passwd", ""] {
            let args = FetchArgs { url: bad.into() };
            assert!(
                matches!(args.validate(), Err(ScoutError::InvalidArguments(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn failures_are_prefixed() {
        let out = ToolOutput::failure(ScoutError::RateLimitExceeded {
            per_second: 1,
            per_month: 15_000,
        });
        assert!(out.is_error);
        assert_eq!(
            out.text,
            "Error: Rate limit exceeded (limits: 1/second, 15000/month)"
        );
    }

    #[test]
    fn definitions_name_both_tools() {
        let names: Vec<_> = definitions().iter().map(|d| d.name).collect();
        assert_eq!(names, vec![SEARCH_TOOL, BROWSE_TOOL]);
        assert_eq!(definitions()[0].input_schema["required"], json!(["query"]));
    }
}
