//! DuckDuckGo keyword search.
//!
//! [`SearchEngine`] posts the query form to the HTML endpoint, scrapes the
//! result list and truncates it to the requested count. [`format_results`]
//! renders the tool payload.

mod client;
mod types;

pub use client::{
    DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, SearchEngine, SearchOptions, parse_results,
    resolve_result_link,
};
pub use types::{SearchResultEntry, format_results};
