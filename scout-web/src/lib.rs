//! Web search and page extraction tools.
//!
//! - DuckDuckGo keyword search (`search`)
//! - Browser-backed page fetching (`browser`)
//! - HTML to structured markdown-like text (`dom`, `markdown`, `locate`,
//!   `normalize`, `extract`)
//! - Process-wide rate limiting shared by both tools (`rate`)
//! - Tool argument validation and dispatch (`tools`)

pub mod browser;
pub mod dom;
pub mod extract;
pub mod locate;
pub mod markdown;
pub mod normalize;
pub mod rate;
pub mod search;
pub mod tools;

pub use browser::{FetchPolicy, PageFetcher, RenderSession, Renderer, SettlePolicy, WebDriverRenderer};
pub use extract::{EXTRACTION_FAILURE_TEXT, extract_structured_document};
pub use rate::{LongWindow, RateGovernor, RateLimits};
pub use search::{SearchEngine, SearchOptions};
pub use tools::{FetchArgs, SearchArgs, ToolOutput, WebTools};
