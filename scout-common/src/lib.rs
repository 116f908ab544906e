//! Common types and utilities shared across Scout crates.
//!
//! This crate defines the shared error type and observability helpers used
//! throughout the Scout workspace. It is intentionally lightweight so that
//! every crate can depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`ScoutError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use scout_common::ScoutError;
//!
//! let err = ScoutError::RateLimitExceeded { per_second: 1, per_month: 15000 };
//! assert_eq!(
//!     err.to_string(),
//!     "Rate limit exceeded (limits: 1/second, 15000/month)"
//! );
//! ```

pub mod observability;

/// Error kinds surfaced by the search and page-fetch operations.
#[derive(thiserror::Error, Debug)]
pub enum ScoutError {
    /// Admission denied by the rate governor.
    #[error("Rate limit exceeded (limits: {per_second}/second, {per_month}/month)")]
    RateLimitExceeded { per_second: u32, per_month: u32 },

    /// Tool input was missing a required field, had the wrong type, or was out of bounds.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The search backend answered with a non-success status or could not be reached.
    /// `status` is 0 for transport failures.
    #[error("DuckDuckGo API error: {status}\n{body}")]
    SearchBackend { status: u16, body: String },

    /// The rendering engine did not finish loading the page within the bound.
    #[error("Failed to fetch webpage: navigation to {url} timed out after {timeout_secs}s")]
    RenderTimeout { url: String, timeout_secs: u64 },

    /// The rendering session could not be acquired or the page could not be loaded.
    #[error("Failed to fetch webpage: {0}")]
    NavigationFailure(String),

    /// Walking or normalising the DOM failed unexpectedly.
    #[error("Failed to process webpage content: {0}")]
    ExtractionFailure(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScoutError {
    /// Map a driver-layer failure into a navigation failure, keeping the full cause chain.
    pub fn navigation(err: anyhow::Error) -> Self {
        Self::NavigationFailure(format!("{err:#}"))
    }
}

/// Convenient alias for results that use [`ScoutError`].
pub type Result<T> = std::result::Result<T, ScoutError>;
