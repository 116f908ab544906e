//! Driver layer for browser rendering sessions.
//!
//! This crate exposes the WebDriver session wrapper used to render pages
//! (scripts executed, network settled) before their DOM is converted to text.
//!
//! - [`scout_browser::driver::ScoutDriver`]: WebDriver client wrapper
//! - [`scout_browser::page::ScoutPage`]: navigation and DOM snapshot helpers
//! - [`scout_browser::stealth`]: Chrome arguments and the optional evasion script
//! - [`scout_browser::fingerprint`]: user agent and viewport presented to sites
pub mod scout_browser;
