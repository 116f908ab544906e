use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use scout_common::observability::{LogConfig, LogFormat};
use scout_config::{
    LogFormatSetting, LongWindow as LongWindowSetting, ScoutConfig, SettleMode, StealthSetting,
};
use scout_drivers::scout_browser::driver::DriverSettings;
use scout_drivers::scout_browser::fingerprint::UserAgentProfile;
use scout_drivers::scout_browser::stealth::StealthProfile;
use scout_web::rate::{LongWindow, RateGovernor, RateLimits};
use scout_web::{
    FetchPolicy, PageFetcher, SearchEngine, SearchOptions, SettlePolicy, WebDriverRenderer,
    WebTools,
};

pub fn log_config(cfg: &ScoutConfig, force_stderr: bool) -> LogConfig {
    LogConfig {
        app_name: "scout".to_string(),
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: force_stderr || cfg.logging.emit_stderr,
        format: match cfg.logging.format {
            LogFormatSetting::Text => LogFormat::Text,
            LogFormatSetting::Json => LogFormat::Json,
        },
        default_filter: cfg.logging.filter.clone(),
    }
}

pub fn rate_limits(cfg: &ScoutConfig) -> RateLimits {
    RateLimits {
        per_second: cfg.rate.per_second,
        per_month: cfg.rate.per_month,
        long_window: match cfg.rate.long_window {
            LongWindowSetting::Day => LongWindow::Day,
            LongWindowSetting::Month => LongWindow::Month,
        },
    }
}

pub fn search_options(cfg: &ScoutConfig) -> SearchOptions {
    SearchOptions {
        endpoint: cfg.search.endpoint.clone(),
        region: cfg.search.region.clone(),
        market: cfg.search.market.clone(),
        timeout: Duration::from_secs(cfg.search.timeout_secs),
        user_agent: cfg.search.user_agent.clone(),
    }
}

pub fn driver_settings(cfg: &ScoutConfig) -> DriverSettings {
    DriverSettings {
        webdriver_url: cfg.browser.webdriver_url.clone(),
        headless: cfg.browser.headless,
        stealth_profile: match cfg.browser.stealth {
            StealthSetting::Plain => StealthProfile::Plain,
            StealthSetting::Stealth => StealthProfile::Stealth,
        },
        user_agent: UserAgentProfile::with_user_agent(cfg.search.user_agent.clone()),
        page_load_timeout: Duration::from_secs(cfg.browser.navigation_timeout_secs),
    }
}

pub fn fetch_policy(cfg: &ScoutConfig) -> FetchPolicy {
    let settle = &cfg.browser.settle;
    FetchPolicy {
        navigation_timeout: Duration::from_secs(cfg.browser.navigation_timeout_secs),
        settle: match settle.mode {
            SettleMode::Fixed => SettlePolicy::Fixed(Duration::from_millis(settle.delay_ms)),
            SettleMode::ReadyState => SettlePolicy::ReadyState {
                poll: Duration::from_millis(settle.poll_ms),
                max: Duration::from_millis(settle.delay_ms),
            },
        },
        ..FetchPolicy::default()
    }
}

/// Build the tool set: one governor shared by both tools.
pub fn build_tools(cfg: &ScoutConfig) -> Result<WebTools> {
    let governor = Arc::new(RateGovernor::new(rate_limits(cfg)));
    let search = SearchEngine::new(search_options(cfg)).context("building search engine")?;
    let renderer = Arc::new(WebDriverRenderer::new(driver_settings(cfg)));
    let fetcher = PageFetcher::new(renderer, fetch_policy(cfg));

    tracing::debug!(
        per_second = cfg.rate.per_second,
        per_month = cfg.rate.per_month,
        webdriver = %cfg.browser.webdriver_url,
        "tools wired"
    );
    Ok(WebTools::new(governor, search, fetcher))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_mode_uses_delay_as_upper_bound() {
        let mut cfg = ScoutConfig::default();
        cfg.browser.settle.mode = SettleMode::ReadyState;
        cfg.browser.settle.delay_ms = 3_000;
        cfg.browser.settle.poll_ms = 100;

        assert_eq!(
            fetch_policy(&cfg).settle,
            SettlePolicy::ReadyState {
                poll: Duration::from_millis(100),
                max: Duration::from_millis(3_000),
            }
        );
    }

    #[test]
    fn defaults_map_onto_library_defaults() {
        let cfg = ScoutConfig::default();
        assert_eq!(rate_limits(&cfg), RateLimits::default());
        assert_eq!(fetch_policy(&cfg), FetchPolicy::default());
        assert!(build_tools(&cfg).is_ok());
    }

    #[test]
    fn page_load_bound_follows_navigation_timeout() {
        let mut cfg = ScoutConfig::default();
        cfg.browser.navigation_timeout_secs = 12;
        assert_eq!(driver_settings(&cfg).page_load_timeout, Duration::from_secs(12));
        assert_eq!(fetch_policy(&cfg).navigation_timeout, Duration::from_secs(12));
    }

    #[test]
    fn stderr_flag_overrides_file_setting() {
        let cfg = ScoutConfig::default();
        assert!(!log_config(&cfg, false).emit_stderr);
        assert!(log_config(&cfg, true).emit_stderr);
    }
}
