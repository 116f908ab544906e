//! Page fetching through a real browser.
//!
//! A [`Renderer`] hands out one [`RenderSession`] per fetch. [`PageFetcher`]
//! navigates with a hard bound, lets the page settle, snapshots the serialized
//! DOM and then runs extraction on the blocking pool. The session is closed on
//! every path, success or failure; close errors are logged and never replace
//! the fetch outcome. Closing is itself bounded by `close_grace`, since a
//! close can queue behind an abandoned navigation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use scout_common::{Result, ScoutError};
use scout_drivers::scout_browser::driver::{DriverSettings, ScoutDriver};
use scout_drivers::scout_browser::page::ScoutPage;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::extract::{EXTRACTION_FAILURE_TEXT, PageExtractor};

/// One browser tab/session. Exclusively owned by a single fetch.
#[async_trait]
pub trait RenderSession: Send {
    async fn navigate(&mut self, url: &Url) -> AnyResult<()>;
    /// `document.readyState` of the current document.
    async fn ready_state(&mut self) -> AnyResult<String>;
    /// Serialized DOM after scripts have run.
    async fn content(&mut self) -> AnyResult<String>;
    /// Release the session. Called exactly once per session.
    async fn close(&mut self) -> AnyResult<()>;
}

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open(&self) -> AnyResult<Box<dyn RenderSession>>;
}

/// Renderer backed by a WebDriver service (chromedriver, Selenium grid).
pub struct WebDriverRenderer {
    settings: DriverSettings,
}

impl WebDriverRenderer {
    pub fn new(settings: DriverSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn open(&self) -> AnyResult<Box<dyn RenderSession>> {
        let driver = ScoutDriver::connect(&self.settings).await?;
        Ok(Box::new(WebDriverSession {
            driver: Some(driver),
            page: None,
        }))
    }
}

struct WebDriverSession {
    driver: Option<ScoutDriver>,
    page: Option<ScoutPage>,
}

impl WebDriverSession {
    fn page(&self) -> AnyResult<&ScoutPage> {
        self.page.as_ref().context("no page loaded in this session")
    }
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn navigate(&mut self, url: &Url) -> AnyResult<()> {
        let driver = self.driver.as_mut().context("session already closed")?;
        let page = driver.goto(url).await?;
        if let Ok(landed) = page.get_url().await {
            if landed != *url {
                debug!(target: "browser", requested = %url, landed = %landed, "redirected");
            }
        }
        self.page = Some(page);
        Ok(())
    }

    async fn ready_state(&mut self) -> AnyResult<String> {
        self.page()?.ready_state().await
    }

    async fn content(&mut self) -> AnyResult<String> {
        self.page()?.get_content().await
    }

    async fn close(&mut self) -> AnyResult<()> {
        self.page = None;
        match self.driver.take() {
            Some(driver) => driver.close().await,
            None => Ok(()),
        }
    }
}

/// How long to wait after navigation before snapshotting the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Sleep for a fixed delay.
    Fixed(Duration),
    /// Poll `document.readyState` until `complete`, giving up after `max`.
    ReadyState { poll: Duration, max: Duration },
}

impl Default for SettlePolicy {
    fn default() -> Self {
        SettlePolicy::Fixed(Duration::from_secs(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Upper bound for opening the session, navigating, and reading the DOM.
    pub navigation_timeout: Duration,
    pub settle: SettlePolicy,
    /// How long a session close may take before it is abandoned.
    pub close_grace: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            settle: SettlePolicy::default(),
            close_grace: Duration::from_secs(5),
        }
    }
}

pub struct PageFetcher {
    renderer: Arc<dyn Renderer>,
    policy: FetchPolicy,
    extractor: Arc<PageExtractor>,
}

impl PageFetcher {
    pub fn new(renderer: Arc<dyn Renderer>, policy: FetchPolicy) -> Self {
        Self {
            renderer,
            policy,
            extractor: Arc::new(PageExtractor::default()),
        }
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Render `url` and return its structured-document text.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        let started = Instant::now();
        let html = self.capture(url).await?;
        let html_len = html.len();
        let text = self.extract(html).await;
        info!(
            target: "web.fetch",
            url = %url,
            html_len,
            text_len = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "page fetched"
        );
        Ok(text)
    }

    /// Acquire a session, load the page and return its serialized DOM.
    pub async fn capture(&self, url: &Url) -> Result<String> {
        let bound = self.policy.navigation_timeout;
        let mut session = match timeout(bound, self.renderer.open()).await {
            Ok(Ok(session)) => session,
            Ok(Err(err)) => return Err(ScoutError::navigation(err)),
            Err(_) => return Err(self.timed_out(url)),
        };

        let captured = self.load(session.as_mut(), url).await;
        match timeout(self.policy.close_grace, session.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(target: "web.fetch", url = %url, error = %format!("{err:#}"), "session close failed");
            }
            Err(_) => warn!(
                target: "web.fetch",
                url = %url,
                grace_ms = self.policy.close_grace.as_millis() as u64,
                "session close abandoned"
            ),
        }
        captured
    }

    async fn load(&self, session: &mut dyn RenderSession, url: &Url) -> Result<String> {
        let bound = self.policy.navigation_timeout;
        match timeout(bound, session.navigate(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(ScoutError::navigation(err)),
            Err(_) => return Err(self.timed_out(url)),
        }

        self.settle(session).await;

        match timeout(bound, session.content()).await {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(err)) => Err(ScoutError::navigation(err)),
            Err(_) => Err(self.timed_out(url)),
        }
    }

    async fn settle(&self, session: &mut dyn RenderSession) {
        match self.policy.settle {
            SettlePolicy::Fixed(delay) => {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            SettlePolicy::ReadyState { poll, max } => {
                let wait = async {
                    loop {
                        match session.ready_state().await {
                            Ok(state) if state == "complete" => break,
                            Ok(_) => {}
                            Err(err) => {
                                debug!(target: "web.fetch", error = %format!("{err:#}"), "readyState unavailable");
                                break;
                            }
                        }
                        sleep(poll).await;
                    }
                };
                if timeout(max, wait).await.is_err() {
                    debug!(target: "web.fetch", max_ms = max.as_millis() as u64, "settle bound reached");
                }
            }
        }
    }

    async fn extract(&self, html: String) -> String {
        let extractor = Arc::clone(&self.extractor);
        match tokio::task::spawn_blocking(move || extractor.extract(&html).render()).await {
            Ok(text) => text,
            Err(err) => {
                error!(
                    target: "web.extract",
                    error = %ScoutError::ExtractionFailure(err.to_string()),
                    "extraction aborted"
                );
                EXTRACTION_FAILURE_TEXT.to_string()
            }
        }
    }

    fn timed_out(&self, url: &Url) -> ScoutError {
        let timeout_secs = self.policy.navigation_timeout.as_secs();
        warn!(target: "web.fetch", url = %url, timeout_secs, "navigation timed out");
        ScoutError::RenderTimeout {
            url: url.to_string(),
            timeout_secs,
        }
    }
}
