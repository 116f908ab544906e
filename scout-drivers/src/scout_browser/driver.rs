use crate::scout_browser::{
    fingerprint::UserAgentProfile,
    page::ScoutPage,
    stealth::{build_chrome_arguments, StealthProfile},
};
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;
use webdriver::capabilities::Capabilities;

/// Where and how to start a rendering session.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// WebDriver endpoint, e.g. `http://localhost:9515` for a local chromedriver.
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth_profile: StealthProfile,
    pub user_agent: UserAgentProfile,
    /// Browser-side page load bound. Keeps an abandoned navigation from
    /// holding the session past the caller's own timeout.
    pub page_load_timeout: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            stealth_profile: StealthProfile::Plain,
            user_agent: UserAgentProfile::default(),
            page_load_timeout: Duration::from_secs(30),
        }
    }
}

impl DriverSettings {
    /// Capabilities sent when the session is created.
    pub fn capabilities(&self) -> Capabilities {
        let args = build_chrome_arguments(self.stealth_profile, &self.user_agent, self.headless);
        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps.insert("pageLoadStrategy".to_string(), json!("normal"));
        caps.insert(
            "timeouts".to_string(),
            json!({ "pageLoad": self.page_load_timeout.as_millis() as u64 }),
        );
        caps
    }
}

/// Thin wrapper around a `fantoccini` WebDriver client; one instance is one
/// browser session.
pub struct ScoutDriver {
    client: Client,
    stealth_profile: StealthProfile,
}

impl ScoutDriver {
    /// Create a new session on the WebDriver service named in `settings`.
    pub async fn connect(settings: &DriverSettings) -> Result<Self> {
        let client = ClientBuilder::native()
            .capabilities(settings.capabilities())
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| format!("connecting to webdriver at {}", settings.webdriver_url))?;
        debug!(target: "browser", webdriver = %settings.webdriver_url, "session started");

        Ok(Self {
            client,
            stealth_profile: settings.stealth_profile,
        })
    }

    /// Navigate to `url` and return a [`ScoutPage`] bound to this session.
    pub async fn goto(&mut self, url: &Url) -> Result<ScoutPage> {
        let page = ScoutPage::new(self.client.clone(), self.stealth_profile);
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await.context("closing webdriver session")?;
        debug!(target: "browser", "session closed");
        Ok(())
    }
}
