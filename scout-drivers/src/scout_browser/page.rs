use crate::scout_browser::stealth::{webdriver_evasion_script, StealthProfile};
use anyhow::{Context, Result};
use fantoccini::Client;
use url::Url;

/// Page handle used to navigate and snapshot the rendered DOM.
pub struct ScoutPage {
    pub(crate) client: Client,
    pub(crate) stealth_profile: StealthProfile,
}

impl ScoutPage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(client: Client, stealth_profile: StealthProfile) -> Self {
        Self {
            client,
            stealth_profile,
        }
    }

    /// Navigate to `url`; waits for the driver's page-load strategy to complete.
    pub async fn goto(&self, url: &Url) -> Result<()> {
        self.client
            .goto(url.as_str())
            .await
            .with_context(|| format!("navigating to {url}"))?;

        if self.stealth_profile == StealthProfile::Stealth {
            self.client
                .execute(webdriver_evasion_script(), vec![])
                .await
                .context("applying webdriver evasion")?;
        }
        Ok(())
    }

    /// Return the full serialized DOM of the current document.
    pub async fn get_content(&self) -> Result<String> {
        self.client.source().await.context("reading page source")
    }

    /// Return `document.readyState` (`loading`, `interactive` or `complete`).
    pub async fn ready_state(&self) -> Result<String> {
        let value = self
            .client
            .execute("return document.readyState;", vec![])
            .await
            .context("reading document.readyState")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Return the current page URL.
    pub async fn get_url(&self) -> Result<Url> {
        self.client.current_url().await.context("reading current url")
    }
}
