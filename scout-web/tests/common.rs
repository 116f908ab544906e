#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use scout_common::observability::{LogConfig, LogFormat};
use scout_web::{RenderSession, Renderer};
use url::Url;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "scout-tests".to_string(),
            log_dir: Some(std::env::temp_dir().join("scout-tests")),
            emit_stderr: true,
            format: if std::env::var("SCOUT_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
        };

        scout_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// What a [`FakeSession`] does when asked to navigate.
#[derive(Debug, Clone)]
pub enum Navigation {
    Loads(String),
    Fails(&'static str),
    Hangs,
}

/// Counters shared between a [`FakeRenderer`] and the sessions it opens.
#[derive(Debug, Default)]
pub struct SessionLog {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
}

impl SessionLog {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct FakeRenderer {
    pub navigation: Navigation,
    pub log: Arc<SessionLog>,
    pub fail_close: bool,
    /// Make `close` stall, as a WebDriver delete queued behind a navigation does.
    pub hang_close: bool,
}

impl FakeRenderer {
    pub fn new(navigation: Navigation) -> Self {
        Self {
            navigation,
            log: Arc::new(SessionLog::default()),
            fail_close: false,
            hang_close: false,
        }
    }

    pub fn serving(html: &str) -> Self {
        Self::new(Navigation::Loads(html.to_string()))
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>> {
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            navigation: self.navigation.clone(),
            log: Arc::clone(&self.log),
            fail_close: self.fail_close,
            hang_close: self.hang_close,
            loaded: None,
        }))
    }
}

pub struct FakeSession {
    navigation: Navigation,
    log: Arc<SessionLog>,
    fail_close: bool,
    hang_close: bool,
    loaded: Option<String>,
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        self.log.visited.lock().unwrap().push(url.to_string());
        match &self.navigation {
            Navigation::Loads(html) => {
                self.loaded = Some(html.clone());
                Ok(())
            }
            Navigation::Fails(reason) => Err(anyhow!("{reason}")),
            Navigation::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }

    async fn ready_state(&mut self) -> Result<String> {
        Ok("complete".to_string())
    }

    async fn content(&mut self) -> Result<String> {
        self.loaded.clone().ok_or_else(|| anyhow!("nothing loaded"))
    }

    async fn close(&mut self) -> Result<()> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        if self.hang_close {
            tokio::time::sleep(Duration::from_secs(300)).await;
        }
        if self.fail_close {
            return Err(anyhow!("browser already gone"));
        }
        Ok(())
    }
}
