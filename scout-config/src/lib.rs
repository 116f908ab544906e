//! Loader for Scout configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they were attached; `SCOUT__`-prefixed
//! environment variables are applied last, so the environment always wins
//! (`SCOUT__RATE__PER_SECOND=2` overrides `rate.per_second`). String values
//! may reference other variables as `${VAR}`; expansion is recursive up to a
//! fixed depth. Every field has a default, so an empty document is valid.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "SCOUT";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub version: Option<String>,
    pub rate: RateSettings,
    pub search: SearchSettings,
    pub browser: BrowserSettings,
    pub logging: LoggingSettings,
}

/// Caps for the process-wide rate governor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RateSettings {
    pub per_second: u32,
    pub per_month: u32,
    pub long_window: LongWindow,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            per_second: 1,
            per_month: 15_000,
            long_window: LongWindow::Day,
        }
    }
}

/// Calendar boundary at which the long-window counter starts over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongWindow {
    #[default]
    Day,
    Month,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub endpoint: String,
    /// Sent as `kl`.
    pub region: String,
    /// Sent as `bing_market`.
    pub market: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html".into(),
            region: "jp-jp".into(),
            market: "jp-jp".into(),
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth: StealthSetting,
    pub navigation_timeout_secs: u64,
    pub settle: SettleSettings,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            stealth: StealthSetting::Plain,
            navigation_timeout_secs: 30,
            settle: SettleSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthSetting {
    #[default]
    Plain,
    Stealth,
}

/// How long to wait after navigation before the DOM snapshot is taken.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SettleSettings {
    pub mode: SettleMode,
    /// Fixed delay, or the upper bound when polling `document.readyState`.
    pub delay_ms: u64,
    pub poll_ms: u64,
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            mode: SettleMode::Fixed,
            delay_ms: 2_000,
            poll_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    #[default]
    Fixed,
    ReadyState,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormatSetting,
    pub dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormatSetting::Text,
            dir: None,
            emit_stderr: false,
            filter: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    #[default]
    Text,
    Json,
}

impl ScoutConfig {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate.per_second == 0 || self.rate.per_month == 0 {
            return Err(ConfigError::Message(
                "rate.per_second and rate.per_month must be at least 1".into(),
            ));
        }
        if self.browser.navigation_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "browser.navigation_timeout_secs must be at least 1".into(),
            ));
        }
        if self.browser.settle.mode == SettleMode::ReadyState && self.browser.settle.poll_ms == 0
        {
            return Err(ConfigError::Message(
                "browser.settle.poll_ms must be at least 1 in ready_state mode".into(),
            ));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

enum Source {
    File { path: PathBuf, required: bool },
    Yaml(String),
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
#[derive(Default)]
pub struct ScoutConfigLoader {
    sources: Vec<Source>,
}

impl ScoutConfigLoader {
    /// Start with no files; `SCOUT__` env overrides are always applied on load.
    ///
    /// ```
    /// use scout_config::ScoutConfigLoader;
    ///
    /// let config = ScoutConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.rate.per_second, 1);
    /// assert_eq!(config.browser.navigation_timeout_secs, 30);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Attach a file that is skipped when absent, so env-only deployments work.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use scout_config::{ScoutConfigLoader, SettleMode};
    ///
    /// let cfg = ScoutConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// browser:
    ///   headless: false
    ///   settle:
    ///     mode: ready_state
    ///     delay_ms: 5000
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(!cfg.browser.headless);
    /// assert_eq!(cfg.browser.settle.mode, SettleMode::ReadyState);
    /// assert_eq!(cfg.browser.settle.delay_ms, 5000);
    /// assert_eq!(cfg.browser.settle.poll_ms, 250);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.sources.push(Source::Yaml(yaml.to_string()));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `${VAR}` placeholders are expanded before the typed structs are built,
    /// and the result is validated.
    pub fn load(self) -> Result<ScoutConfig, ConfigError> {
        let mut builder = Config::builder();
        for source in self.sources {
            builder = match source {
                Source::File { path, required } => {
                    builder.add_source(File::from(path).required(required))
                }
                Source::Yaml(yaml) => builder.add_source(File::from_str(&yaml, FileFormat::Yaml)),
            };
        }
        let cfg = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ScoutConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}
