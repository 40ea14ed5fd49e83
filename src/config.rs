// src/config.rs
// =============================================================================
// Configuration for a crawl.
//
// Two layers:
// - Settings: what lives in the YAML settings file (every field optional,
//   every field has a default). Loaded once in main.
// - CrawlConfig: the immutable, validated values one Engine runs with.
//   Built from Settings plus CLI overrides and handed to Engine::new.
//
// Example config/default.yaml:
//
//   crawler:
//     max_depth: 2
//     max_pages: 50
//     seeds: ["http://example.onion"]
//   proxy:
//     socks_port: 9150
//   output:
//     format: csv
// =============================================================================

use crate::error::CrawlerError;
use crate::output::OutputFormat;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file looked up when no --config flag is given
pub const DEFAULT_SETTINGS_PATH: &str = "config/default.yaml";

/// Immutable parameters of one crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    /// Pages deeper than this are never fetched (seeds are depth 0)
    pub max_depth: usize,
    /// Upper bound on the number of claimed (visited) URLs
    pub max_pages: usize,
    /// Number of concurrent workers
    pub concurrency: usize,
    pub request_timeout: Duration,
    /// Sleep after every fetch attempt, per worker
    pub request_delay: Duration,
    pub user_agent: String,
    /// Host suffix a discovered link must carry to be followed
    pub scope_suffix: String,
    pub use_proxy: bool,
    pub proxy_host: String,
    pub proxy_port: u16,
}

impl CrawlConfig {
    /// Rejects configurations no run could make progress with
    pub fn validate(&self) -> Result<(), CrawlerError> {
        if self.concurrency == 0 {
            return Err(CrawlerError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.scope_suffix.trim().is_empty() {
            return Err(CrawlerError::Config(
                "scope suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The proxy URL requests are routed through when `use_proxy` is set.
    ///
    /// `socks5h` makes the proxy resolve host names, which .onion needs.
    pub fn proxy_url(&self) -> String {
        format!("socks5h://{}:{}", self.proxy_host, self.proxy_port)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Settings::default().crawl_config()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub crawler: CrawlerSettings,
    pub proxy: ProxySettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    pub max_depth: usize,
    pub max_pages: usize,
    pub concurrency: usize,
    /// Seconds
    pub request_timeout: u64,
    /// Seconds, fractional values allowed
    #[serde(deserialize_with = "delay_seconds")]
    pub request_delay: f64,
    pub user_agent: String,
    pub scope_suffix: String,
    pub seeds: Vec<String>,
}

/// Rejects delays that do not fit a Duration (`.inf`, `1e30`, ...).
/// Negative values are kept and mean "no delay".
fn delay_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(seconds.max(0.0)).map_err(|_| {
        serde::de::Error::custom(format!("request_delay {} is out of range", seconds))
    })?;
    Ok(seconds)
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 100,
            concurrency: 4,
            request_timeout: 30,
            request_delay: 2.0,
            user_agent: "OmniCrawler/0.1".to_string(),
            scope_suffix: ".onion".to_string(),
            seeds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub enabled: bool,
    pub host: String,
    pub socks_port: u16,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            socks_port: 9050,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    pub directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            directory: PathBuf::from("data/outputs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An EnvFilter directive, e.g. "info" or "omni_crawler=debug"
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from DEFAULT_SETTINGS_PATH if it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file just means "use the built-in defaults".
    pub fn load(path: Option<&Path>) -> Result<Self, CrawlerError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_SETTINGS_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, CrawlerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CrawlerError::settings(path, e))?;
        Self::from_yaml(&content).map_err(|e| CrawlerError::settings(path, e))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// The CrawlConfig these settings describe, before any CLI override
    pub fn crawl_config(&self) -> CrawlConfig {
        let crawler = &self.crawler;
        CrawlConfig {
            max_depth: crawler.max_depth,
            max_pages: crawler.max_pages,
            concurrency: crawler.concurrency,
            request_timeout: Duration::from_secs(crawler.request_timeout),
            // Out-of-range values are refused at load time; one set in code
            // saturates instead of panicking
            request_delay: Duration::try_from_secs_f64(crawler.request_delay.max(0.0))
                .unwrap_or(Duration::MAX),
            user_agent: crawler.user_agent.clone(),
            scope_suffix: crawler.scope_suffix.clone(),
            use_proxy: self.proxy.enabled,
            proxy_host: self.proxy.host.clone(),
            proxy_port: self.proxy.socks_port,
        }
    }
}
