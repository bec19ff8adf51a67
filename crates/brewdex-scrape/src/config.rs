//! Scraper configuration
//!
//! Settings come from `BREWDEX_*` environment variables (optionally loaded
//! from a `.env` file by the binary) on top of built-in defaults.

use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// Site every record is scraped from.
pub const DEFAULT_BASE_URL: &str = "https://beermaverick.com";

/// Placeholder replaced by a hop's slug in the profile API template.
pub const SLUG_PLACEHOLDER: &str = "{slug}";

pub const DEFAULT_DATA_DIR: &str = "./.cache";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 100;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Site root, also used to absolutize relative links
    pub base_url: String,

    /// Sitemap listing every seed link
    pub sitemap_url: String,

    /// Hop profile lookup, must contain `{slug}`
    pub hop_api_url: String,

    /// Root of `extracted/`
    pub data_dir: PathBuf,

    pub user_agent: String,

    pub timeout_secs: u64,

    pub max_retries: u32,

    /// Base delay between retries, doubled per attempt
    pub backoff_ms: u64,

    /// Progress polling cadence
    pub poll_interval_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::for_base_url(DEFAULT_BASE_URL)
    }
}

impl ScraperConfig {
    /// Defaults with every site URL derived from `base_url`
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            base_url: base.to_string(),
            sitemap_url: format!("{base}/beerm-sitemap.xml"),
            hop_api_url: format!("{base}/api/hop/{SLUG_PLACEHOLDER}/"),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            user_agent: format!("brewdex/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_ms: DEFAULT_BACKOFF_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BREWDEX_BASE_URL`, `BREWDEX_SITEMAP_URL`, `BREWDEX_HOP_API_URL`
    /// - `BREWDEX_DATA_DIR`
    /// - `BREWDEX_USER_AGENT`, `BREWDEX_TIMEOUT_SECS`, `BREWDEX_MAX_RETRIES`,
    ///   `BREWDEX_BACKOFF_MS`, `BREWDEX_POLL_INTERVAL_MS`
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("BREWDEX_BASE_URL") {
            Ok(base) => Self::for_base_url(&base),
            Err(_) => Self::default(),
        };

        if let Ok(url) = std::env::var("BREWDEX_SITEMAP_URL") {
            config.sitemap_url = url;
        }
        if let Ok(url) = std::env::var("BREWDEX_HOP_API_URL") {
            config.hop_api_url = url;
        }
        if let Ok(dir) = std::env::var("BREWDEX_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(agent) = std::env::var("BREWDEX_USER_AGENT") {
            config.user_agent = agent;
        }

        config.timeout_secs = env_number("BREWDEX_TIMEOUT_SECS", config.timeout_secs)?;
        config.max_retries = env_number("BREWDEX_MAX_RETRIES", config.max_retries)?;
        config.backoff_ms = env_number("BREWDEX_BACKOFF_MS", config.backoff_ms)?;
        config.poll_interval_ms = env_number("BREWDEX_POLL_INTERVAL_MS", config.poll_interval_ms)?;

        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ScrapeError::config("base URL is empty"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| ScrapeError::config(format!("invalid base URL '{}': {e}", self.base_url)))?;
        if self.sitemap_url.trim().is_empty() {
            return Err(ScrapeError::config("sitemap URL is empty"));
        }
        if !self.hop_api_url.contains(SLUG_PLACEHOLDER) {
            return Err(ScrapeError::config(format!(
                "hop API URL '{}' has no {SLUG_PLACEHOLDER} placeholder",
                self.hop_api_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ScrapeError::config("timeout must be at least one second"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Directory holding scraped collections and the link cache
    pub fn extracted_dir(&self) -> PathBuf {
        self.data_dir.join("extracted")
    }

    pub fn links_path(&self) -> PathBuf {
        self.extracted_dir().join("links.json")
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.extracted_dir().join(format!("{collection}.json"))
    }

    pub fn failures_path(&self, collection: &str) -> PathBuf {
        self.extracted_dir().join(format!("{collection}.failures.json"))
    }
}

fn env_number<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ScrapeError::config(format!("{key} must be a number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
