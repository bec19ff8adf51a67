//! HTTP capability injected into the engine
//!
//! The engine only sees [`Fetcher`] (blocking, used by worker threads) and
//! [`AsyncFetcher`] (used by cooperative tasks). Both return a [`Page`] for
//! any HTTP status; only transport problems become errors. Retry and
//! backoff live here so the scrape unit never has to care.

use crate::config::ScraperConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::{debug, warn};

/// A fetched response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
    /// `Location` header, only seen on unfollowed redirects
    pub location: Option<String>,
}

impl Page {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            location: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            location: None,
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            body: String::new(),
            location: Some(location.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 307 | 308)
    }
}

/// Blocking fetch capability shared by worker threads
pub trait Fetcher: Send + Sync {
    /// GET following redirects
    fn get(&self, url: &str) -> Result<Page, FetchError>;

    /// GET without following redirects
    fn get_unfollowed(&self, url: &str) -> Result<Page, FetchError>;
}

/// Non-blocking fetch capability multiplexed on one event loop
#[async_trait]
pub trait AsyncFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Page, FetchError>;

    async fn get_unfollowed(&self, url: &str) -> Result<Page, FetchError>;
}

// ============================================================================
// Retry policy
// ============================================================================

/// Statuses worth another attempt
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Exponential backoff retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.backoff(),
        }
    }

    /// Whether `outcome` of attempt number `attempt` (0-based) should be retried
    fn should_retry(&self, outcome: &Result<Page, FetchError>, attempt: u32) -> bool {
        let retryable = match outcome {
            Ok(page) => RETRYABLE_STATUSES.contains(&page.status),
            Err(_) => true,
        };
        retryable && attempt < self.max_retries
    }

    /// Delay before retry number `attempt + 1`
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

fn describe(outcome: &Result<Page, FetchError>) -> String {
    match outcome {
        Ok(page) => format!("HTTP {}", page.status),
        Err(e) => e.to_string(),
    }
}

// ============================================================================
// Async client
// ============================================================================

/// `reqwest` backed [`AsyncFetcher`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    unfollowed: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let build = |policy: Policy| {
            reqwest::Client::builder()
                .timeout(config.timeout())
                .user_agent(config.user_agent.clone())
                .redirect(policy)
                .build()
                .map_err(|e| FetchError::Build(e.to_string()))
        };

        Ok(Self {
            client: build(Policy::default())?,
            unfollowed: build(Policy::none())?,
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<Page, FetchError> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| FetchError::transport(url, e))?;

        Ok(Page {
            status,
            body,
            location,
        })
    }

    async fn fetch_with_retry(&self, client: &reqwest::Client, url: &str) -> Result<Page, FetchError> {
        let mut attempt = 0;
        loop {
            let outcome = Self::fetch_once(client, url).await;
            if !self.retry.should_retry(&outcome, attempt) {
                return outcome;
            }

            let delay = self.retry.delay(attempt);
            warn!(
                url = %url,
                attempt = attempt + 1,
                backoff_ms = delay.as_millis() as u64,
                reason = %describe(&outcome),
                "Request failed, retrying..."
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl AsyncFetcher for HttpClient {
    async fn get(&self, url: &str) -> Result<Page, FetchError> {
        debug!(url = %url, "GET");
        self.fetch_with_retry(&self.client, url).await
    }

    async fn get_unfollowed(&self, url: &str) -> Result<Page, FetchError> {
        debug!(url = %url, "GET (no redirects)");
        self.fetch_with_retry(&self.unfollowed, url).await
    }
}

// ============================================================================
// Blocking client
// ============================================================================

/// `reqwest::blocking` backed [`Fetcher`].
///
/// Must be created and used outside of any tokio runtime.
#[derive(Debug, Clone)]
pub struct BlockingHttpClient {
    client: reqwest::blocking::Client,
    unfollowed: reqwest::blocking::Client,
    retry: RetryPolicy,
}

impl BlockingHttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let build = |policy: Policy| {
            reqwest::blocking::Client::builder()
                .timeout(config.timeout())
                .user_agent(config.user_agent.clone())
                .redirect(policy)
                .build()
                .map_err(|e| FetchError::Build(e.to_string()))
        };

        Ok(Self {
            client: build(Policy::default())?,
            unfollowed: build(Policy::none())?,
            retry: RetryPolicy::from_config(config),
        })
    }

    fn fetch_once(client: &reqwest::blocking::Client, url: &str) -> Result<Page, FetchError> {
        let response = client.get(url).send().map_err(|e| FetchError::transport(url, e))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().map_err(|e| FetchError::transport(url, e))?;

        Ok(Page {
            status,
            body,
            location,
        })
    }

    fn fetch_with_retry(&self, client: &reqwest::blocking::Client, url: &str) -> Result<Page, FetchError> {
        let mut attempt = 0;
        loop {
            let outcome = Self::fetch_once(client, url);
            if !self.retry.should_retry(&outcome, attempt) {
                return outcome;
            }

            let delay = self.retry.delay(attempt);
            warn!(
                url = %url,
                attempt = attempt + 1,
                backoff_ms = delay.as_millis() as u64,
                reason = %describe(&outcome),
                "Request failed, retrying..."
            );
            std::thread::sleep(delay);
            attempt += 1;
        }
    }
}

impl Fetcher for BlockingHttpClient {
    fn get(&self, url: &str) -> Result<Page, FetchError> {
        debug!(url = %url, "GET");
        self.fetch_with_retry(&self.client, url)
    }

    fn get_unfollowed(&self, url: &str) -> Result<Page, FetchError> {
        debug!(url = %url, "GET (no redirects)");
        self.fetch_with_retry(&self.unfollowed, url)
    }
}
