//! Error types for the scraping engine

use brewdex_common::BrewdexError;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Top-level engine error.
///
/// Per-item problems never surface here: they are recorded on the entity and
/// routed to the failure channel. These variants abort a whole run.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Store(#[from] BrewdexError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Worker for shard {shard} panicked")]
    WorkerPanicked { shard: usize },

    #[error("Sitemap error: {0}")]
    Sitemap(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a sitemap error
    pub fn sitemap(msg: impl Into<String>) -> Self {
        Self::Sitemap(msg.into())
    }
}

/// Errors raised by the injected HTTP capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

impl FetchError {
    /// Create a transport error for `url`
    pub fn transport(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }
}

/// Errors that abort extraction of a single document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Invalid selector '{css}': {message}")]
    Selector { css: String, message: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Extractor panicked: {0}")]
    Panicked(String),
}
