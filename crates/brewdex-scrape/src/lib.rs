//! Brewdex Scrape Library
//!
//! Concurrent extraction of brewing-ingredient records from BeerMaverick.
//!
//! # Modules
//!
//! - **model**: Hop and Yeast records, range values
//! - **extract**: per-section page parsers and the scrape targets
//! - **scrape**: partitioning, scrape units, dispatcher and progress
//! - **store** / **resolve**: resume cache and cross-reference resolution
//! - **pipeline**: one complete collection run
//!
//! # Example
//!
//! ```no_run
//! use brewdex_scrape::config::ScraperConfig;
//! use brewdex_scrape::extract::HopTarget;
//! use brewdex_scrape::http::BlockingHttpClient;
//! use brewdex_scrape::pipeline::{run_collection, CollectionStores, RunOptions};
//! use brewdex_scrape::scrape::{Dispatcher, NullProgress, Threaded, Workers};
//! use brewdex_scrape::store::EntityStore;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ScraperConfig::from_env()?;
//!     let client = Arc::new(BlockingHttpClient::new(&config)?);
//!     let dispatcher = Dispatcher::new(Threaded::new(client), Workers::Auto.resolve());
//!     let stores = CollectionStores {
//!         entities: EntityStore::new(config.collection_path("hops"), "hops"),
//!         failures: EntityStore::new(config.failures_path("hops"), "hops"),
//!     };
//!     let seeds = vec!["https://beermaverick.com/hop/citra/".to_string()];
//!
//!     let summary = run_collection(
//!         &HopTarget::new(&config),
//!         &dispatcher,
//!         &stores,
//!         &seeds,
//!         &RunOptions::default(),
//!         Box::new(NullProgress),
//!     )?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod scrape;
pub mod sitemap;
pub mod store;

pub use error::{ExtractError, FetchError, Result, ScrapeError};
