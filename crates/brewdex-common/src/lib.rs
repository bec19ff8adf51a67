//! Brewdex Common Library
//!
//! Shared error handling and logging for the Brewdex workspace.
//!
//! - **Error Handling**: [`BrewdexError`] and the [`Result`] alias used by the
//!   persistence layer
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//!
//! # Example
//!
//! ```no_run
//! use brewdex_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

pub use error::{BrewdexError, Result};
