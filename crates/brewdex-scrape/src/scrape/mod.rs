//! Concurrent scraping engine
//!
//! Pending links are split into shards ([`partition`]), each shard is
//! processed by one scrape unit ([`unit`]) and the [`Dispatcher`] merges the
//! owned per-shard results. A [`ProgressAggregator`] watches the shared
//! counter meanwhile.
//!
//! Two interchangeable execution strategies exist:
//! - [`Threaded`]: one OS thread per shard, blocking HTTP client. A hung
//!   request stalls only its own shard.
//! - [`Cooperative`]: one task per shard on a single-threaded event loop,
//!   non-blocking HTTP client. A hung request stalls the whole run, so the
//!   client timeout is the only bound.

pub mod dispatch;
pub mod partition;
pub mod progress;
pub mod unit;

pub use dispatch::{Cooperative, Dispatcher, ExecutionStrategy, RunResult, Threaded};
pub use partition::{partition, Workers};
pub use progress::{NullProgress, ProgressAggregator, ProgressCounter, ProgressSink, TerminalProgress};
pub use unit::ShardOutcome;

use crate::error::FetchError;
use crate::extract::Section;
use crate::http::Page;
use crate::model::ScrapedEntity;

/// A best-effort secondary request made after a page was extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    /// Caller-defined position the result applies to
    pub slot: usize,
    pub url: String,
    pub follow_redirects: bool,
}

/// One kind of page the engine knows how to scrape
pub trait ScrapeTarget: Send + Sync {
    type Entity: ScrapedEntity;

    /// Singular name used in warnings, e.g. `hop`
    fn kind(&self) -> &'static str;

    /// Key of the persisted collection, e.g. `hops`
    fn collection(&self) -> &'static str;

    fn sections(&self) -> &[Section<Self::Entity>];

    /// Secondary requests for a freshly extracted entity
    fn follow_ups(&self, _entity: &Self::Entity) -> Vec<FollowUp> {
        Vec::new()
    }

    /// Fold a follow-up response into the entity. Problems must be recorded
    /// as warnings, never turned into a hard failure.
    fn apply_follow_up(&self, _entity: &mut Self::Entity, _follow_up: &FollowUp, _outcome: Result<Page, FetchError>) {}
}
