//! Collection runs
//!
//! A run loads the cache, scrapes whatever is still pending, merges, resolves
//! cross-references over the complete set and writes everything back. Hard
//! failures are written to a separate file and retried next time.

use crate::error::Result;
use crate::model::ScrapedEntity;
use crate::resolve::resolve_cross_references;
use crate::scrape::{Dispatcher, ExecutionStrategy, ProgressAggregator, ProgressCounter, ProgressSink, ScrapeTarget};
use crate::store::{merge, pending_links, EntityStore};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Per-run settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Re-scrape cached links too
    pub force: bool,
    pub poll_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force: false,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Counts describing one collection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub collection: String,
    /// Records loaded from the cache
    pub cached: usize,
    /// Records scraped successfully in this run
    pub scraped: usize,
    /// Hard failures in this run
    pub failed: usize,
    /// Records in the written collection carrying warnings
    pub with_warnings: usize,
    pub dangling_references: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} cached, {} scraped, {} failed, {} with warnings, {} dangling references",
            self.collection, self.cached, self.scraped, self.failed, self.with_warnings, self.dangling_references
        )
    }
}

/// Where a collection lives on disk
#[derive(Debug, Clone)]
pub struct CollectionStores<E> {
    pub entities: EntityStore<E>,
    pub failures: EntityStore<E>,
}

/// Scrape `seeds` for `target` and persist the result
pub fn run_collection<T, S>(
    target: &T,
    dispatcher: &Dispatcher<S>,
    stores: &CollectionStores<T::Entity>,
    seeds: &[String],
    options: &RunOptions,
    sink: Box<dyn ProgressSink>,
) -> Result<RunSummary>
where
    T: ScrapeTarget,
    S: ExecutionStrategy,
{
    let collection = target.collection();
    let cached = stores.entities.load()?;
    let cached_count = cached.len();

    let pending: Vec<String> = if options.force {
        let mut seen = HashSet::new();
        seeds.iter().filter(|link| seen.insert(link.as_str())).cloned().collect()
    } else {
        pending_links(seeds, &cached)
    };
    info!(collection, cached = cached_count, pending = pending.len(), "Starting run");

    let (successes, failures) = if pending.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        let progress = ProgressCounter::new();
        let reporter = ProgressAggregator::spawn(progress.clone(), pending.len(), options.poll_interval, sink);
        let result = dispatcher.dispatch(target, &pending, &progress);
        reporter.finish();
        let result = result?;
        (result.successes, result.failures)
    };

    let scraped = successes.len();
    let failed = failures.len();
    let mut entities = merge(cached, successes);
    let report = resolve_cross_references(&mut entities);

    stores.entities.save(&entities)?;
    stores.failures.save(&failures)?;

    let summary = RunSummary {
        collection: collection.to_string(),
        cached: cached_count,
        scraped,
        failed,
        with_warnings: entities.iter().filter(|entity| entity.has_warnings()).count(),
        dangling_references: report.dangling.len(),
    };
    info!(
        collection,
        cached = summary.cached,
        scraped = summary.scraped,
        failed = summary.failed,
        with_warnings = summary.with_warnings,
        dangling = summary.dangling_references,
        "Run complete"
    );
    Ok(summary)
}
