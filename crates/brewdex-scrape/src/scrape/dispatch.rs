//! Dispatcher and execution strategies

use super::partition::partition;
use super::progress::ProgressCounter;
use super::unit::{self, ShardOutcome};
use super::ScrapeTarget;
use crate::error::{Result, ScrapeError};
use crate::http::{AsyncFetcher, Fetcher};
use futures::future::join_all;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// Merged result of a dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult<E> {
    pub successes: Vec<E>,
    pub failures: Vec<E>,
    /// Items processed, as seen by the progress counter
    pub processed: usize,
}

impl<E> RunResult<E> {
    /// Concatenate shard outcomes in shard order
    fn merge(outcomes: Vec<ShardOutcome<E>>, processed: usize) -> Self {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            successes.extend(outcome.successes);
            failures.extend(outcome.failures);
        }
        Self {
            successes,
            failures,
            processed,
        }
    }
}

/// How shards are executed
pub trait ExecutionStrategy {
    fn name(&self) -> &'static str;

    /// Run one unit over every pending item, without concurrency
    fn run_single<T: ScrapeTarget>(
        &self,
        target: &T,
        items: &[String],
        progress: &ProgressCounter,
    ) -> Result<ShardOutcome<T::Entity>>;

    /// Run one unit per shard concurrently and wait for all of them
    fn run_shards<T: ScrapeTarget>(
        &self,
        target: &T,
        shards: &[Vec<String>],
        progress: &ProgressCounter,
    ) -> Result<Vec<ShardOutcome<T::Entity>>>;
}

// ============================================================================
// Threads
// ============================================================================

/// One OS thread per shard, all sharing one blocking client
#[derive(Clone)]
pub struct Threaded {
    fetcher: Arc<dyn Fetcher>,
}

impl Threaded {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl ExecutionStrategy for Threaded {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn run_single<T: ScrapeTarget>(
        &self,
        target: &T,
        items: &[String],
        progress: &ProgressCounter,
    ) -> Result<ShardOutcome<T::Entity>> {
        Ok(unit::run_blocking(target, self.fetcher.as_ref(), items, progress))
    }

    fn run_shards<T: ScrapeTarget>(
        &self,
        target: &T,
        shards: &[Vec<String>],
        progress: &ProgressCounter,
    ) -> Result<Vec<ShardOutcome<T::Entity>>> {
        let fetcher = self.fetcher.as_ref();

        thread::scope(|scope| -> Result<Vec<ShardOutcome<T::Entity>>> {
            let mut handles = Vec::with_capacity(shards.len());
            for (index, shard) in shards.iter().enumerate() {
                let handle = thread::Builder::new()
                    .name(format!("shard-{index}"))
                    .spawn_scoped(scope, move || unit::run_blocking(target, fetcher, shard, progress))?;
                handles.push((index, handle));
            }

            handles
                .into_iter()
                .map(|(index, handle)| {
                    handle
                        .join()
                        .map_err(|_| ScrapeError::WorkerPanicked { shard: index })
                })
                .collect()
        })
    }
}

// ============================================================================
// Cooperative tasks
// ============================================================================

/// One task per shard, multiplexed on a single-threaded event loop
pub struct Cooperative {
    fetcher: Arc<dyn AsyncFetcher>,
    runtime: Runtime,
}

impl Cooperative {
    /// Build the strategy with its own current-thread runtime.
    ///
    /// Must not be called from inside another tokio runtime.
    pub fn new(fetcher: Arc<dyn AsyncFetcher>) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { fetcher, runtime })
    }

    /// Run every shard as a task on the caller's event loop
    pub async fn run_shards_async<T: ScrapeTarget>(
        fetcher: &dyn AsyncFetcher,
        target: &T,
        shards: &[Vec<String>],
        progress: &ProgressCounter,
    ) -> Vec<ShardOutcome<T::Entity>> {
        join_all(
            shards
                .iter()
                .map(|shard| unit::run_async(target, fetcher, shard, progress)),
        )
        .await
    }
}

impl ExecutionStrategy for Cooperative {
    fn name(&self) -> &'static str {
        "tasks"
    }

    fn run_single<T: ScrapeTarget>(
        &self,
        target: &T,
        items: &[String],
        progress: &ProgressCounter,
    ) -> Result<ShardOutcome<T::Entity>> {
        let fetcher = self.fetcher.as_ref();
        Ok(self.runtime.block_on(unit::run_async(target, fetcher, items, progress)))
    }

    fn run_shards<T: ScrapeTarget>(
        &self,
        target: &T,
        shards: &[Vec<String>],
        progress: &ProgressCounter,
    ) -> Result<Vec<ShardOutcome<T::Entity>>> {
        let fetcher = self.fetcher.as_ref();
        Ok(self
            .runtime
            .block_on(Self::run_shards_async(fetcher, target, shards, progress)))
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Splits pending work into shards and runs them with a strategy
pub struct Dispatcher<S> {
    strategy: S,
    workers: NonZeroUsize,
}

impl<S: ExecutionStrategy> Dispatcher<S> {
    pub fn new(strategy: S, workers: NonZeroUsize) -> Self {
        Self { strategy, workers }
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Scrape every link in `pending`.
    ///
    /// A single worker bypasses sharding altogether. Otherwise empty shards
    /// are dropped before dispatch.
    pub fn dispatch<T: ScrapeTarget>(
        &self,
        target: &T,
        pending: &[String],
        progress: &ProgressCounter,
    ) -> Result<RunResult<T::Entity>> {
        let outcomes = if self.workers.get() == 1 {
            debug!(items = pending.len(), strategy = self.strategy.name(), "Running a single unit");
            vec![self.strategy.run_single(target, pending, progress)?]
        } else {
            let shards: Vec<Vec<String>> = partition(pending, self.workers)
                .into_iter()
                .filter(|shard| !shard.is_empty())
                .collect();
            info!(
                items = pending.len(),
                shards = shards.len(),
                strategy = self.strategy.name(),
                "Dispatching {}",
                target.collection()
            );
            self.strategy.run_shards(target, &shards, progress)?
        };

        Ok(RunResult::merge(outcomes, progress.get()))
    }
}
