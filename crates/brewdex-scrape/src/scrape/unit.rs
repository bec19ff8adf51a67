//! Atomic scrape unit
//!
//! Processes one shard, item by item. Each item ends up in exactly one of
//! the two output channels and bumps the progress counter exactly once. No
//! item can abort the shard, not even by panicking.

use super::progress::ProgressCounter;
use super::{FollowUp, ScrapeTarget};
use crate::error::FetchError;
use crate::extract::{extract_document, panic_message};
use crate::http::{AsyncFetcher, Fetcher, Page};
use crate::model::ScrapedEntity;
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Owned result of one shard
#[derive(Debug, Clone, PartialEq)]
pub struct ShardOutcome<E> {
    /// Extracted entities, possibly carrying warnings
    pub successes: Vec<E>,
    /// Hard failures
    pub failures: Vec<E>,
}

impl<E> Default for ShardOutcome<E> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Where an item ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Success,
    Failure,
}

/// Turn the primary response for `link` into `entity`, returning the
/// follow-ups to issue when the item is still alive
fn primary_stage<T: ScrapeTarget>(
    target: &T,
    link: &str,
    entity: &mut T::Entity,
    response: Result<Page, FetchError>,
) -> Option<Vec<FollowUp>> {
    let page = match response {
        Ok(page) if page.is_success() => page,
        Ok(page) => {
            warn!(link = %link, status = page.status, "Hard failure");
            entity.add_warning(format!("HTTP {} while fetching {link}", page.status));
            return None;
        }
        Err(e) => {
            warn!(link = %link, error = %e, "Hard failure");
            entity.add_warning(e.to_string());
            return None;
        }
    };

    match extract_document(&page.body, entity, target.sections(), target.kind()) {
        Ok(()) => Some(target.follow_ups(entity)),
        Err(e) => {
            error!(link = %link, error = %e, "Extraction aborted");
            entity.add_warning(format!("Extraction aborted: {e}"));
            None
        }
    }
}

fn scrape_blocking<T: ScrapeTarget>(target: &T, fetcher: &dyn Fetcher, link: &str, entity: &mut T::Entity) -> Verdict {
    let Some(follow_ups) = primary_stage(target, link, entity, fetcher.get(link)) else {
        return Verdict::Failure;
    };

    for follow_up in &follow_ups {
        let response = if follow_up.follow_redirects {
            fetcher.get(&follow_up.url)
        } else {
            fetcher.get_unfollowed(&follow_up.url)
        };
        target.apply_follow_up(entity, follow_up, response);
    }
    Verdict::Success
}

async fn scrape_async<T: ScrapeTarget>(
    target: &T,
    fetcher: &dyn AsyncFetcher,
    link: &str,
    entity: &mut T::Entity,
) -> Verdict {
    let response = fetcher.get(link).await;
    let Some(follow_ups) = primary_stage(target, link, entity, response) else {
        return Verdict::Failure;
    };

    for follow_up in &follow_ups {
        let response = if follow_up.follow_redirects {
            fetcher.get(&follow_up.url).await
        } else {
            fetcher.get_unfollowed(&follow_up.url).await
        };
        target.apply_follow_up(entity, follow_up, response);
    }
    Verdict::Success
}

/// Record a panic that escaped the item's processing on the partial entity
fn panicked<E: ScrapedEntity>(link: &str, entity: &mut E, payload: &(dyn Any + Send)) -> Verdict {
    let message = panic_message(payload);
    error!(link = %link, panic = %message, "Scrape panicked");
    entity.add_warning(format!("Scrape aborted: {message}"));
    Verdict::Failure
}

impl<E: ScrapedEntity> ShardOutcome<E> {
    fn record(&mut self, link: &str, entity: E, verdict: Verdict) {
        match verdict {
            Verdict::Success => {
                debug!(link = %link, warnings = entity.warnings().len(), "Scraped");
                self.successes.push(entity);
            }
            Verdict::Failure => self.failures.push(entity),
        }
    }
}

/// Process `shard` with a blocking fetcher
pub fn run_blocking<T: ScrapeTarget>(
    target: &T,
    fetcher: &dyn Fetcher,
    shard: &[String],
    progress: &ProgressCounter,
) -> ShardOutcome<T::Entity> {
    let mut outcome = ShardOutcome::default();

    for link in shard {
        let mut entity = T::Entity::from_link(link);
        let verdict = panic::catch_unwind(AssertUnwindSafe(|| scrape_blocking(target, fetcher, link, &mut entity)))
            .unwrap_or_else(|payload| panicked(link, &mut entity, payload.as_ref()));
        outcome.record(link, entity, verdict);
        progress.increment();
    }

    outcome
}

/// Process `shard` with a non-blocking fetcher.
///
/// Only the fetches are suspension points; extraction runs to completion
/// between them.
pub async fn run_async<T: ScrapeTarget>(
    target: &T,
    fetcher: &dyn AsyncFetcher,
    shard: &[String],
    progress: &ProgressCounter,
) -> ShardOutcome<T::Entity> {
    let mut outcome = ShardOutcome::default();

    for link in shard {
        let mut entity = T::Entity::from_link(link);
        let verdict = AssertUnwindSafe(scrape_async(target, fetcher, link, &mut entity))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| panicked(link, &mut entity, payload.as_ref()));
        outcome.record(link, entity, verdict);
        progress.increment();
    }

    outcome
}
