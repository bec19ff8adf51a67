//! End-to-end collection runs against an in-memory site and a temporary
//! data directory

mod common;

use brewdex_scrape::extract::HopTarget;
use brewdex_scrape::model::Hop;
use brewdex_scrape::pipeline::{run_collection, CollectionStores, RunOptions};
use brewdex_scrape::scrape::{Cooperative, Dispatcher, NullProgress, Threaded};
use brewdex_scrape::store::EntityStore;
use common::{hop_link, RecordingSink, StubSite, HOP_API, SITE};
use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn stores(dir: &TempDir) -> CollectionStores<Hop> {
    CollectionStores {
        entities: EntityStore::new(dir.path().join("extracted/hops.json"), "hops"),
        failures: EntityStore::new(dir.path().join("extracted/hops.failures.json"), "hops"),
    }
}

fn options(force: bool) -> RunOptions {
    RunOptions {
        force,
        poll_interval: Duration::from_millis(1),
    }
}

fn four() -> NonZeroUsize {
    NonZeroUsize::new(4).unwrap()
}

#[test]
fn test_rerun_with_populated_cache_fetches_nothing() {
    let dir = TempDir::new().unwrap();
    let site = Arc::new(StubSite::with_hops(10));
    let dispatcher = Dispatcher::new(Threaded::new(site.clone()), four());
    let target = HopTarget::with_api_template(HOP_API);
    let seeds: Vec<String> = (0..10).map(hop_link).collect();
    let stores = stores(&dir);

    let first = run_collection(&target, &dispatcher, &stores, &seeds, &options(false), Box::new(NullProgress)).unwrap();
    assert_eq!(first.scraped, 10);
    assert_eq!(first.cached, 0);
    let requests_after_first = site.requests();
    let written = fs::read_to_string(stores.entities.path()).unwrap();

    let second = run_collection(&target, &dispatcher, &stores, &seeds, &options(false), Box::new(NullProgress)).unwrap();
    assert_eq!(second.cached, 10);
    assert_eq!(second.scraped, 0);
    assert_eq!(site.requests(), requests_after_first);
    assert_eq!(fs::read_to_string(stores.entities.path()).unwrap(), written);
}

#[test]
fn test_cross_references_resolve_across_shards() {
    let dir = TempDir::new().unwrap();
    let site = Arc::new(StubSite::with_hops(8));
    let dispatcher = Dispatcher::new(Cooperative::new(site).unwrap(), four());
    let seeds: Vec<String> = (0..8).map(hop_link).collect();
    let stores = stores(&dir);

    let summary = run_collection(
        &HopTarget::with_api_template(HOP_API),
        &dispatcher,
        &stores,
        &seeds,
        &options(false),
        Box::new(NullProgress),
    )
    .unwrap();
    assert_eq!(summary.dangling_references, 0);

    let hops = stores.entities.load().unwrap();
    let ids: HashMap<&str, String> = hops.iter().map(|hop| (hop.link.as_str(), hop.id.to_string())).collect();
    for index in 0..8 {
        let hop = hops.iter().find(|hop| hop.link == hop_link(index)).unwrap();
        let next = &ids[hop_link((index + 1) % 8).as_str()];
        assert_eq!(hop.substitutes, [next.clone()], "{}", hop.link);
    }
}

#[test]
fn test_failures_are_persisted_separately_and_retried() {
    let dir = TempDir::new().unwrap();
    let site = Arc::new(StubSite::with_hops(3));
    let dispatcher = Dispatcher::new(Threaded::new(site), four());
    let target = HopTarget::with_api_template(HOP_API);
    let mut seeds: Vec<String> = (0..3).map(hop_link).collect();
    seeds.push(format!("{SITE}/hop/missing/"));
    let stores = stores(&dir);

    let summary = run_collection(&target, &dispatcher, &stores, &seeds, &options(false), Box::new(NullProgress)).unwrap();
    assert_eq!(summary.scraped, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(stores.entities.load().unwrap().len(), 3);
    let failures = stores.failures.load().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].link, format!("{SITE}/hop/missing/"));

    // The failed link is not cached, so the next run tries it again
    let again = run_collection(&target, &dispatcher, &stores, &seeds, &options(false), Box::new(NullProgress)).unwrap();
    assert_eq!(again.scraped, 0);
    assert_eq!(again.failed, 1);
}

#[test]
fn test_force_rescrapes_but_keeps_ids() {
    let dir = TempDir::new().unwrap();
    let site = Arc::new(StubSite::with_hops(4));
    let dispatcher = Dispatcher::new(Threaded::new(site.clone()), four());
    let target = HopTarget::with_api_template(HOP_API);
    let seeds: Vec<String> = (0..4).map(hop_link).collect();
    let stores = stores(&dir);

    run_collection(&target, &dispatcher, &stores, &seeds, &options(false), Box::new(NullProgress)).unwrap();
    let before = stores.entities.load().unwrap();
    let requests = site.requests();

    let forced = run_collection(&target, &dispatcher, &stores, &seeds, &options(true), Box::new(NullProgress)).unwrap();
    assert_eq!(forced.scraped, 4);
    assert!(site.requests() > requests);

    let after = stores.entities.load().unwrap();
    assert_eq!(after, before);
}

#[test]
fn test_progress_is_monotonic_and_reaches_100() {
    let dir = TempDir::new().unwrap();
    let site = Arc::new(StubSite::with_hops(20));
    let dispatcher = Dispatcher::new(Threaded::new(site), four());
    let seeds: Vec<String> = (0..20).map(hop_link).collect();
    let sink = RecordingSink::default();

    run_collection(
        &HopTarget::with_api_template(HOP_API),
        &dispatcher,
        &stores(&dir),
        &seeds,
        &options(false),
        Box::new(sink.clone()),
    )
    .unwrap();

    let seen = sink.seen();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]), "{seen:?}");
    assert_eq!(seen.last(), Some(&100));
    assert_eq!(seen.iter().filter(|percent| **percent == 100).count(), 1);
}

#[test]
fn test_panicking_item_still_writes_output() {
    let dir = TempDir::new().unwrap();
    let mut site = StubSite::with_hops(4);
    site.panic_on(&hop_link(2));
    let dispatcher = Dispatcher::new(Threaded::new(Arc::new(site)), four());
    let seeds: Vec<String> = (0..4).map(hop_link).collect();
    let stores = stores(&dir);

    let summary = run_collection(
        &HopTarget::with_api_template(HOP_API),
        &dispatcher,
        &stores,
        &seeds,
        &options(false),
        Box::new(NullProgress),
    )
    .unwrap();

    assert_eq!(summary.scraped, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(stores.entities.load().unwrap().len(), 3);
    assert_eq!(stores.failures.load().unwrap()[0].link, hop_link(2));
}
