//! Shared fixtures for integration tests
//!
//! `StubSite` serves canned pages from memory through both fetch traits and
//! counts every request, so dispatch runs are deterministic and offline.

#![allow(dead_code)]

use async_trait::async_trait;
use brewdex_scrape::error::FetchError;
use brewdex_scrape::http::{AsyncFetcher, Fetcher, Page};
use brewdex_scrape::scrape::ProgressSink;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SITE: &str = "https://beermaverick.test";
pub const HOP_API: &str = "https://beermaverick.test/api/hop/{slug}/";

pub fn hop_link(index: usize) -> String {
    format!("{SITE}/hop/hop-{index}/")
}

pub fn yeast_link(index: usize) -> String {
    format!("{SITE}/yeast/yeast-{index}/")
}

/// A complete hop page naming `substitutes` (relative links)
pub fn hop_page(name: &str, substitutes: &[String]) -> String {
    let items: String = substitutes
        .iter()
        .map(|link| format!(r#"<li><a href="{link}">sub</a></li>"#))
        .collect();
    format!(
        r#"<html><body>
        <h1 class="entry-title">{name} Hops</h1>
        <table>
          <tr><th>Purpose:</th><td><a href="/p/">Bittering</a></td></tr>
          <tr><th>Country:</th><td>Germany</td></tr>
        </table>
        <h2>Origin &amp; History</h2>
        <p>A classic variety.</p>
        <h2>Flavor &amp; Aroma Profile</h2>
        <p>Spicy and herbal.</p>
        <p>Tags: <em><a class="text-muted" href="/t/spicy">#spicy</a></em></p>
        <table class="brewvalues">
          <tr><th>Alpha Acid %</th><td>4-6%</td></tr>
          <tr><th>Beta Acid %</th><td>3-5%</td></tr>
        </table>
        <h2>Beer Styles</h2>
        <p>Pilsner &amp; Lager</p>
        <h2>Substitutes</h2>
        <ul>{items}</ul>
        </body></html>"#
    )
}

pub fn yeast_page(name: &str, comparables: &[String]) -> String {
    let items: String = comparables
        .iter()
        .map(|link| format!(r#"<li><a href="{link}">cmp</a></li>"#))
        .collect();
    format!(
        r#"<html><body>
        <h1 class="entry-title">{name}</h1>
        <table><tr><th>Brand:</th><td>Test Labs</td></tr><tr><th>Type:</th><td>Ale</td></tr></table>
        <h2>Description</h2>
        <p>Dependable.</p>
        <p><strong>#clean</strong></p>
        <table class="brewvalues">
          <tr><th>Attenuation</th><td>70-75%</td></tr>
          <tr><th>Optimal Temperature</th><td>60-70° F</td></tr>
        </table>
        <h2>Common Beer Styles</h2>
        <p>Good for:</p>
        <p>Porter, Stout &amp; Mild</p>
        <h2>Comparable Beer Yeast</h2>
        <ul>{items}</ul>
        </body></html>"#
    )
}

pub fn profile_json() -> String {
    r#"{"primary": {"radar_chart": [1, 2, 3, 4]}}"#.to_string()
}

/// In-memory site implementing both fetch traits
#[derive(Default)]
pub struct StubSite {
    pages: HashMap<String, Page>,
    broken: HashSet<String>,
    panics: HashSet<String>,
    requests: AtomicUsize,
}

impl StubSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Site with `count` hops, each listing the next one as a substitute,
    /// plus an aroma profile for each
    pub fn with_hops(count: usize) -> Self {
        let mut site = Self::new();
        for index in 0..count {
            let next = vec![format!("/hop/hop-{}/", (index + 1) % count)];
            site.add(&hop_link(index), Page::ok(hop_page(&format!("Hop {index}"), &next)));
            site.add(&format!("{SITE}/api/hop/hop-{index}/"), Page::ok(profile_json()));
        }
        site
    }

    pub fn add(&mut self, url: &str, page: Page) {
        self.pages.insert(url.to_string(), page);
    }

    /// Requests to `url` fail at the transport level
    pub fn break_link(&mut self, url: &str) {
        self.broken.insert(url.to_string());
    }

    /// Requests to `url` panic inside the fetcher
    pub fn panic_on(&mut self, url: &str) {
        self.panics.insert(url.to_string());
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn serve(&self, url: &str) -> Result<Page, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.panics.contains(url) {
            panic!("stub fetcher failed on {url}");
        }
        if self.broken.contains(url) {
            return Err(FetchError::transport(url, "connection refused"));
        }
        Ok(self.pages.get(url).cloned().unwrap_or_else(|| Page::status(404)))
    }
}

impl Fetcher for StubSite {
    fn get(&self, url: &str) -> Result<Page, FetchError> {
        self.serve(url)
    }

    fn get_unfollowed(&self, url: &str) -> Result<Page, FetchError> {
        self.serve(url)
    }
}

#[async_trait]
impl AsyncFetcher for StubSite {
    async fn get(&self, url: &str) -> Result<Page, FetchError> {
        tokio::task::yield_now().await;
        self.serve(url)
    }

    async fn get_unfollowed(&self, url: &str) -> Result<Page, FetchError> {
        tokio::task::yield_now().await;
        self.serve(url)
    }
}

/// Progress sink remembering every rendered percentage
#[derive(Clone, Default)]
pub struct RecordingSink(pub Arc<Mutex<Vec<u64>>>);

impl RecordingSink {
    pub fn seen(&self) -> Vec<u64> {
        self.0.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingSink {
    fn render(&mut self, percent: u64, _processed: usize, _total: usize) {
        if let Ok(mut seen) = self.0.lock() {
            seen.push(percent);
        }
    }
}
