//! Brewdex - hop and yeast scraper

use anyhow::{Context, Result};
use brewdex_common::logging::{init_logging, LogConfig, LogLevel};
use brewdex_scrape::config::ScraperConfig;
use brewdex_scrape::extract::{HopTarget, YeastTarget};
use brewdex_scrape::http::{BlockingHttpClient, HttpClient};
use brewdex_scrape::pipeline::{run_collection, CollectionStores, RunOptions, RunSummary};
use brewdex_scrape::scrape::{
    Cooperative, Dispatcher, ExecutionStrategy, NullProgress, ProgressSink, ScrapeTarget, TerminalProgress,
    Threaded, Workers,
};
use brewdex_scrape::sitemap::{fetch_sitemap, CategorizedLinks};
use brewdex_scrape::store::{EntityStore, LinkCache};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "brewdex")]
#[command(author, version, about = "Scrape hop and yeast records from BeerMaverick")]
struct Cli {
    /// Number of concurrent workers (0 = auto)
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    jobs: i64,

    /// Use OS threads instead of cooperative tasks
    #[arg(short, long)]
    threads: bool,

    /// Re-scrape links that are already cached
    #[arg(short, long)]
    force: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Data directory (overrides BREWDEX_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Only scrape one collection
    #[arg(long, value_enum)]
    only: Option<Collection>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Collection {
    Hops,
    Yeasts,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("brewdex")
        .filter_directives("html5ever=warn,selectors=warn")
        .build()
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    let mut config = ScraperConfig::from_env()?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    config.validate()?;

    let workers = Workers::from_jobs(cli.jobs)?.resolve();
    info!(workers = workers.get(), threads = cli.threads, force = cli.force, "Starting brewdex");

    let links = seed_links(&config)?;
    let summaries = if cli.threads {
        let client = Arc::new(BlockingHttpClient::new(&config)?);
        let dispatcher = Dispatcher::new(Threaded::new(client), workers);
        run_all(&dispatcher, &config, &cli, &links)?
    } else {
        let client = Arc::new(HttpClient::new(&config)?);
        let dispatcher = Dispatcher::new(Cooperative::new(client)?, workers);
        run_all(&dispatcher, &config, &cli, &links)?
    };

    for summary in &summaries {
        println!("{summary}");
    }
    Ok(())
}

/// Cached sitemap links, fetching the sitemap on first use
fn seed_links(config: &ScraperConfig) -> Result<CategorizedLinks> {
    let cache = LinkCache::new(config.links_path());
    let mut links = cache.load()?;

    if links.is_empty() {
        info!(url = %config.sitemap_url, "No cached links, fetching sitemap");
        let client = BlockingHttpClient::new(config)?;
        links = fetch_sitemap(&client, &config.sitemap_url)
            .with_context(|| format!("Failed to retrieve sitemap from {}", config.sitemap_url))?;
        cache.save(&links)?;
    }

    let categorized = CategorizedLinks::from_links(&links);
    info!(
        hops = categorized.hops.len(),
        yeasts = categorized.yeasts.len(),
        "Seed links ready"
    );
    Ok(categorized)
}

fn run_all<S: ExecutionStrategy>(
    dispatcher: &Dispatcher<S>,
    config: &ScraperConfig,
    cli: &Cli,
    links: &CategorizedLinks,
) -> Result<Vec<RunSummary>> {
    let options = RunOptions {
        force: cli.force,
        poll_interval: config.poll_interval(),
    };
    let wanted = |collection| cli.only.is_none_or(|only| only == collection);

    let mut summaries = Vec::new();
    if wanted(Collection::Hops) {
        let target = HopTarget::new(config);
        summaries.push(run_one(&target, dispatcher, config, cli, &links.hops, &options)?);
    }
    if wanted(Collection::Yeasts) {
        let target = YeastTarget::new();
        summaries.push(run_one(&target, dispatcher, config, cli, &links.yeasts, &options)?);
    }
    Ok(summaries)
}

fn run_one<T: ScrapeTarget, S: ExecutionStrategy>(
    target: &T,
    dispatcher: &Dispatcher<S>,
    config: &ScraperConfig,
    cli: &Cli,
    seeds: &[String],
    options: &RunOptions,
) -> Result<RunSummary> {
    let collection = target.collection();
    let stores = CollectionStores {
        entities: EntityStore::new(config.collection_path(collection), collection),
        failures: EntityStore::new(config.failures_path(collection), collection),
    };
    let sink: Box<dyn ProgressSink> = if cli.no_progress {
        Box::new(NullProgress)
    } else {
        Box::new(TerminalProgress::new(collection))
    };

    run_collection(target, dispatcher, &stores, seeds, options, sink)
        .with_context(|| format!("Failed to scrape {collection}"))
}
