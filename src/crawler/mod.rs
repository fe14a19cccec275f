//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`Fetcher`] trait
//! - HTML extraction behind the [`Extractor`] trait
//! - Request spacing with a single rate limiter
//! - Overall crawl coordination and cooperative stopping

mod coordinator;
mod extractor;
mod fetcher;
mod rate_limiter;
mod stop;

pub use coordinator::{Coordinator, CrawlReport, CycleOutcome, StopReason};
pub use extractor::{oldest_revision_location, ExtractError, ExtractedPage, Extractor, HtmlExtractor};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher};
pub use rate_limiter::RateLimiter;
pub use stop::{spawn_signal_listener, StopHandle};

use crate::config::{load_seeds, Config};
use crate::storage::set_aside;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Move the existing store aside if `fresh` is set
/// 2. Load the seed list
/// 3. Build the coordinator from the configuration
/// 4. Turn Ctrl-C / SIGTERM into a cooperative stop
/// 5. Crawl until the frontier is empty or a stop is requested
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Start from an empty store instead of resuming
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run ended normally (exhausted or stopped)
/// * `Err(ScribeError)` - Setup failed or the store could not be read or written
///
/// # Example
///
/// ```no_run
/// use sumi_scribe::config::load_config;
/// use sumi_scribe::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = crawl(config, false).await?;
/// println!("{} records stored", report.records_stored);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, fresh: bool) -> Result<CrawlReport> {
    if fresh {
        match set_aside(&config.output)? {
            Some(backup) => tracing::info!("Previous records kept at {}", backup.display()),
            None => tracing::info!("No previous records at {}", config.output.records_path),
        }
    }

    let seeds = load_seeds(&config.seeds)?;
    tracing::info!("Loaded {} seed locations", seeds.len());

    let mut coordinator = Coordinator::from_config(&config, seeds)?;
    let listener = spawn_signal_listener(coordinator.stop_handle());

    let result = coordinator.run().await;
    listener.abort();

    result
}
