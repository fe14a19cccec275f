//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives a run from seeds to an
//! empty frontier, including:
//! - Loading the record store and rebuilding the visited set and frontier
//! - Fetching, extracting and persisting one location at a time
//! - Expanding outgoing links through the scope filter
//! - Honouring stop requests between pages
//!
//! A record is flushed before its links are expanded, and a location enters the
//! visited set only once its record is durable. Because of this, a crash at any
//! point leaves a store the next run can resume from without fetching any
//! stored location again.

use crate::config::Config;
use crate::crawler::extractor::{oldest_revision_location, Extractor, HtmlExtractor};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::stop::StopHandle;
use crate::state::{CrawlPhase, Frontier, VisitedSet};
use crate::storage::{open_store, Record, RecordStore};
use crate::url::{LinkFilter, LinkVerdict, LocationId};
use crate::{Result, ScribeError};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often (in stored records) progress is logged
const PROGRESS_INTERVAL: usize = 10;

/// Why a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every reachable in-scope location has been processed or abandoned
    FrontierExhausted,
    /// A stop was requested before the frontier ran out
    StopRequested,
}

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Records found in the store when the run started
    pub resumed_records: usize,
    pub records_stored: usize,
    pub fetch_failures: usize,
    pub extract_failures: usize,
    /// Frontier entries that had already been visited when taken
    pub already_visited: usize,
    pub links_enqueued: usize,
    pub links_out_of_scope: usize,
    pub provenance_from_history: usize,
    pub stop_reason: Option<StopReason>,
}

/// Outcome of one pass through the crawl loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Stored(LocationId),
    AlreadyVisited(LocationId),
    FetchFailed(LocationId),
    ExtractFailed(LocationId),
    Finished(StopReason),
}

/// Main crawler coordinator structure
///
/// One coordinator drives one run. It owns the record store and the in-memory
/// crawl state, and processes one location at a time.
pub struct Coordinator {
    store: Box<dyn RecordStore>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    filter: LinkFilter,
    limiter: RateLimiter,
    seeds: Vec<String>,
    follow_revision_history: bool,
    frontier: Frontier,
    visited: VisitedSet,
    phase: CrawlPhase,
    stop: StopHandle,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates an idle coordinator with no seeds, no scope rules and no delay
    pub fn new(
        store: Box<dyn RecordStore>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            store,
            fetcher,
            extractor,
            filter: LinkFilter::new(),
            limiter: RateLimiter::new(Duration::ZERO),
            seeds: Vec::new(),
            follow_revision_history: false,
            frontier: Frontier::new(),
            visited: VisitedSet::new(),
            phase: CrawlPhase::Idle,
            stop: StopHandle::new(),
            report: CrawlReport::default(),
        }
    }

    /// Builds a coordinator wired to the HTTP fetcher, the HTML extractor and
    /// the configured record store
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `seeds` - Raw seed strings; invalid ones are skipped at start
    pub fn from_config(config: &Config, seeds: Vec<String>) -> Result<Self> {
        let store = open_store(&config.output)?;
        let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
        let extractor = HtmlExtractor::from_config(&config.extractor)?;

        Ok(Self::new(store, Arc::new(fetcher), Arc::new(extractor))
            .with_seeds(seeds)
            .with_filter(LinkFilter::from_config(&config.scope))
            .with_min_interval(Duration::from_millis(config.crawler.min_request_interval))
            .with_revision_history(config.crawler.follow_revision_history))
    }

    pub fn with_seeds(mut self, seeds: Vec<String>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_filter(mut self, filter: LinkFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.limiter = RateLimiter::new(interval);
        self
    }

    pub fn with_revision_history(mut self, follow: bool) -> Self {
        self.follow_revision_history = follow;
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn report(&self) -> &CrawlReport {
        &self.report
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Returns a handle that can request a stop from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Requests a stop
    ///
    /// An idle coordinator stops at once. A running one finishes the page in
    /// flight first. Stopping a stopped coordinator does nothing.
    pub fn stop(&mut self) {
        self.stop.stop();

        if self.phase == CrawlPhase::Idle {
            self.phase = CrawlPhase::Stopped;
            self.report.stop_reason = Some(StopReason::StopRequested);
        }
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(ScribeError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::debug!("Crawl phase: {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Loads the store and rebuilds the visited set and frontier
    ///
    /// The frontier is rebuilt from the seeds and from the outgoing links of
    /// every stored record, minus anything already visited, so a resumed run
    /// picks up every link the interrupted run had discovered.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The coordinator is running
    /// * `Err(ScribeError::Storage)` - The store is corrupt or unreadable; the
    ///   coordinator stays idle
    /// * `Err(ScribeError::InvalidTransition)` - The coordinator is not idle
    pub fn start(&mut self) -> Result<()> {
        if self.phase != CrawlPhase::Idle {
            return Err(ScribeError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Running,
            });
        }

        let records = self.store.load().map_err(|e| {
            tracing::error!("Cannot load record store {}: {}", self.store.describe(), e);
            e
        })?;

        self.visited = VisitedSet::from_records(&records);
        self.report = CrawlReport {
            resumed_records: records.len(),
            ..CrawlReport::default()
        };

        let mut frontier = Frontier::new();

        for raw in &self.seeds {
            match LocationId::parse(raw) {
                Ok(seed) if self.visited.contains(&seed) => {
                    tracing::trace!("Seed {} already visited", seed);
                }
                Ok(seed) => {
                    frontier.insert(seed);
                }
                Err(e) => tracing::warn!("Skipping invalid seed '{}': {}", raw, e),
            }
        }
        let seeded = frontier.len();

        frontier.add(
            records
                .iter()
                .flat_map(|record| record.outgoing.iter())
                .filter(|link| self.filter.judge(link, &self.visited) == LinkVerdict::Admit)
                .cloned(),
        );

        tracing::info!(
            "Loaded {} records from {}; frontier has {} locations ({} from seeds)",
            records.len(),
            self.store.describe(),
            frontier.len(),
            seeded
        );

        self.frontier = frontier;
        self.transition(CrawlPhase::Running)
    }

    /// Runs the crawl until the frontier is empty or a stop is requested
    ///
    /// Starts the coordinator first if it is still idle. Per-page fetch and
    /// extraction failures are logged and skipped. A store failure ends the run
    /// with an error and leaves the coordinator stopped.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        if self.phase == CrawlPhase::Idle {
            self.start()?;
        } else if self.phase != CrawlPhase::Running {
            return Err(ScribeError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Running,
            });
        }

        let started = Instant::now();

        let reason = loop {
            let outcome = match self.step().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Crawl aborted: {}", e);
                    self.phase = CrawlPhase::Stopped;
                    return Err(e);
                }
            };

            match outcome {
                CycleOutcome::Finished(reason) => break reason,
                CycleOutcome::Stored(_) => {
                    let stored = self.report.records_stored;
                    if stored % PROGRESS_INTERVAL == 0 {
                        let rate = stored as f64 / started.elapsed().as_secs_f64().max(0.001);
                        tracing::info!(
                            "Progress: {} records stored, {} in frontier, {:.2} pages/sec",
                            stored,
                            self.frontier.len(),
                            rate
                        );
                    }
                }
                _ => {}
            }
        };

        let report = &self.report;
        tracing::info!(
            "Crawl finished ({:?}) in {:?}: {} stored, {} fetch failures, {} extract failures, {} left in frontier",
            reason,
            started.elapsed(),
            report.records_stored,
            report.fetch_failures,
            report.extract_failures,
            self.frontier.len()
        );

        Ok(self.report.clone())
    }

    /// Processes at most one location
    ///
    /// This method:
    /// 1. Honours a pending stop request
    /// 2. Takes a location from the frontier, skipping it if already visited
    /// 3. Waits for the rate limiter, then fetches and extracts the page
    /// 4. Persists the record, marks the location visited
    /// 5. Adds admitted outgoing links to the frontier
    pub async fn step(&mut self) -> Result<CycleOutcome> {
        if self.phase != CrawlPhase::Running {
            return Err(ScribeError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Running,
            });
        }

        if self.stop.is_stopped() {
            self.transition(CrawlPhase::Stopping)?;
            return Ok(self.finish(StopReason::StopRequested));
        }

        let Some(location) = self.frontier.take_one() else {
            return Ok(self.finish(StopReason::FrontierExhausted));
        };

        if self.visited.contains(&location) {
            tracing::trace!("Skipping {}, already visited", location);
            self.report.already_visited += 1;
            return Ok(CycleOutcome::AlreadyVisited(location));
        }

        tracing::debug!("Processing {}", location);

        self.limiter.wait().await;
        let content = match self.fetcher.fetch(&location).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Fetch failed, abandoning {}: {}", location, e);
                self.report.fetch_failures += 1;
                return Ok(CycleOutcome::FetchFailed(location));
            }
        };

        let page = match self.extractor.extract(&location, &content) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Extraction failed, abandoning {}: {}", location, e);
                self.report.extract_failures += 1;
                return Ok(CycleOutcome::ExtractFailed(location));
            }
        };

        let provenance_timestamp = match page.provenance_timestamp {
            Some(ts) => Some(ts),
            None => self.provenance_from_history(page.history.as_ref()).await,
        };

        let outgoing = page.outgoing.clone();
        let record = Record {
            location: location.clone(),
            title: page.title,
            body: page.body,
            outgoing: page.outgoing,
            provenance_timestamp,
        };

        if let Err(e) = self.store.append_and_flush(record) {
            tracing::error!("Failed to persist record for {}: {}", location, e);
            self.phase = CrawlPhase::Stopped;
            return Err(e.into());
        }

        self.visited.mark(location.clone());
        self.report.records_stored += 1;
        self.expand(&location, &outgoing);

        Ok(CycleOutcome::Stored(location))
    }

    fn finish(&mut self, reason: StopReason) -> CycleOutcome {
        self.phase = CrawlPhase::Stopped;
        self.report.stop_reason = Some(reason);
        CycleOutcome::Finished(reason)
    }

    fn expand(&mut self, from: &LocationId, outgoing: &BTreeSet<LocationId>) {
        let mut admitted = 0;

        for link in outgoing {
            match self.filter.judge(link, &self.visited) {
                LinkVerdict::Admit => {
                    if self.frontier.insert(link.clone()) {
                        admitted += 1;
                    }
                }
                LinkVerdict::Visited => {}
                LinkVerdict::OutOfScope(rule) => {
                    tracing::trace!("Link {} rejected by {} rule", link, rule);
                    self.report.links_out_of_scope += 1;
                }
            }
        }

        self.report.links_enqueued += admitted;
        tracing::debug!(
            "{}: {} outgoing links, {} newly queued",
            from,
            outgoing.len(),
            admitted
        );
    }

    /// Looks up the oldest revision timestamp through the history page
    ///
    /// Any failure here only means the record has no timestamp.
    async fn provenance_from_history(&mut self, history: Option<&LocationId>) -> Option<String> {
        if !self.follow_revision_history {
            return None;
        }

        let oldest = oldest_revision_location(history?)?;

        self.limiter.wait().await;
        let content = match self.fetcher.fetch(&oldest).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Revision history unavailable: {}", e);
                return None;
            }
        };

        let timestamp = self.extractor.extract_revision_timestamp(&content);
        if timestamp.is_some() {
            self.report.provenance_from_history += 1;
        }
        timestamp
    }
}
