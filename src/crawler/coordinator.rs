//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the breadth-first crawl loop, including:
//! - Seeding the frontier and driving the `Idle → Running → Done` phases
//! - Fetching every page of a level concurrently, bounded by a semaphore
//! - Resolving discovered links and merging them through the dedup gate
//! - Collecting the final [`CrawlReport`]

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::parser::HtmlLinkExtractor;
use crate::crawler::traits::{Fetcher, Link, LinkExtractor};
use crate::state::{CrawlPhase, CrawlState};
use crate::url::{resolve, CanonicalUrl};
use crate::SiteMapperError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

/// Outgoing internal edges of one fetched page
///
/// Built from the page's raw links; every href that the resolver rejects is
/// dropped here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteVertex {
    pub url: CanonicalUrl,
    pub edges: Vec<CanonicalUrl>,
}

impl SiteVertex {
    /// Resolves `links` against the page they were found on
    pub fn from_links(url: CanonicalUrl, links: &[Link]) -> Self {
        let edges = links
            .iter()
            .filter_map(|link| match resolve(&link.href, &url) {
                Ok(edge) => Some(edge),
                Err(e) => {
                    tracing::trace!("Skipping link {:?} on {}: {}", link.href, url, e);
                    None
                }
            })
            .collect();

        Self { url, edges }
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub url: CanonicalUrl,
    pub depth: u32,
    pub message: String,
}

/// Result of a completed crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Every URL discovered, in discovery order
    pub visited: Vec<CanonicalUrl>,

    /// Number of visited URLs first discovered at each depth
    pub urls_by_depth: BTreeMap<u32, usize>,

    /// Pages whose fetch failed; they stay in `visited`
    pub failures: Vec<FetchFailure>,

    /// Number of pages fetched successfully
    pub pages_fetched: usize,

    /// Number of BFS levels processed
    pub levels_completed: u32,

    /// Depth bound the crawl ran with
    pub max_depth: u32,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Returns whether `url` (in any spelling that canonicalizes equally) was visited
    pub fn contains(&self, url: &str) -> bool {
        match CanonicalUrl::parse(url) {
            Ok(url) => self.visited.contains(&url),
            Err(_) => false,
        }
    }

    /// Returns the number of visited URLs
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Returns the wall-clock time the crawl took
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// What happened to one page of a level
#[derive(Debug)]
enum PageOutcome {
    Fetched { new_urls: usize },
    Failed(FetchFailure),
}

/// Breadth-first, same-site crawler
pub struct Crawler {
    config: CrawlerConfig,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
}

impl Crawler {
    /// Creates a crawler around the given collaborators
    ///
    /// Only `max_depth` and `max_concurrent_fetches` are read from `config`;
    /// the seed is passed to [`Crawler::crawl`].
    pub fn new(
        config: CrawlerConfig,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Self {
        Self {
            config,
            fetcher,
            extractor,
        }
    }

    /// Creates a crawler that fetches over HTTP and parses HTML
    pub fn from_config(config: &Config) -> Result<Self, SiteMapperError> {
        let fetcher = HttpFetcher::new(&config.user_agent)?;
        Ok(Self::new(
            config.crawler.clone(),
            Arc::new(fetcher),
            Arc::new(HtmlLinkExtractor),
        ))
    }

    /// Crawls the site reachable from `seed`
    ///
    /// Levels `0..=max_depth` are fetched. Links found on the deepest level
    /// are recorded but not fetched. Fetch failures are collected in the
    /// report and never abort the crawl.
    ///
    /// # Errors
    ///
    /// * `SiteMapperError::MalformedPageUrl` - `seed` is not an absolute
    ///   http(s) URL
    ///
    /// # Example
    ///
    /// ```no_run
    /// use site_mapper::config::Config;
    /// use site_mapper::crawler::Crawler;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let crawler = Crawler::from_config(&Config::default())?;
    /// let report = crawler.crawl("https://example.com/").await?;
    /// println!("{} pages", report.visited_len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(&self, seed: &str) -> Result<CrawlReport, SiteMapperError> {
        let seed_url =
            CanonicalUrl::parse(seed).map_err(|source| SiteMapperError::MalformedPageUrl {
                url: seed.to_string(),
                source,
            })?;

        let started_at = Utc::now();
        let max_depth = self.config.max_depth;
        let permits = self.config.max_concurrent_fetches.max(1) as usize;

        tracing::info!(
            "Starting crawl of {} (max depth {}, {} concurrent fetches)",
            seed_url,
            max_depth,
            permits
        );

        let state = Arc::new(Mutex::new(CrawlState::with_seed(seed_url)));
        let semaphore = Arc::new(Semaphore::new(permits));

        let mut phase = CrawlPhase::Idle;
        tracing::debug!("Crawl phase: {}", phase);
        let mut depth = 0;
        let mut failures = Vec::new();
        let mut pages_fetched = 0;
        let mut levels_completed = 0;

        loop {
            let frontier_empty = lock(&state).is_frontier_empty();
            phase = CrawlPhase::next(depth, max_depth, frontier_empty);
            tracing::debug!("Crawl phase: {}", phase);

            let Some(level_depth) = phase.depth() else {
                break;
            };

            let level = lock(&state).dequeue_level();
            tracing::info!("Level {}: fetching {} pages", level_depth, level.len());

            let mut new_urls = 0;
            for outcome in self.process_level(level, level_depth, &state, &semaphore).await {
                match outcome {
                    PageOutcome::Fetched { new_urls: n } => {
                        pages_fetched += 1;
                        new_urls += n;
                    }
                    PageOutcome::Failed(failure) => failures.push(failure),
                }
            }

            tracing::info!(
                "Level {} complete: {} new URLs, {} visited",
                level_depth,
                new_urls,
                lock(&state).visited_len()
            );

            levels_completed += 1;
            depth += 1;
        }

        debug_assert!(phase.is_terminal());

        let urls_by_depth = {
            let state = lock(&state);
            let mut urls_by_depth = BTreeMap::new();
            for url in state.visited() {
                if let Some(d) = state.depth_of(url) {
                    *urls_by_depth.entry(d).or_insert(0) += 1;
                }
            }
            urls_by_depth
        };

        // Every task of the last level has been joined, so this is the only handle left
        let visited = match Arc::try_unwrap(state) {
            Ok(state) => state
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .into_visited(),
            Err(shared) => lock(&shared).visited().to_vec(),
        };

        let finished_at = Utc::now();
        tracing::info!(
            "Crawl finished: {} URLs, {} pages fetched, {} failures in {}ms",
            visited.len(),
            pages_fetched,
            failures.len(),
            (finished_at - started_at).num_milliseconds()
        );

        Ok(CrawlReport {
            visited,
            urls_by_depth,
            failures,
            pages_fetched,
            levels_completed,
            max_depth,
            started_at,
            finished_at,
        })
    }

    /// Fetches every URL of one level and waits for all of them
    ///
    /// A task that panics is reported as a failure of its URL.
    async fn process_level(
        &self,
        level: Vec<CanonicalUrl>,
        depth: u32,
        state: &Arc<Mutex<CrawlState>>,
        semaphore: &Arc<Semaphore>,
    ) -> Vec<PageOutcome> {
        let mut handles = Vec::with_capacity(level.len());

        for url in level {
            let task = tokio::spawn(visit_page(
                url.clone(),
                depth,
                Arc::clone(&self.fetcher),
                Arc::clone(&self.extractor),
                Arc::clone(state),
                Arc::clone(semaphore),
            ));
            handles.push((url, task));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (url, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Fetch task for {} did not complete: {}", url, e);
                    outcomes.push(PageOutcome::Failed(FetchFailure {
                        url,
                        depth,
                        message: format!("fetch task failed: {}", e),
                    }));
                }
            }
        }

        outcomes
    }
}

/// Fetches one page and merges its internal edges into the crawl state
async fn visit_page(
    url: CanonicalUrl,
    depth: u32,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    state: Arc<Mutex<CrawlState>>,
    semaphore: Arc<Semaphore>,
) -> PageOutcome {
    // The semaphore is never closed; a closed one would just lift the bound
    let _permit = semaphore.acquire_owned().await.ok();

    tracing::debug!("Fetching {} (depth {})", url, depth);

    let page = match fetcher.fetch_page(&url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            return PageOutcome::Failed(FetchFailure {
                url,
                depth,
                message: e.to_string(),
            });
        }
    };

    let links = extractor.extract(&page.body);

    // Links resolve against the page that actually answered; a same-site
    // redirect target is itself a page of the site
    let mut vertex = SiteVertex::from_links(page.url, &links);
    if vertex.url != url {
        vertex.edges.insert(0, vertex.url.clone());
    }

    let new_urls = {
        let mut state = lock(&state);
        vertex
            .edges
            .iter()
            .filter(|edge| state.enqueue_if_new((*edge).clone()))
            .count()
    };

    tracing::debug!(
        "Processed {}: {} links, {} internal, {} new",
        vertex.url,
        links.len(),
        vertex.edges.len(),
        new_urls
    );

    PageOutcome::Fetched { new_urls }
}

/// Locks the crawl state, recovering it if a task panicked while holding it
fn lock(state: &Mutex<CrawlState>) -> MutexGuard<'_, CrawlState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
