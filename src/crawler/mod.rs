//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The `Fetcher` and `LinkExtractor` seams and their HTTP/HTML implementations
//! - Breadth-first crawl coordination over a bounded number of levels

mod coordinator;
mod fetcher;
mod parser;
mod traits;

pub use coordinator::{CrawlReport, Crawler, FetchFailure, SiteVertex};
pub use fetcher::{build_http_client, HttpFetcher};
pub use parser::{parse_links, HtmlLinkExtractor};
pub use traits::{FetchError, FetchedPage, Fetcher, Link, LinkExtractor};

use crate::config::Config;
use crate::{ConfigError, SiteMapperError};

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP fetcher from the user agent settings
/// 2. Crawl breadth-first from the configured seed URL
/// 3. Return the report holding every discovered URL
///
/// # Arguments
///
/// * `config` - The crawler configuration; `crawler.seed-url` must be set
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed
/// * `Err(SiteMapperError)` - No seed, a malformed seed, or no HTTP client
pub async fn crawl(config: &Config) -> Result<CrawlReport, SiteMapperError> {
    let seed = config
        .crawler
        .seed_url
        .as_deref()
        .ok_or_else(|| ConfigError::Validation("No seed URL configured".to_string()))?;

    Crawler::from_config(config)?.crawl(seed).await
}
