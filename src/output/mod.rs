//! Output module for writing crawl results
//!
//! This module handles:
//! - Serializing the visited set as a sitemap (XML or plain text)
//! - Printing crawl statistics

mod sitemap;
pub mod stats;

pub use sitemap::{OutputError, OutputFormat, SitemapDocument, SitemapEntry, SITEMAP_NAMESPACE};
pub use stats::{print_summary, CrawlStatistics};
