//! Crawl summary reporting
//!
//! This module turns a [`CrawlReport`] into the short statistics block the
//! CLI prints once the sitemap has been written.

use crate::crawler::CrawlReport;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Total number of URLs in the sitemap
    pub total_urls: usize,

    /// Number of pages fetched successfully
    pub pages_fetched: usize,

    /// Number of failed fetches
    pub pages_failed: usize,

    /// URLs discovered at each depth
    pub urls_by_depth: BTreeMap<u32, usize>,

    /// Levels processed
    pub levels_completed: u32,

    /// Wall-clock duration in milliseconds
    pub duration_ms: i64,
}

impl CrawlStatistics {
    /// Derives statistics from a finished crawl
    pub fn from_report(report: &CrawlReport) -> Self {
        Self {
            total_urls: report.visited_len(),
            pages_fetched: report.pages_fetched,
            pages_failed: report.failures.len(),
            urls_by_depth: report.urls_by_depth.clone(),
            levels_completed: report.levels_completed,
            duration_ms: report.duration().num_milliseconds(),
        }
    }

    /// Share of attempted fetches that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_fetched + self.pages_failed;
        if attempted > 0 {
            (self.pages_fetched as f64 / attempted as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints a summary of the crawl to stdout
pub fn print_summary(report: &CrawlReport) {
    let stats = CrawlStatistics::from_report(report);

    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  URLs in sitemap: {}", stats.total_urls);
    println!(
        "  Levels completed: {} (max depth {})",
        stats.levels_completed, report.max_depth
    );
    println!("  Duration: {:.2}s", stats.duration_ms as f64 / 1000.0);
    println!();

    println!("URLs by Depth:");
    for (depth, count) in &stats.urls_by_depth {
        println!("  {}: {}", depth, count);
    }
    println!();

    if !report.failures.is_empty() {
        println!("Failed Pages ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  - {} (depth {}): {}", failure.url, failure.depth, failure.message);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched)",
        stats.success_rate(),
        stats.pages_fetched,
        stats.pages_fetched + stats.pages_failed
    );
}
