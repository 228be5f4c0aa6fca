//! Site-Mapper: a same-site sitemap generator
//!
//! This crate crawls every page reachable from a seed URL on a single host,
//! breadth-first and up to a bounded depth, and writes the deduplicated set of
//! canonical URLs as a sitemap document.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Mapper operations
#[derive(Debug, Error)]
pub enum SiteMapperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed page URL {url}: {source}")]
    MalformedPageUrl { url: String, source: UrlError },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised when a string cannot become a [`url::CanonicalUrl`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Reasons a discovered href is not followed
///
/// These are expected, high-frequency outcomes of link filtering rather than
/// failures; the crawler skips the link and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("recursive or empty path")]
    RecursiveOrEmptyPath,

    #[error("external host: {0}")]
    ExternalHost(String),
}

/// Result type alias for Site-Mapper operations
pub type Result<T> = std::result::Result<T, SiteMapperError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Crawler, Fetcher, LinkExtractor};
pub use output::{OutputFormat, SitemapDocument};
pub use state::{CrawlPhase, CrawlState};
pub use url::{resolve, CanonicalUrl};
