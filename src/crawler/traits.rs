//! Crawler collaborator traits and types
//!
//! The crawl loop only knows how to traverse; getting page bodies and pulling
//! links out of them happens behind these traits so that the loop can be
//! driven by real HTTP or by in-memory fakes.

use crate::url::CanonicalUrl;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching a page
///
/// A fetch error never aborts a crawl: the page stays in the visited set and
/// simply contributes no edges.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("{url} redirected off site to {location}")]
    OffSiteRedirect { url: String, location: String },

    #[error("Expected HTML from {url}, got {content_type}")]
    NotHtml { url: String, content_type: String },

    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// A raw link found in a page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// The `href` attribute, exactly as written
    pub href: String,

    /// The anchor text; not used for traversal
    pub text: String,
}

impl Link {
    /// Creates a link from an href and its anchor text
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// A fetched page body and the URL that served it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Where the body came from; differs from the requested URL after a redirect
    pub url: CanonicalUrl,
    pub body: Vec<u8>,
}

/// Trait for page fetchers
///
/// Implementations own transport concerns such as timeouts and redirects;
/// any of those failures is reported as a [`FetchError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the body of the page at `url`
    async fn fetch(&self, url: &CanonicalUrl) -> Result<Vec<u8>, FetchError>;

    /// Fetches the page at `url` along with the URL that finally served it
    ///
    /// Relative links in the body resolve against [`FetchedPage::url`]. The
    /// default assumes fetchers that never redirect.
    async fn fetch_page(&self, url: &CanonicalUrl) -> Result<FetchedPage, FetchError> {
        let body = self.fetch(url).await?;
        Ok(FetchedPage {
            url: url.clone(),
            body,
        })
    }
}

/// Trait for link extractors
pub trait LinkExtractor: Send + Sync {
    /// Extracts every `(href, text)` pair from a page body
    fn extract(&self, body: &[u8]) -> Vec<Link>;
}
