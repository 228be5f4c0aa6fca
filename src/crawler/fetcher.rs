//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Redirect handling (delegated to reqwest, at most 10 hops)
//! - Error classification

use crate::config::UserAgentConfig;
use crate::crawler::traits::{FetchError, FetchedPage, Fetcher};
use crate::url::{is_same_site, CanonicalUrl};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use site_mapper::config::UserAgentConfig;
/// use site_mapper::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher that retrieves pages over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from the user agent config
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &CanonicalUrl) -> Result<Vec<u8>, FetchError> {
        Ok(self.fetch_page(url).await?.body)
    }

    /// Fetches a page body and the URL it was served from
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx with HTML or no Content-Type | page |
    /// | redirected to another host or port | `OffSiteRedirect` |
    /// | 2xx with another Content-Type | `NotHtml` |
    /// | non-2xx after redirects | `Status` |
    /// | timeout | `Timeout` |
    /// | connection, TLS or redirect failure | `Transport` |
    async fn fetch_page(&self, url: &CanonicalUrl) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let final_url = served_from(url, response.url())?;
        if &final_url != url {
            tracing::debug!("{} redirected to {}", url, final_url);
        }

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !is_html(&content_type) {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(FetchedPage {
            url: final_url,
            body: body.to_vec(),
        })
    }
}

/// Checks that the response came from the requested site and canonicalizes its URL
///
/// The host must match modulo `www.` and the port must match exactly.
fn served_from(requested: &CanonicalUrl, final_url: &Url) -> Result<CanonicalUrl, FetchError> {
    let off_site = || FetchError::OffSiteRedirect {
        url: requested.to_string(),
        location: final_url.to_string(),
    };

    let host = final_url.host_str().ok_or_else(off_site)?;
    if !is_same_site(host, requested.host()) || final_url.port() != requested.as_url().port() {
        return Err(off_site());
    }

    CanonicalUrl::from_url(final_url.clone()).map_err(|_| off_site())
}

/// Maps a reqwest send error onto a fetch error
fn classify_error(url: &CanonicalUrl, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Checks whether a Content-Type header denotes an HTML document
fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}
