use crate::output::OutputFormat;
use serde::Deserialize;

/// Main configuration structure for Site-Mapper
///
/// Every section is optional in the TOML file; missing values take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: Option<String>,

    /// Deepest level that is fetched; links found there are recorded only
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of fetches in flight within one level
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: None,
            max_depth: 2,
            max_concurrent_fetches: 8,
        }
    }
}

/// User agent identification and HTTP configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "site-mapper".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            request_timeout_secs: 30,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn user_agent_string(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path the sitemap is written to
    #[serde(rename = "sitemap-path")]
    pub sitemap_path: String,

    /// Sitemap document format
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sitemap_path: "sitemap.xml".to_string(),
            format: OutputFormat::Xml,
        }
    }
}
