//! Integration tests for the crawler
//!
//! Most tests drive the crawl loop with an in-memory fetcher so that the
//! traversal rules can be checked without a network. The last tests use
//! wiremock to run the full HTTP crawl end-to-end.

use async_trait::async_trait;
use site_mapper::config::{Config, CrawlerConfig};
use site_mapper::crawler::{
    crawl, Crawler, FetchError, Fetcher, HtmlLinkExtractor, Link, LinkExtractor,
};
use site_mapper::output::{OutputFormat, SitemapDocument};
use site_mapper::{CanonicalUrl, SiteMapperError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher serving canned HTML bodies keyed by canonical URL
#[derive(Default)]
struct FakeFetcher {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn fetched(&self) -> HashSet<String> {
        self.calls.lock().unwrap().keys().cloned().collect()
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &CanonicalUrl) -> Result<Vec<u8>, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(url.as_str()) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            });
        }

        match self.pages.get(url.as_str()) {
            Some(body) => Ok(body.clone().into_bytes()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Extractor that panics on a marker body, to exercise task failure handling
struct PanickingExtractor;

impl LinkExtractor for PanickingExtractor {
    fn extract(&self, body: &[u8]) -> Vec<Link> {
        if body == b"boom" {
            panic!("extractor exploded");
        }
        HtmlLinkExtractor.extract(body)
    }
}

fn crawler_config(max_depth: u32) -> CrawlerConfig {
    CrawlerConfig {
        seed_url: None,
        max_depth,
        max_concurrent_fetches: 4,
    }
}

fn html(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!("<html><body>{}</body></html>", anchors)
}

fn crawler(max_depth: u32, fetcher: Arc<FakeFetcher>) -> Crawler {
    Crawler::new(crawler_config(max_depth), fetcher, Arc::new(HtmlLinkExtractor))
}

fn visited_set(visited: &[CanonicalUrl]) -> HashSet<String> {
    visited.iter().map(|u| u.to_string()).collect()
}

fn set(urls: &[&str]) -> HashSet<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn test_end_to_end_single_level() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(
                "http://example.com/",
                &html(&["/about", "http://external.com/"]),
            )
            .page("http://example.com/about", &html(&[])),
    );

    let report = crawler(1, Arc::clone(&fetcher))
        .crawl("http://example.com/")
        .await
        .unwrap();

    assert_eq!(
        visited_set(&report.visited),
        set(&["http://example.com/", "http://example.com/about"])
    );
    assert!(!report.contains("http://external.com/"));
    assert_eq!(report.pages_fetched, 2);
    assert!(report.failures.is_empty());
    assert_eq!(fetcher.calls_for("http://external.com/"), 0);
}

#[tokio::test]
async fn test_fetch_failure_is_isolated() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page("http://example.com/", &html(&["/about", "/blog"]))
            .page("http://example.com/about", &html(&["/hidden"]))
            .page("http://example.com/blog", &html(&["/post"]))
            .failing("http://example.com/about"),
    );

    let report = crawler(1, Arc::clone(&fetcher))
        .crawl("http://example.com/")
        .await
        .unwrap();

    assert!(report.contains("http://example.com/about"));
    assert!(!report.contains("http://example.com/hidden"));
    assert!(report.contains("http://example.com/post"));

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.url.as_str(), "http://example.com/about");
    assert_eq!(failure.depth, 1);
    assert!(failure.message.contains("500"));
}

#[tokio::test]
async fn test_no_duplicate_fetches() {
    // Every page links to every other page, in several spellings
    let links = [
        "/",
        "/a",
        "/b",
        "http://example.com/a#section",
        "http://www.example.com/b",
        "./a",
        "/a?",
    ];
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page("http://example.com/", &html(&links))
            .page("http://example.com/a", &html(&links))
            .page("http://example.com/b", &html(&links))
            .page("http://www.example.com/b", &html(&links)),
    );

    let report = crawler(5, Arc::clone(&fetcher))
        .crawl("http://example.com/")
        .await
        .unwrap();

    let unique: HashSet<_> = report.visited.iter().collect();
    assert_eq!(unique.len(), report.visited.len());

    for url in fetcher.fetched() {
        assert_eq!(fetcher.calls_for(&url), 1, "{} fetched more than once", url);
    }
    assert_eq!(fetcher.total_calls(), report.visited.len());
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page("http://example.com/", &html(&["/a"]))
            .page("http://example.com/a", &html(&["/b"])),
    );

    let report = crawler(0, Arc::clone(&fetcher))
        .crawl("http://example.com/")
        .await
        .unwrap();

    assert_eq!(
        visited_set(&report.visited),
        set(&["http://example.com/", "http://example.com/a"])
    );
    assert_eq!(fetcher.fetched(), set(&["http://example.com/"]));
    assert_eq!(report.levels_completed, 1);
}

#[tokio::test]
async fn test_depth_bound_on_chain() {
    // a -> b -> c -> d
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page("http://example.com/a", &html(&["/b"]))
            .page("http://example.com/b", &html(&["/c"]))
            .page("http://example.com/c", &html(&["/d"]))
            .page("http://example.com/d", &html(&[])),
    );

    let report = crawler(1, Arc::clone(&fetcher))
        .crawl("http://example.com/a")
        .await
        .unwrap();

    assert_eq!(
        fetcher.fetched(),
        set(&["http://example.com/a", "http://example.com/b"])
    );
    assert_eq!(
        visited_set(&report.visited),
        set(&[
            "http://example.com/a",
            "http://example.com/b",
            "http://example.com/c"
        ])
    );
    assert_eq!(report.urls_by_depth.get(&0), Some(&1));
    assert_eq!(report.urls_by_depth.get(&1), Some(&1));
    assert_eq!(report.urls_by_depth.get(&2), Some(&1));
}

#[tokio::test]
async fn test_url_fetched_at_first_discovered_depth() {
    // /deep is reachable at depth 1 from the seed and at depth 2 via /a
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page("http://example.com/", &html(&["/a", "/deep"]))
            .page("http://example.com/a", &html(&["/deep"]))
            .page("http://example.com/deep", &html(&[])),
    );

    let report = crawler(3, Arc::clone(&fetcher))
        .crawl("http://example.com/")
        .await
        .unwrap();

    assert_eq!(fetcher.calls_for("http://example.com/deep"), 1);
    assert_eq!(report.urls_by_depth.get(&1), Some(&2));
    assert_eq!(report.urls_by_depth.get(&2), None);
}

#[tokio::test]
async fn test_crawl_stops_when_frontier_empties() {
    let fetcher = Arc::new(FakeFetcher::new().page("http://example.com/", &html(&[])));

    let report = crawler(10, fetcher)
        .crawl("http://example.com/")
        .await
        .unwrap();

    assert_eq!(report.visited.len(), 1);
    assert_eq!(report.levels_completed, 1);
}

#[tokio::test]
async fn test_malformed_seed() {
    let fetcher = Arc::new(FakeFetcher::new());
    let crawler = crawler(1, Arc::clone(&fetcher));

    for seed in ["not a url", "ftp://example.com/", "/relative/path"] {
        let result = crawler.crawl(seed).await;
        assert!(
            matches!(result, Err(SiteMapperError::MalformedPageUrl { .. })),
            "seed {:?} should be rejected",
            seed
        );
    }
    assert_eq!(fetcher.total_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_discovery_enqueues_once() {
    // Twenty pages on level 1 all link to /shared while being fetched at once
    let mut fetcher = FakeFetcher::new().with_delay(Duration::from_millis(10));
    let mut seed_links = Vec::new();
    for i in 0..20 {
        let p = format!("/p{}", i);
        fetcher = fetcher.page(&format!("http://example.com{}", p), &html(&["/shared"]));
        seed_links.push(p);
    }
    let refs: Vec<&str> = seed_links.iter().map(String::as_str).collect();
    let fetcher = Arc::new(
        fetcher
            .page("http://example.com/", &html(&refs))
            .page("http://example.com/shared", &html(&[])),
    );

    let crawler = Crawler::new(
        CrawlerConfig {
            seed_url: None,
            max_depth: 2,
            max_concurrent_fetches: 20,
        },
        Arc::clone(&fetcher) as Arc<dyn Fetcher>,
        Arc::new(HtmlLinkExtractor),
    );
    let report = crawler.crawl("http://example.com/").await.unwrap();

    let shared: Vec<_> = report
        .visited
        .iter()
        .filter(|u| u.as_str() == "http://example.com/shared")
        .collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(fetcher.calls_for("http://example.com/shared"), 1);
    assert_eq!(report.visited.len(), 22);
}

#[tokio::test]
async fn test_crawler_is_reusable() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page("http://example.com/", &html(&["/a"]))
            .page("http://example.com/a", &html(&[])),
    );
    let crawler = crawler(1, Arc::clone(&fetcher));

    let first = crawler.crawl("http://example.com/").await.unwrap();
    let second = crawler.crawl("http://example.com/").await.unwrap();

    assert_eq!(first.visited, second.visited);
    assert_eq!(fetcher.calls_for("http://example.com/"), 2);
}

#[tokio::test]
async fn test_panicking_task_counts_as_failure() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page("http://example.com/", &html(&["/bad", "/good"]))
            .page("http://example.com/bad", "boom")
            .page("http://example.com/good", &html(&["/next"])),
    );
    let crawler = Crawler::new(
        crawler_config(1),
        fetcher,
        Arc::new(PanickingExtractor),
    );

    let report = crawler.crawl("http://example.com/").await.unwrap();

    assert!(report.contains("http://example.com/bad"));
    assert!(report.contains("http://example.com/next"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url.as_str(), "http://example.com/bad");
}

#[tokio::test]
async fn test_sitemap_lists_every_visited_url() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page("http://example.com/", &html(&["/a", "/b", "/a/c"]))
            .page("http://example.com/a", &html(&["c", "../b"])),
    );

    let report = crawler(2, fetcher)
        .crawl("http://example.com/")
        .await
        .unwrap();
    let xml = String::from_utf8(
        SitemapDocument::from_urls(&report.visited)
            .to_xml()
            .unwrap(),
    )
    .unwrap();

    assert_eq!(xml.matches("<loc>").count(), report.visited.len());
    for url in &report.visited {
        assert!(xml.contains(&format!("<loc>{}</loc>", url)));
    }
}

#[tokio::test]
async fn test_http_crawl_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let home = format!(
        r#"<html><head><title>Home</title></head><body>
        <a href="/page1">Page 1</a>
        <a href="{}/page2">Page 2</a>
        <a href="https://external.example.org/">Elsewhere</a>
        <a href="mailto:someone@example.com">Mail</a>
        </body></html>"#,
        base_url
    );

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(home, "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><a href="/page3">Page 3</a></body></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let sitemap_path = dir.path().join("sitemap.xml");

    let mut config = Config::default();
    config.crawler.seed_url = Some(format!("{}/", base_url));
    config.crawler.max_depth = 1;
    config.user_agent.request_timeout_secs = 5;

    let report = crawl(&config).await.unwrap();

    let expected: HashSet<String> = ["/", "/page1", "/page2", "/page3"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    assert_eq!(visited_set(&report.visited), expected);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.pages_fetched, 2);

    SitemapDocument::from_urls(&report.visited)
        .write_to_path(&sitemap_path, OutputFormat::Xml)
        .unwrap();
    let xml = std::fs::read_to_string(&sitemap_path).unwrap();
    assert_eq!(xml.matches("<loc>").count(), 4);
    assert!(xml.contains(&format!("<loc>{}/page3</loc>", base_url)));
    assert!(!xml.contains("external.example.org"));
}

#[tokio::test]
async fn test_crawl_requires_seed() {
    let result = crawl(&Config::default()).await;
    assert!(matches!(result, Err(SiteMapperError::Config(_))));
}

fn http_config(seed: String, max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = Some(seed);
    config.crawler.max_depth = max_depth;
    config.user_agent.request_timeout_secs = 5;
    config
}

#[tokio::test]
async fn test_off_site_redirect_contributes_no_links() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/landing", other.uri()).as_str()),
        )
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<a href="/ghost">Ghost</a><a href="other-page">Other</a>"#,
            "text/html",
        ))
        .mount(&other)
        .await;

    let report = crawl(&http_config(format!("{}/", site.uri()), 0))
        .await
        .unwrap();

    assert_eq!(visited_set(&report.visited), set(&[format!("{}/", site.uri()).as_str()]));
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("redirected off site"));
}

#[tokio::test]
async fn test_same_site_redirect_resolves_against_target() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"<a href="/old">Old</a>"#, "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/a/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a/new"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"<a href="sibling">Sibling</a>"#, "text/html"),
        )
        .mount(&server)
        .await;

    let report = crawl(&http_config(format!("{}/", base_url), 1))
        .await
        .unwrap();

    let expected: HashSet<String> = ["/", "/old", "/a/new", "/a/sibling"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    assert_eq!(visited_set(&report.visited), expected);
    assert!(!report.contains(&format!("{}/sibling", base_url)));
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_timed_out_page_is_recorded_as_failure() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"<a href="/slow">Slow</a>"#, "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = http_config(format!("{}/", base_url), 1);
    config.user_agent.request_timeout_secs = 1;
    let report = crawl(&config).await.unwrap();

    let slow = format!("{}/slow", base_url);
    assert!(report.contains(&slow));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url.as_str(), slow);
    assert!(report.failures[0].message.contains("timeout"));
    assert_eq!(report.pages_fetched, 1);
}
