//! HTML link extraction
//!
//! This module pulls every `<a href="...">` out of an HTML page together with
//! its anchor text. Hrefs are returned verbatim; deciding which of them are
//! internal pages is the resolver's job.

use crate::crawler::traits::{Link, LinkExtractor};
use scraper::{ElementRef, Html, Selector};

/// Link extractor for HTML pages, backed by `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &[u8]) -> Vec<Link> {
        parse_links(&String::from_utf8_lossy(body))
    }
}

/// Parses HTML content and extracts all anchor links
///
/// # Link Extraction Rules
///
/// - Every `<a>` element carrying an `href` attribute yields one link, in
///   document order
/// - Anchors without `href` are ignored
/// - The text is the anchor's trimmed text chunks joined by single spaces
///
/// # Example
///
/// ```
/// use site_mapper::crawler::parse_links;
///
/// let html = r#"<html><body><a href="/page">A <b>link</b></a></body></html>"#;
/// let links = parse_links(html);
/// assert_eq!(links[0].href, "/page");
/// assert_eq!(links[0].text, "A link");
/// ```
pub fn parse_links(html: &str) -> Vec<Link> {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            Some(Link::new(href, anchor_text(&element)))
        })
        .collect()
}

/// Collects the visible text of an anchor
fn anchor_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
