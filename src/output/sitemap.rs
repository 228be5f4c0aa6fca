//! Sitemap document serialization
//!
//! Produces the sitemaps.org `urlset` format:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url><loc>https://example.com/</loc></url>
//! </urlset>
//! ```

use crate::url::CanonicalUrl;
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use sxd_document::{writer, Package};
use thiserror::Error;

/// Namespace of the sitemaps.org protocol
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Errors raised while rendering or writing a sitemap
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize sitemap XML: {0}")]
    Xml(String),

    #[error("Failed to write sitemap: {0}")]
    Io(#[from] std::io::Error),
}

/// Sitemap file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// sitemaps.org XML
    #[default]
    Xml,

    /// One URL per line
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => write!(f, "xml"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// One `<url>` entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SitemapEntry {
    pub loc: String,
}

/// The set of page locations produced by a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    entries: Vec<SitemapEntry>,
}

impl SitemapDocument {
    /// Builds a document with one entry per distinct URL, sorted
    pub fn from_urls(urls: &[CanonicalUrl]) -> Self {
        let mut entries: Vec<SitemapEntry> = urls
            .iter()
            .map(|url| SitemapEntry {
                loc: url.to_string(),
            })
            .collect();
        entries.sort();
        entries.dedup();

        Self { entries }
    }

    pub fn entries(&self) -> &[SitemapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the sitemaps.org XML document, declaration included
    pub fn to_xml(&self) -> Result<Vec<u8>, OutputError> {
        let package = Package::new();
        let doc = package.as_document();

        let urlset = doc.create_element("urlset");
        urlset.set_attribute_value("xmlns", SITEMAP_NAMESPACE);
        doc.root().append_child(urlset);

        for entry in &self.entries {
            let url = doc.create_element("url");
            let loc = doc.create_element("loc");
            loc.set_text(&entry.loc);
            url.append_child(loc);
            urlset.append_child(url);
        }

        let mut out = Vec::new();
        writer::format_document(&doc, &mut out).map_err(|e| OutputError::Xml(e.to_string()))?;
        out.push(b'\n');
        Ok(out)
    }

    /// Renders one URL per line
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}\n", entry.loc))
            .collect()
    }

    /// Renders the document in `format`
    pub fn render(&self, format: OutputFormat) -> Result<Vec<u8>, OutputError> {
        match format {
            OutputFormat::Xml => self.to_xml(),
            OutputFormat::Text => Ok(self.to_text().into_bytes()),
        }
    }

    /// Writes the document to `path`, replacing any existing file
    pub fn write_to_path(&self, path: &Path, format: OutputFormat) -> Result<(), OutputError> {
        let bytes = self.render(format)?;
        std::fs::write(path, bytes)?;
        tracing::info!(
            "Wrote {} sitemap entries to {} ({})",
            self.len(),
            path.display(),
            format
        );
        Ok(())
    }
}
