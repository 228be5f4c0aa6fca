//! URL handling module for Site-Mapper
//!
//! This module provides URL canonicalization, same-site host comparison and
//! the resolver that turns discovered hrefs into internal page URLs.

mod domain;
mod normalize;
mod resolve;

// Re-export main types and functions
pub use domain::{is_same_site, site_host};
pub use normalize::CanonicalUrl;
pub use resolve::resolve;
