//! Link resolution
//!
//! Turns an href found on a page into the canonical URL of an internal page,
//! or rejects it.

use crate::url::domain::is_same_site;
use crate::url::CanonicalUrl;
use crate::ResolveError;
use url::Url;

/// The components of an href, split per RFC 3986 before any resolution
#[derive(Debug, PartialEq, Eq)]
struct Reference<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
}

/// Resolves an href discovered on `page` into the canonical URL it points to
///
/// # Resolution Order
///
/// The first matching rule wins:
///
/// 1. Malformed href → `InvalidUrl`; a scheme other than `http`/`https` →
///    `UnsupportedScheme`
/// 2. Empty path (`""`, `#top`, `?q=1`, `http://example.com`) →
///    `RecursiveOrEmptyPath`
/// 3. Host equal to the page host (ignoring a `www.` prefix) → accepted as
///    the href made absolute
/// 4. Any other non-empty host → `ExternalHost`
/// 5. No host: the page's scheme and host are adopted
///    - a path starting with `/` replaces the page path
///    - any other path is joined onto the directory of the page path
///
/// # Examples
///
/// ```
/// use site_mapper::url::{resolve, CanonicalUrl};
///
/// let page = CanonicalUrl::parse("http://example.com/a/b").unwrap();
/// assert_eq!(resolve("c", &page).unwrap().as_str(), "http://example.com/a/c");
/// assert_eq!(resolve("/c", &page).unwrap().as_str(), "http://example.com/c");
/// assert!(resolve("http://other.com/x", &page).is_err());
/// ```
pub fn resolve(href: &str, page: &CanonicalUrl) -> Result<CanonicalUrl, ResolveError> {
    let reference = parse_reference(href)?;

    if let Some(scheme) = reference.scheme {
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return Err(ResolveError::UnsupportedScheme(scheme.to_lowercase()));
        }
    }

    // An opaque reference such as `http:foo` has no hierarchical path either
    let opaque = reference.scheme.is_some()
        && reference.authority.is_none()
        && !reference.path.starts_with('/');
    if reference.path.is_empty() || opaque {
        return Err(ResolveError::RecursiveOrEmptyPath);
    }

    if let Some(authority) = reference.authority.filter(|a| !a.is_empty()) {
        return resolve_absolute(&reference, authority, page);
    }

    // A leading `//` left over from an empty authority must stay a path
    let path = if reference.path.starts_with("//") {
        format!("/.{}", reference.path)
    } else {
        reference.path.to_string()
    };
    let relative = match reference.query {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };

    let url = page
        .as_url()
        .join(&relative)
        .map_err(|e| ResolveError::InvalidUrl(e.to_string()))?;

    CanonicalUrl::from_url(url).map_err(|e| ResolveError::InvalidUrl(e.to_string()))
}

/// Handles an href that names a host
fn resolve_absolute(
    reference: &Reference<'_>,
    authority: &str,
    page: &CanonicalUrl,
) -> Result<CanonicalUrl, ResolveError> {
    let scheme = reference.scheme.unwrap_or_else(|| page.as_url().scheme());
    let query = reference.query.map(|q| format!("?{}", q)).unwrap_or_default();

    let absolute = Url::parse(&format!(
        "{}://{}{}{}",
        scheme, authority, reference.path, query
    ))
    .map_err(|e| ResolveError::InvalidUrl(e.to_string()))?;

    let host = absolute.host_str().unwrap_or_default();
    if !is_same_site(host, page.host()) || absolute.port() != page.as_url().port() {
        return Err(ResolveError::ExternalHost(host.to_string()));
    }

    CanonicalUrl::from_url(absolute).map_err(|e| ResolveError::InvalidUrl(e.to_string()))
}

/// Splits an href into its components, rejecting malformed input
///
/// The fragment is discarded; it never changes the destination page.
fn parse_reference(href: &str) -> Result<Reference<'_>, ResolveError> {
    let href = href.trim();

    if let Some(c) = href.chars().find(|c| c.is_control()) {
        return Err(ResolveError::InvalidUrl(format!(
            "invalid control character {:?}",
            c
        )));
    }
    validate_percent_escapes(href)?;

    let href = href.split_once('#').map_or(href, |(head, _)| head);
    let (rest, query) = match href.split_once('?') {
        Some((rest, query)) => (rest, Some(query)),
        None => (href, None),
    };

    let (scheme, rest) = split_scheme(rest)?;

    let (authority, path) = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after.find('/').unwrap_or(after.len());
            (Some(&after[..end]), &after[end..])
        }
        None => (None, rest),
    };

    Ok(Reference {
        scheme,
        authority,
        path,
        query,
    })
}

/// Separates a leading `scheme:` from the rest of the reference
fn split_scheme(input: &str) -> Result<(Option<&str>, &str), ResolveError> {
    let Some(colon) = input.find(':') else {
        return Ok((None, input));
    };

    let candidate = &input[..colon];
    if candidate.contains('/') {
        return Ok((None, input));
    }

    let mut chars = candidate.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if valid {
        Ok((Some(candidate), &input[colon + 1..]))
    } else if colon == 0 {
        Err(ResolveError::InvalidUrl("missing scheme".to_string()))
    } else {
        Err(ResolveError::InvalidUrl(
            "first path segment contains a colon".to_string(),
        ))
    }
}

/// Every `%` must start a two-digit hex escape
fn validate_percent_escapes(input: &str) -> Result<(), ResolveError> {
    let bytes = input.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'%' {
            let ok = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !ok {
                return Err(ResolveError::InvalidUrl(format!(
                    "invalid percent escape at byte {}",
                    i
                )));
            }
        }
    }
    Ok(())
}
