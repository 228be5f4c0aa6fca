use crate::UrlError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A normalized absolute URL used as the identity key of a page
///
/// Two pages are the same entity iff their canonical strings are equal, so
/// every URL entering the crawl (the seed and every resolved edge) passes
/// through [`CanonicalUrl::from_url`].
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme
/// 3. Require a non-empty host
/// 4. Lowercase scheme and host, drop default ports and remove dot segments
///    (done by the `url` parser)
/// 5. Remove the fragment
/// 6. Remove an empty query string (trailing `?`)
/// 7. Uppercase the hex digits of percent escapes in path and query
///
/// Query parameter order and trailing slashes are preserved, and the host
/// keeps any `www.` prefix.
///
/// # Examples
///
/// ```
/// use site_mapper::url::CanonicalUrl;
///
/// let url = CanonicalUrl::parse("HTTP://Example.COM:80/a/./b%2fc?#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/a/b%2Fc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Parses and canonicalizes a URL string
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        Self::from_url(url)
    }

    /// Canonicalizes an already parsed URL
    pub fn from_url(mut url: Url) -> Result<Self, UrlError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(UrlError::MissingHost),
        }

        url.set_fragment(None);

        if url.query() == Some("") {
            url.set_query(None);
        }

        let path = uppercase_percent_escapes(url.path());
        if path != url.path() {
            url.set_path(&path);
        }

        if let Some(query) = url.query() {
            let normalized = uppercase_percent_escapes(query);
            if normalized != query {
                url.set_query(Some(&normalized));
            }
        }

        Ok(Self(url))
    }

    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host; always present for a canonical URL
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Consumes the URL and returns its canonical string
    pub fn into_string(self) -> String {
        self.0.into()
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for CanonicalUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Uppercases the two hex digits following every `%`
///
/// Malformed escapes are left untouched.
fn uppercase_percent_escapes(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            out.push('%');
            out.push(bytes[i + 1].to_ascii_uppercase() as char);
            out.push(bytes[i + 2].to_ascii_uppercase() as char);
            i += 3;
        } else {
            let ch = input[i..].chars().next().unwrap_or_default();
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    out
}
