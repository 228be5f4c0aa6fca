/// Returns the host used for same-site comparison
///
/// The host is lowercased and a single leading `www.` label is stripped, so
/// `www.example.com` and `example.com` compare equal.
///
/// # Examples
///
/// ```
/// use site_mapper::url::site_host;
///
/// assert_eq!(site_host("WWW.Example.com"), "example.com");
/// assert_eq!(site_host("blog.example.com"), "blog.example.com");
/// ```
pub fn site_host(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Checks whether two hosts belong to the same site
pub fn is_same_site(a: &str, b: &str) -> bool {
    site_host(a) == site_host(b)
}
