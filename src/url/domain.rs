use url::Url;

/// Extracts the network location (`host[:port]`) from a URL
///
/// The host is lowercased by the URL parser. Default ports are omitted, so
/// `https://example.com:443/` yields `example.com` while
/// `http://127.0.0.1:8080/` yields `127.0.0.1:8080`.
///
/// # Returns
///
/// * `Some(String)` - The network location
/// * `None` - If the URL has no host (e.g. `mailto:` links)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use gleaner::url::netloc;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(netloc(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:3000/").unwrap();
/// assert_eq!(netloc(&url), Some("localhost:3000".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host.to_string()),
    }
}

/// Extracts the network location from a URL string, if it parses
pub fn netloc_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(netloc)
}
