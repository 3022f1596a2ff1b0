use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// IPv6 hosts keep their brackets (`[::1]`).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webscraper::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the robots.txt location for the origin of `url`
///
/// Scheme, host and port are kept; path, query and fragment are replaced.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webscraper::url::robots_txt_url;
///
/// let url = Url::parse("https://example.com:8443/a/b?c=d#e").unwrap();
/// assert_eq!(
///     robots_txt_url(&url).unwrap().as_str(),
///     "https://example.com:8443/robots.txt"
/// );
/// ```
pub fn robots_txt_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    url.join("/robots.txt").ok()
}
