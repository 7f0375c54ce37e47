use crate::{UrlError, UrlResult};
use url::Url;

/// Parses the crawl's base URL
///
/// Only HTTP(S) URLs with a host are accepted. The returned URL is in the
/// `url` crate's serialized form, so `https://x.test` becomes `https://x.test/`
/// and compares equal to links that resolve to the site root.
///
/// # Examples
///
/// ```
/// use site_harvester::url::parse_base_url;
///
/// let base = parse_base_url("https://x.test").unwrap();
/// assert_eq!(base.as_str(), "https://x.test/");
/// ```
pub fn parse_base_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Resolves an href against a base URL
///
/// This is plain join-resolution: relative hrefs become absolute, absolute
/// hrefs are re-serialized. No further canonicalization happens, so two
/// links are the same page exactly when their resolved strings are equal.
///
/// # Returns
///
/// * `Some(String)` - The absolute URL
/// * `None` - The href is empty or cannot be joined
///
/// # Examples
///
/// ```
/// use site_harvester::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://x.test/").unwrap();
/// assert_eq!(resolve_link("doc1.pdf", &base), Some("https://x.test/doc1.pdf".to_string()));
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    base_url.join(href).ok().map(|url| url.to_string())
}

/// Returns the last non-empty path segment of a URL
///
/// This is the file name a downloaded asset is stored under. Percent-encoded
/// characters are decoded. Segments that do not decode to UTF-8 and names
/// that could escape the download folder are refused.
pub fn url_basename(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .to_string();

    let decoded = urlencoding::decode(&segment).ok()?.into_owned();

    if decoded == "." || decoded == ".." || decoded.contains('/') || decoded.contains('\\') {
        return None;
    }

    Some(decoded)
}
