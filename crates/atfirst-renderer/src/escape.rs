//! HTML escaping and small URL helpers shared by every renderer.

use url::Url;

/// Escape text for use in HTML element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Only `http://` and `https://` links are ever emitted as anchors.
pub fn is_http_url(uri: &str) -> bool {
    uri.starts_with("https://") || uri.starts_with("http://")
}

/// Hostname of a URL, or the raw input when it does not parse.
pub fn hostname_or_raw(uri: &str) -> String {
    Url::parse(uri)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| uri.to_owned())
}

/// Record key: the last path segment of an `at://` URI.
pub fn rkey(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}
