use serde::Serialize;
use url::Url;

/// One scraped post, held in memory for the duration of a run and written
/// out once as a CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    /// Handle parsed from the post URL path (falls back to "unknown")
    pub author: String,
    /// Cleaned body text, or the "Content not available" placeholder
    pub content: String,
    /// Reaction count as shown on the page; free-form text, not parsed
    pub reactions: String,
    /// Comment texts, first span (the post body) and blanks dropped
    pub comments: Vec<String>,
    /// Hashtags in order of first appearance, duplicates kept
    pub hashtags: Vec<String>,
    /// Source post URL
    pub url: String,
}

/// Raw per-URL capture before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPost {
    /// Text from the primary content selector, if it matched
    pub primary: Option<String>,
    /// Text from the alternate selector, tried when the primary missed
    pub alternate: Option<String>,
    /// Text of the reactions element, if present
    pub reactions: Option<String>,
    /// Texts of all comment spans, body span included
    pub comments: Vec<String>,
}

/// Parse the author handle from a post URL.
///
/// Instagram post links carry the interesting segment second in the path
/// (`/{handle-or-shortcode}/...` after the host).
pub fn author_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.nth(1).map(|s| s.to_string()))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
