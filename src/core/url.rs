//! URL path type for type-safe node and request URL handling.
//!
//! - Internal representation: decoded, root-relative, no query or fragment
//! - External URLs (scheme prefix `http` or `ftp`) are percent-encoded and
//!   treated as opaque identifiers, never as site paths

use std::borrow::Borrow;
use std::sync::Arc;

use serde::Serialize;

/// Normalized URL of a navigation node or inbound request.
///
/// Invariants:
/// - Site-relative URLs always start with `/`
/// - Query strings and fragments are stripped, percent-encoding decoded
/// - App-relative syntax (`~/about`) becomes root-relative (`/about`)
/// - External URLs keep their full percent-encoded form
///
/// Equality and hashing are case-sensitive on the stored form; the URL
/// index folds case through [`UrlPath::index_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlPath {
    path: Arc<str>,
    external: bool,
}

impl UrlPath {
    /// Create from a node-declared URL. Empty input yields `None`.
    ///
    /// Scheme-prefixed values are percent-encoded wholesale and flagged
    /// external; everything else is normalized to a root-relative path.
    pub fn from_authored(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if Self::has_scheme_prefix(trimmed) {
            use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
            let encoded = utf8_percent_encode(trimmed, NON_ALPHANUMERIC).to_string();
            return Some(Self {
                path: Arc::from(encoded),
                external: true,
            });
        }
        Some(Self::normalize(trimmed))
    }

    /// Create from an inbound request path.
    ///
    /// Applies the same normalization as [`UrlPath::from_authored`] so that
    /// request lookups and index keys always agree.
    pub fn from_request(raw: &str) -> Option<Self> {
        Self::from_authored(raw)
    }

    fn has_scheme_prefix(raw: &str) -> bool {
        raw.starts_with("http") || raw.starts_with("ftp")
    }

    /// Normalize a site-relative path: strip query/fragment, decode, and
    /// translate app-relative (`~/x`) syntax to root-relative.
    fn normalize(raw: &str) -> Self {
        let raw = raw.strip_prefix('~').unwrap_or(raw);
        let path = Self::strip_query_fragment(raw);
        let with_leading = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            path: Arc::from(with_leading),
            external: false,
        }
    }

    /// Strip query string and fragment from a path using the url crate.
    fn strip_query_fragment(path: &str) -> String {
        use percent_encoding::percent_decode_str;

        // A dummy base URL lets the url crate parse bare paths
        static BASE: std::sync::OnceLock<url::Url> = std::sync::OnceLock::new();
        let base = BASE.get_or_init(|| url::Url::parse("http://x").expect("static base URL"));

        match base.join(path) {
            Ok(parsed) => {
                // url crate returns a percent-encoded path, decode it
                percent_decode_str(parsed.path())
                    .decode_utf8()
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| parsed.path().to_string())
            }
            // Fallback to simple split if url parsing fails
            Err(_) => path.split(['?', '#']).next().unwrap_or(path).to_string(),
        }
    }

    /// Get the normalized URL as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Case-folded form used as the URL index key.
    pub fn index_key(&self) -> String {
        self.path.to_lowercase()
    }

    /// Whether this URL is an external, opaque identifier.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.external
    }
}

impl std::fmt::Display for UrlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl AsRef<str> for UrlPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl Borrow<str> for UrlPath {
    fn borrow(&self) -> &str {
        &self.path
    }
}

impl PartialEq<str> for UrlPath {
    fn eq(&self, other: &str) -> bool {
        self.path.as_ref() == other
    }
}

impl PartialEq<&str> for UrlPath {
    fn eq(&self, other: &&str) -> bool {
        self.path.as_ref() == *other
    }
}

impl Serialize for UrlPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.path.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_authored_adds_leading_slash() {
        let url = UrlPath::from_authored("about").unwrap();
        assert_eq!(url.as_str(), "/about");
    }

    #[test]
    fn test_from_authored_app_relative() {
        let url = UrlPath::from_authored("~/admin/users").unwrap();
        assert_eq!(url.as_str(), "/admin/users");
    }

    #[test]
    fn test_from_authored_empty_is_none() {
        assert!(UrlPath::from_authored("").is_none());
        assert!(UrlPath::from_authored("   ").is_none());
    }

    #[test]
    fn test_from_authored_strips_query_and_fragment() {
        let url = UrlPath::from_authored("/posts/hello?v=1#section").unwrap();
        assert_eq!(url.as_str(), "/posts/hello");
    }

    #[test]
    fn test_from_request_decodes() {
        let url = UrlPath::from_request("/posts/hello%20world").unwrap();
        assert_eq!(url.as_str(), "/posts/hello world");
    }

    #[test]
    fn test_external_http_is_encoded_and_opaque() {
        let url = UrlPath::from_authored("http://example.com/a b").unwrap();
        assert!(url.is_external());
        assert!(!url.as_str().contains(' '));
        assert!(url.as_str().to_lowercase().starts_with("http"));
    }

    #[test]
    fn test_external_ftp() {
        let url = UrlPath::from_authored("ftp://files.example.com/x").unwrap();
        assert!(url.is_external());
    }

    #[test]
    fn test_internal_is_not_external() {
        let url = UrlPath::from_authored("/about").unwrap();
        assert!(!url.is_external());
    }

    #[test]
    fn test_index_key_folds_case() {
        let a = UrlPath::from_authored("/About/Us").unwrap();
        let b = UrlPath::from_authored("/about/us").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.index_key(), b.index_key());
    }

    #[test]
    fn test_request_and_authored_agree() {
        let authored = UrlPath::from_authored("about").unwrap();
        let requested = UrlPath::from_request("/about?utm=1").unwrap();
        assert_eq!(authored.index_key(), requested.index_key());
    }

    #[test]
    fn test_display() {
        let url = UrlPath::from_authored("/posts/hello").unwrap();
        assert_eq!(format!("{}", url), "/posts/hello");
    }
}
