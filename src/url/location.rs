use crate::url::normalize::normalize_url;
use crate::UrlResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Canonical identity of a crawlable page
///
/// A `LocationId` is always built from a normalized URL, so two links that
/// point at the same page compare equal. It is the only key used for
/// deduplication: the visited set, the frontier and the record store all
/// index by it.
///
/// Serialized as the plain URL string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationId(Url);

impl LocationId {
    /// Parses and normalizes a raw URL string into a location identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_scribe::url::LocationId;
    ///
    /// let a = LocationId::parse("https://WWW.Example.com/wiki/Rust/#History").unwrap();
    /// let b = LocationId::parse("https://example.com/wiki/Rust").unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn parse(raw: &str) -> UrlResult<Self> {
        normalize_url(raw).map(Self)
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the lowercase host of this location
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for LocationId {
    type Error = crate::UrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LocationId> for String {
    fn from(value: LocationId) -> Self {
        value.0.into()
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_urls_share_identity() {
        let a = LocationId::parse("http://en.wikipedia.org/wiki/Rust?utm_source=x").unwrap();
        let b = LocationId::parse("http://EN.wikipedia.org/wiki/Rust#Syntax").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_non_http() {
        assert!(LocationId::parse("mailto:someone@example.com").is_err());
        assert!(LocationId::parse("not a url").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = LocationId::parse("https://example.com/wiki/Page").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"https://example.com/wiki/Page\"");

        let back: LocationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_invalid_fails() {
        let result: Result<LocationId, _> = serde_json::from_str("\"ftp://example.com/x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_host() {
        let id = LocationId::parse("https://Sub.Example.com/page").unwrap();
        assert_eq!(id.host(), Some("sub.example.com"));
    }
}
