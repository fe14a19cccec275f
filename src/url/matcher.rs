/// Checks whether a host falls under a scope domain pattern
///
/// Two pattern forms are supported:
/// 1. Exact: `en.wikipedia.org` matches only that host
/// 2. Wildcard: `*.wikipedia.org` matches `wikipedia.org` itself and any
///    subdomain at any depth
///
/// Comparison ignores ASCII case on both sides.
///
/// # Examples
///
/// ```
/// use sumi_scribe::url::matches_wildcard;
///
/// assert!(matches_wildcard("en.wikipedia.org", "en.wikipedia.org"));
/// assert!(!matches_wildcard("en.wikipedia.org", "de.wikipedia.org"));
///
/// assert!(matches_wildcard("*.wikipedia.org", "wikipedia.org"));
/// assert!(matches_wildcard("*.wikipedia.org", "de.m.wikipedia.org"));
/// assert!(!matches_wildcard("*.wikipedia.org", "wikipedia.com"));
/// ```
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}
