use crate::UrlError;
use url::Url;

/// Query parameters that never change which page is served
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "mc_eid", "ref", "source", "oldformat", "wprov",
];

/// Normalizes a URL into the canonical form used for location identity
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Lowercase the host and drop a leading `www.`
/// 4. Collapse duplicate slashes and dot segments, drop the trailing slash
///    (the root path stays `/`)
/// 5. Drop the fragment
/// 6. Drop tracking query parameters (`utm_*` and friends) and sort the rest
///
/// The scheme is kept as given, so `http://` and `https://` variants of a page
/// are distinct locations.
///
/// # Examples
///
/// ```
/// use sumi_scribe::url::normalize_url;
///
/// let url = normalize_url("https://WWW.EXAMPLE.COM/wiki/Page/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/wiki/Page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .map(canonical_host)
        .ok_or(UrlError::MissingDomain)?;
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

fn canonical_host(host: &str) -> String {
    let lower = host.to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Removes empty and dot segments, then the trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
