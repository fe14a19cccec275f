//! Page extraction
//!
//! This module turns fetched HTML into the parts of a [`Record`]:
//! - Title and body text, found through ordered selector fallbacks
//! - Outgoing links (from `<a href>` tags), resolved and normalized
//! - A provenance timestamp, when the page states one
//! - The page's revision history link, for pages that don't
//!
//! [`Record`]: crate::storage::Record

use crate::config::ExtractorConfig;
use crate::url::LocationId;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use thiserror::Error;
use url::Url;

/// Everything extracted from a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub body: String,
    pub outgoing: BTreeSet<LocationId>,
    pub provenance_timestamp: Option<String>,
    /// Revision history page, consulted when no timestamp was found in the page
    pub history: Option<LocationId>,
}

/// The page did not have the shape the extractor expects
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No {element} element matched any of: {selectors}")]
    MissingElement {
        element: &'static str,
        selectors: String,
    },
}

/// Turns raw page content into record parts
pub trait Extractor: Send + Sync {
    fn extract(&self, location: &LocationId, content: &str) -> Result<ExtractedPage, ExtractError>;

    /// Reads the oldest revision timestamp from a revision history page
    fn extract_revision_timestamp(&self, _content: &str) -> Option<String> {
        None
    }
}

/// Selector-driven HTML extractor
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    title_selectors: Vec<(String, Selector)>,
    body_selectors: Vec<(String, Selector)>,
    links: Selector,
    published_meta: Selector,
    time_element: Selector,
    history_links: Vec<Selector>,
    revision_date: Selector,
}

impl HtmlExtractor {
    /// Builds an extractor from the `[extractor]` section
    ///
    /// # Returns
    ///
    /// * `Ok(HtmlExtractor)` - All selectors compiled
    /// * `Err(ConfigError::Validation)` - A configured selector is not valid CSS
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title_selectors: compile_all(&config.title_selectors)?,
            body_selectors: compile_all(&config.body_selectors)?,
            links: compile("a[href]")?,
            published_meta: compile(r#"meta[property="article:published_time"]"#)?,
            time_element: compile("time[datetime]")?,
            history_links: vec![
                compile("li#ca-history a[href]")?,
                compile(r#"a[href*="action=history"]"#)?,
            ],
            revision_date: compile("a.mw-changeslist-date")?,
        })
    }

    fn first_match<'a>(
        document: &'a Html,
        selectors: &[(String, Selector)],
    ) -> Option<ElementRef<'a>> {
        selectors
            .iter()
            .find_map(|(_, selector)| document.select(selector).next())
    }

    fn describe(selectors: &[(String, Selector)]) -> String {
        selectors
            .iter()
            .map(|(source, _)| source.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn extract_links(&self, document: &Html, base: &Url, own: &LocationId) -> BTreeSet<LocationId> {
        let mut links = BTreeSet::new();

        for element in document.select(&self.links) {
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };

            if let Some(link) = resolve_link(href, base) {
                if &link != own {
                    links.insert(link);
                }
            }
        }

        links
    }

    fn extract_provenance(&self, document: &Html) -> Option<String> {
        let from_meta = document
            .select(&self.published_meta)
            .find_map(|el| el.value().attr("content"));
        let from_time = || {
            document
                .select(&self.time_element)
                .find_map(|el| el.value().attr("datetime"))
        };

        from_meta
            .or_else(from_time)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn extract_history(&self, document: &Html, base: &Url) -> Option<LocationId> {
        self.history_links.iter().find_map(|selector| {
            document
                .select(selector)
                .filter_map(|el| el.value().attr("href"))
                .find_map(|href| resolve_link(href, base))
        })
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, location: &LocationId, content: &str) -> Result<ExtractedPage, ExtractError> {
        let document = Html::parse_document(content);
        let base = location.as_url();

        let title = Self::first_match(&document, &self.title_selectors)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExtractError::MissingElement {
                element: "title",
                selectors: Self::describe(&self.title_selectors),
            })?;

        let body = Self::first_match(&document, &self.body_selectors)
            .map(|el| body_text(&el))
            .ok_or_else(|| ExtractError::MissingElement {
                element: "body",
                selectors: Self::describe(&self.body_selectors),
            })?;

        Ok(ExtractedPage {
            title,
            body,
            outgoing: self.extract_links(&document, base, location),
            provenance_timestamp: self.extract_provenance(&document),
            history: self.extract_history(&document, base),
        })
    }

    fn extract_revision_timestamp(&self, content: &str) -> Option<String> {
        let document = Html::parse_document(content);

        document
            .select(&self.revision_date)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty())
    }
}

/// Builds the history query that lists only the oldest revision
pub fn oldest_revision_location(history: &LocationId) -> Option<LocationId> {
    let mut url = history.as_url().clone();

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "dir" && k != "limit")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("dir", "prev")
        .append_pair("limit", "1");

    LocationId::parse(url.as_str()).ok()
}

fn compile(source: &str) -> Result<Selector, ConfigError> {
    Selector::parse(source)
        .map_err(|e| ConfigError::Validation(format!("Invalid selector '{}': {:?}", source, e)))
}

fn compile_all(sources: &[String]) -> Result<Vec<(String, Selector)>, ConfigError> {
    sources
        .iter()
        .map(|s| compile(s).map(|sel| (s.clone(), sel)))
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element, one trimmed non-empty line per line of text
fn body_text(element: &ElementRef<'_>) -> String {
    let raw = element.text().collect::<String>();

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolves a link href against the page and normalizes it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Anything that does not resolve to a valid http(s) location
fn resolve_link(href: &str, base: &Url) -> Option<LocationId> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    LocationId::parse(absolute.as_str()).ok()
}
