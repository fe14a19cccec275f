//! Link scope policy
//!
//! Decides which discovered links are worth adding to the frontier. The policy
//! is a list of [`ScopeRule`]s, each a pure predicate over a location; a link is
//! admitted only if every rule accepts it and it has not been visited yet.

use crate::config::ScopeConfig;
use crate::state::VisitedSet;
use crate::url::{matches_wildcard, LocationId};

/// A pure, stateless predicate deciding whether a location is in scope
pub trait ScopeRule: Send + Sync {
    /// Short name used in log output when the rule rejects a link
    fn name(&self) -> &'static str;

    /// Returns true if the location may be crawled
    fn allows(&self, location: &LocationId) -> bool;
}

/// Accepts only content pages under an article path prefix
///
/// A link like `/wiki/Rust` is a content page; `/wiki/Special:Random` or
/// `/wiki/Talk:Rust` live in an administrative namespace and are rejected, as
/// is anything outside the prefix (`/w/index.php?...`).
#[derive(Debug, Clone)]
pub struct ArticleNamespaceRule {
    prefix: String,
    excluded: Vec<String>,
}

impl ArticleNamespaceRule {
    pub fn new(prefix: impl Into<String>, excluded: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            excluded,
        }
    }
}

impl ScopeRule for ArticleNamespaceRule {
    fn name(&self) -> &'static str {
        "article-namespace"
    }

    fn allows(&self, location: &LocationId) -> bool {
        let Some(title) = location.as_url().path().strip_prefix(&self.prefix) else {
            return false;
        };

        if title.is_empty() {
            return false;
        }

        !self.excluded.iter().any(|namespace| {
            title
                .strip_prefix(namespace.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
        })
    }
}

/// Accepts only locations whose host matches one of a set of domain patterns
///
/// An empty pattern list accepts every host.
#[derive(Debug, Clone, Default)]
pub struct DomainRule {
    patterns: Vec<String>,
}

impl DomainRule {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }
}

impl ScopeRule for DomainRule {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn allows(&self, location: &LocationId) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        match location.host() {
            Some(host) => self.patterns.iter().any(|p| matches_wildcard(p, host)),
            None => false,
        }
    }
}

/// Outcome of running a candidate link through the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVerdict {
    /// The link should be added to the frontier
    Admit,
    /// The link was already processed
    Visited,
    /// A scope rule rejected the link
    OutOfScope(&'static str),
}

/// Composed scope policy applied to every outgoing link
#[derive(Default)]
pub struct LinkFilter {
    rules: Vec<Box<dyn ScopeRule>>,
}

impl LinkFilter {
    /// Creates a filter with no scope rules (only visited links are rejected)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the filter described by the `[scope]` config section
    pub fn from_config(config: &ScopeConfig) -> Self {
        let mut filter = Self::new();

        if !config.article_prefix.is_empty() {
            filter = filter.with_rule(ArticleNamespaceRule::new(
                config.article_prefix.clone(),
                config.excluded_namespaces.clone(),
            ));
        }

        if !config.domains.is_empty() {
            filter = filter.with_rule(DomainRule::new(config.domains.clone()));
        }

        filter
    }

    /// Adds a rule; all rules must accept a link for it to be admitted
    pub fn with_rule<R: ScopeRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Returns true if every scope rule accepts the location
    pub fn in_scope(&self, location: &LocationId) -> bool {
        self.rules.iter().all(|rule| rule.allows(location))
    }

    /// Classifies a candidate link against the scope rules and the visited set
    pub fn judge(&self, candidate: &LocationId, visited: &VisitedSet) -> LinkVerdict {
        if let Some(rule) = self.rules.iter().find(|rule| !rule.allows(candidate)) {
            return LinkVerdict::OutOfScope(rule.name());
        }

        if visited.contains(candidate) {
            return LinkVerdict::Visited;
        }

        LinkVerdict::Admit
    }

    /// Returns the number of scope rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
