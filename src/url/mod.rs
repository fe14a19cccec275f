//! URL handling module for Sumi-Scribe
//!
//! This module provides URL normalization, the [`LocationId`] identity type,
//! wildcard domain matching, and the pluggable link scope policy.

mod location;
mod matcher;
mod normalize;
mod scope;

pub use location::LocationId;
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;
pub use scope::{ArticleNamespaceRule, DomainRule, LinkFilter, LinkVerdict, ScopeRule};
