//! Sumi-Scribe: a resumable link-following page archiver
//!
//! This crate implements a crawler that fetches pages starting from a seed set,
//! extracts a structured record from each one, and follows outgoing links until
//! nothing unvisited remains. Every record is flushed to disk before its links
//! are expanded, so an interrupted crawl can be resumed without fetching any
//! page twice.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Scribe operations
///
/// Only storage failures and setup failures end up here. Per-page fetch and
/// extraction failures are handled inside the crawl loop and never abort a run.
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Record store error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid crawl transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScribeError {
    /// Returns true if the error came from the record store
    ///
    /// Store failures (corruption at load, failed flush) are the only errors
    /// the crawl loop itself can raise.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Failed to read seed file {path}: {source}")]
    Seeds {
        path: String,
        source: std::io::Error,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Scribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, StopHandle, StopReason};
pub use state::{CrawlPhase, Frontier, VisitedSet};
pub use storage::{JsonRecordStore, Record, RecordStore, SqliteRecordStore};
pub use url::{normalize_url, LinkFilter, LocationId};
