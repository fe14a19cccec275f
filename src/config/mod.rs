//! Configuration module for Sumi-Scribe
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and reading the seed list.
//!
//! # Example
//!
//! ```no_run
//! use sumi_scribe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Records go to: {}", config.output.records_path);
//! ```

mod parser;
mod seeds;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, ExtractorConfig, OutputConfig, ScopeConfig, SeedConfig, StoreFormat,
    UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use seeds::{load_seeds, read_seed_file};
