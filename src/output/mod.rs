//! Output module for reporting on stored records
//!
//! This module handles:
//! - Computing statistics over the record store
//! - Generating markdown summaries of stored records

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, StoreStatistics};

use crate::config::OutputConfig;
use crate::storage::{open_store, Record};
use crate::Result;

/// Reads every record from the configured store
///
/// # Arguments
///
/// * `config` - The `[output]` section naming the store
///
/// # Returns
///
/// * `Ok(Vec<Record>)` - Records in store order (empty if the store does not exist)
/// * `Err(ScribeError)` - The store could not be opened or is corrupt
pub fn load_records(config: &OutputConfig) -> Result<Vec<Record>> {
    let mut store = open_store(config)?;
    let records = store.load()?;
    tracing::debug!("Read {} records from {}", records.len(), store.describe());
    Ok(records)
}
