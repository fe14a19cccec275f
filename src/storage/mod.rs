//! Storage module for persisting crawl records
//!
//! This module handles the durable record store the crawler resumes from:
//! - The [`Record`] type produced once per processed location
//! - The [`RecordStore`] trait with its crash-atomic append contract
//! - A JSON file backend (default) and a SQLite backend

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::JsonRecordStore;
pub use sqlite::SqliteRecordStore;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::config::{OutputConfig, StoreFormat};
use crate::url::LocationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// The structured result of processing one location
///
/// Field aliases let the store read files written with the older
/// `url` / `related_links` / `creation_date` names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "url")]
    pub location: LocationId,

    pub title: String,

    pub body: String,

    #[serde(alias = "related_links", default)]
    pub outgoing: BTreeSet<LocationId>,

    #[serde(alias = "creation_date", default)]
    pub provenance_timestamp: Option<String>,
}

/// Opens the record store selected by the output configuration
///
/// # Arguments
///
/// * `config` - The `[output]` section
///
/// # Returns
///
/// * `Ok(Box<dyn RecordStore>)` - An unloaded store; call `load` before use
/// * `Err(StorageError)` - The SQLite database could not be opened
pub fn open_store(config: &OutputConfig) -> StorageResult<Box<dyn RecordStore>> {
    let path = Path::new(&config.records_path);

    match config.store_format {
        StoreFormat::Json => Ok(Box::new(JsonRecordStore::new(path))),
        StoreFormat::Sqlite => Ok(Box::new(SqliteRecordStore::new(path)?)),
    }
}

/// Moves an existing store out of the way so the next crawl starts empty
///
/// The store file (and the SQLite `-wal`/`-shm` companions, if present) is
/// renamed with a `.bak` suffix, replacing any earlier backup.
///
/// # Returns
///
/// * `Ok(Some(path))` - The backup location of the store file
/// * `Ok(None)` - There was no store to move
pub fn set_aside(config: &OutputConfig) -> std::io::Result<Option<PathBuf>> {
    let path = PathBuf::from(&config.records_path);
    if !path.exists() {
        return Ok(None);
    }

    let mut backup = None;
    for suffix in ["", "-wal", "-shm"] {
        let source = with_suffix(&path, suffix);
        if !source.exists() {
            continue;
        }

        let target = with_suffix(&source, ".bak");
        fs::rename(&source, &target)?;
        tracing::info!("Moved {} to {}", source.display(), target.display());

        if suffix.is_empty() {
            backup = Some(target);
        }
    }

    Ok(backup)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
