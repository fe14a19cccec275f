//! JSON file record store
//!
//! The whole record set lives in one pretty-printed JSON array. Every append
//! rewrites the file through a sibling temporary file that is synced and then
//! renamed over the original, so a crash leaves either the old or the new
//! complete array on disk.

use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::Record;
use crate::url::LocationId;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Record store backed by a single JSON file
pub struct JsonRecordStore {
    path: PathBuf,
    records: Vec<Record>,
    locations: HashSet<LocationId>,
    loaded: bool,
}

impl JsonRecordStore {
    /// Creates a store for `path`; nothing is read until [`RecordStore::load`]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            locations: HashSet::new(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next state is written to before the rename
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn corrupt(&self, reason: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn flush_failed(&self, reason: impl ToString) -> StorageError {
        StorageError::Flush {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn read_records(&self) -> StorageResult<Vec<Record>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No record file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let entries: Vec<serde_json::Value> =
            serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;

        let mut records = Vec::with_capacity(entries.len());
        let mut seen: HashMap<LocationId, String> = HashMap::with_capacity(entries.len());
        for entry in entries {
            let raw = raw_location(&entry).unwrap_or_default();
            let record: Record =
                serde_json::from_value(entry).map_err(|e| self.corrupt(e.to_string()))?;

            match seen.get(&record.location) {
                Some(first) if *first == raw => {
                    return Err(self.corrupt(format!(
                        "location {} is stored more than once",
                        record.location
                    )));
                }
                Some(first) => {
                    // Older files keep raw hrefs, so fragments and similar
                    // variants of one page show up as separate entries
                    tracing::warn!(
                        "Skipping record for '{}': same location as '{}' ({})",
                        raw,
                        first,
                        record.location
                    );
                }
                None => {
                    seen.insert(record.location.clone(), raw);
                    records.push(record);
                }
            }
        }

        Ok(records)
    }

    fn write_atomically(&self, bytes: &[u8]) -> std::io::Result<()> {
        let temp = self.temp_path();

        let mut file = File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, &self.path)?;
        sync_parent_dir(&self.path);
        Ok(())
    }
}

impl RecordStore for JsonRecordStore {
    fn load(&mut self) -> StorageResult<Vec<Record>> {
        let temp = self.temp_path();
        if temp.exists() {
            // Left behind by a flush that never reached the rename
            tracing::warn!("Removing stale temporary file {}", temp.display());
            if let Err(e) = fs::remove_file(&temp) {
                tracing::warn!("Could not remove {}: {}", temp.display(), e);
            }
        }

        let records = self.read_records()?;

        self.locations = records.iter().map(|r| r.location.clone()).collect();
        self.records = records.clone();
        self.loaded = true;

        tracing::debug!(
            "Loaded {} records from {}",
            self.records.len(),
            self.path.display()
        );

        Ok(records)
    }

    fn append_and_flush(&mut self, record: Record) -> StorageResult<()> {
        if !self.loaded {
            self.load()?;
        }

        if self.locations.contains(&record.location) {
            return Err(StorageError::Duplicate(record.location.to_string()));
        }

        self.records.push(record);

        let result = serde_json::to_vec_pretty(&self.records)
            .map_err(|e| self.flush_failed(e))
            .and_then(|bytes| {
                self.write_atomically(&bytes)
                    .map_err(|e| self.flush_failed(e))
            });

        match result {
            Ok(()) => {
                if let Some(stored) = self.records.last() {
                    self.locations.insert(stored.location.clone());
                }
                Ok(())
            }
            Err(e) => {
                self.records.pop();
                Err(e)
            }
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

/// Location string of a stored entry exactly as written on disk
fn raw_location(entry: &serde_json::Value) -> Option<String> {
    entry
        .get("location")
        .or_else(|| entry.get("url"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Makes the rename itself durable on platforms that support syncing a directory
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if let Ok(dir) = File::open(parent) {
        if let Err(e) = dir.sync_all() {
            tracing::debug!("Directory sync failed for {}: {}", parent.display(), e);
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn record(path: &str, links: &[&str]) -> Record {
        Record {
            location: LocationId::parse(&format!("https://a.org{}", path)).unwrap(),
            title: format!("Title of {}", path),
            body: "body text".to_string(),
            outgoing: links
                .iter()
                .map(|l| LocationId::parse(&format!("https://a.org{}", l)).unwrap())
                .collect::<BTreeSet<_>>(),
            provenance_timestamp: None,
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonRecordStore::new(dir.path().join("records.json"));

        assert!(store.load().unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_then_reload_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let mut store = JsonRecordStore::new(&path);
        store.load().unwrap();
        store
            .append_and_flush(record("/wiki/A", &["/wiki/B"]))
            .unwrap();
        store.append_and_flush(record("/wiki/B", &[])).unwrap();
        assert_eq!(store.len(), 2);

        let mut reopened = JsonRecordStore::new(&path);
        let records = reopened.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], record("/wiki/A", &["/wiki/B"]));
        assert_eq!(records[1].location.as_str(), "https://a.org/wiki/B");
    }

    #[test]
    fn test_append_without_load_keeps_existing_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let mut first = JsonRecordStore::new(&path);
        first.append_and_flush(record("/wiki/A", &[])).unwrap();

        let mut second = JsonRecordStore::new(&path);
        second.append_and_flush(record("/wiki/B", &[])).unwrap();

        assert_eq!(JsonRecordStore::new(&path).load().unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_append_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonRecordStore::new(dir.path().join("records.json"));
        store.load().unwrap();

        store.append_and_flush(record("/wiki/A", &[])).unwrap();
        let err = store.append_and_flush(record("/wiki/A", &[])).unwrap_err();

        assert!(matches!(err, StorageError::Duplicate(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, "[{\"location\": \"https://a.org/wiki/A\", \"ti").unwrap();

        let err = JsonRecordStore::new(&path).load().unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_duplicate_locations_on_disk_are_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        let records = vec![record("/wiki/A", &[]), record("/wiki/A/", &[])];
        fs::write(&path, serde_json::to_vec(&records).unwrap()).unwrap();

        let err = JsonRecordStore::new(&path).load().unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_crash_before_rename_keeps_previous_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let mut store = JsonRecordStore::new(&path);
        store.load().unwrap();
        store.append_and_flush(record("/wiki/A", &[])).unwrap();

        // A flush interrupted mid-write leaves a truncated temporary file
        fs::write(store.temp_path(), "[{\"location\": \"https://a.org/wi").unwrap();

        let mut reopened = JsonRecordStore::new(&path);
        let records = reopened.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!reopened.temp_path().exists());
    }

    #[test]
    fn test_every_flush_leaves_a_complete_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let mut store = JsonRecordStore::new(&path);
        store.load().unwrap();

        for (i, name) in ["/wiki/A", "/wiki/B", "/wiki/C"].iter().enumerate() {
            store.append_and_flush(record(name, &[])).unwrap();

            // Simulated crash right after the call: a fresh reader sees exactly i + 1
            let snapshot = JsonRecordStore::new(&path).load().unwrap();
            assert_eq!(snapshot.len(), i + 1);
            assert!(!store.temp_path().exists());
        }
    }

    #[test]
    fn test_failed_flush_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("records.json");

        let mut store = JsonRecordStore::new(&path);
        store.load().unwrap();

        let err = store.append_and_flush(record("/wiki/A", &[])).unwrap_err();
        assert!(err.is_flush_failure());
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_loads_legacy_field_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scraped_data.json");
        fs::write(
            &path,
            r#"[
    {
        "url": "https://en.wikipedia.org/wiki/Rust",
        "title": "Rust",
        "body": "Rust is a language",
        "related_links": ["https://en.wikipedia.org/wiki/Cargo"],
        "creation_date": null
    }
]"#,
        )
        .unwrap();

        let records = JsonRecordStore::new(&path).load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Rust");
        assert_eq!(records[0].outgoing.len(), 1);
        assert_eq!(records[0].provenance_timestamp, None);
    }

    #[test]
    fn test_legacy_fragment_variants_keep_first_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scraped_data.json");
        fs::write(
            &path,
            r#"[
    {
        "url": "https://en.wikipedia.org/wiki/Rust",
        "title": "Rust",
        "body": "Rust is a language",
        "related_links": ["https://en.wikipedia.org/wiki/Rust#History"],
        "creation_date": null
    },
    {
        "url": "https://en.wikipedia.org/wiki/Rust#History",
        "title": "Rust (history section)",
        "body": "Rust is a language",
        "related_links": [],
        "creation_date": null
    },
    {
        "url": "https://en.wikipedia.org/wiki/Cargo",
        "title": "Cargo",
        "body": "Cargo builds Rust",
        "related_links": [],
        "creation_date": null
    }
]"#,
        )
        .unwrap();

        let mut store = JsonRecordStore::new(&path);
        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Rust");
        assert_eq!(
            records[0].location.as_str(),
            "https://en.wikipedia.org/wiki/Rust"
        );
        assert_eq!(records[1].title, "Cargo");

        // The kept location is still guarded against a second append
        let err = store.append_and_flush(records[0].clone()).unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));
    }
}
