//! SQLite record store
//!
//! Each record is one row, inserted in its own transaction with
//! `synchronous = FULL`, so a committed append survives a crash and an
//! uncommitted one leaves no trace.

use crate::storage::schema::{initialize_schema, stored_schema_version, SCHEMA_VERSION};
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::Record;
use crate::url::LocationId;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use std::collections::BTreeSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteRecordStore {
    conn: Connection,
    path: String,
    count: usize,
}

impl SqliteRecordStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let existed = path.exists();
        let unreadable = |e: rusqlite::Error| -> StorageError {
            if existed {
                StorageError::Corrupt {
                    path: path.display().to_string(),
                    reason: format!("not a readable SQLite database: {}", e),
                }
            } else {
                e.into()
            }
        };

        let conn = Connection::open(path).map_err(unreadable)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(unreadable)?;

        Self::with_connection(conn, path.display().to_string())
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn with_connection(conn: Connection, path: String) -> StorageResult<Self> {
        initialize_schema(&conn).map_err(|e| StorageError::Corrupt {
            path: path.clone(),
            reason: format!("cannot initialize schema: {}", e),
        })?;

        if let Some(version) = stored_schema_version(&conn)? {
            if version > SCHEMA_VERSION {
                return Err(StorageError::Corrupt {
                    path,
                    reason: format!(
                        "schema version {} is newer than supported version {}",
                        version, SCHEMA_VERSION
                    ),
                });
            }
        }

        Ok(Self {
            conn,
            path,
            count: 0,
        })
    }

    fn corrupt(&self, reason: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn read_records(&self) -> StorageResult<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT location, title, body, outgoing, provenance_timestamp
                 FROM records ORDER BY id",
            )
            .map_err(|e| self.corrupt(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(|e| self.corrupt(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (location, title, body, outgoing, provenance_timestamp) =
                row.map_err(|e| self.corrupt(e.to_string()))?;

            let location = LocationId::parse(&location)
                .map_err(|e| self.corrupt(format!("bad location '{}': {}", location, e)))?;
            let outgoing: BTreeSet<LocationId> = serde_json::from_str(&outgoing)
                .map_err(|e| self.corrupt(format!("bad outgoing links for {}: {}", location, e)))?;

            records.push(Record {
                location,
                title,
                body,
                outgoing,
                provenance_timestamp,
            });
        }

        Ok(records)
    }
}

impl RecordStore for SqliteRecordStore {
    fn load(&mut self) -> StorageResult<Vec<Record>> {
        let records = self.read_records()?;
        self.count = records.len();
        tracing::debug!("Loaded {} records from {}", self.count, self.path);
        Ok(records)
    }

    fn append_and_flush(&mut self, record: Record) -> StorageResult<()> {
        let outgoing = serde_json::to_string(&record.outgoing)?;
        let location = record.location.to_string();

        let result = self.conn.transaction().and_then(|tx| {
            tx.execute(
                "INSERT INTO records (location, title, body, outgoing, provenance_timestamp, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    location,
                    record.title,
                    record.body,
                    outgoing,
                    record.provenance_timestamp,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            tx.commit()
        });

        match result {
            Ok(()) => {
                self.count += 1;
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::Duplicate(location))
            }
            Err(e) => Err(StorageError::Flush {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn len(&self) -> usize {
        self.count
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}
