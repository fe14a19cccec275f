//! Database schema for the SQLite record store

/// Current schema version, stored in `store_meta`
pub const SCHEMA_VERSION: u32 = 1;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per processed location, in processing order
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    outgoing TEXT NOT NULL,
    provenance_timestamp TEXT,
    stored_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initializes the database schema and records its version
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Reads the schema version recorded in the database
pub fn stored_schema_version(conn: &rusqlite::Connection) -> Result<Option<u32>, rusqlite::Error> {
    use rusqlite::OptionalExtension;

    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value.and_then(|v| v.parse().ok()))
}
