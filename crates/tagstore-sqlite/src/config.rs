//! SQLite backend configuration

use std::path::PathBuf;

/// Connection settings for the SQLite backend.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file path, or `:memory:` for an in-memory database.
    pub path: PathBuf,
    /// Enable write-ahead logging. Readers don't block the writer.
    pub wal_mode: bool,
    /// Enforce foreign key constraints.
    pub foreign_keys: bool,
    /// How long a blocked statement waits before failing with SQLITE_BUSY.
    pub busy_timeout_ms: u32,
    /// PRAGMA cache_size value (negative means KiB).
    pub cache_size: i32,
}

impl SqliteConfig {
    /// Configuration for a database at the given path, with the defaults
    /// the store expects: WAL on, foreign keys on, 5s busy timeout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
            cache_size: -64_000,
        }
    }

    /// In-memory database for testing. WAL needs a real file, so it is
    /// disabled here.
    pub fn memory() -> Self {
        Self {
            wal_mode: false,
            ..Self::new(":memory:")
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::new("tagstore.db")
    }
}
