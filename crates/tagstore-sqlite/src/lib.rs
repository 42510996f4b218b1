//! SQLite storage backend for the tag-store
//!
//! Implements `tagstore-core`'s [`TagHierarchy`] and [`EntityTagIndex`]
//! traits over a single SQLite database.
//!
//! ## Design
//!
//! - **Materialized paths**: subtree queries are half-open range scans over
//!   the indexed `path` column, never recursive parent walks.
//! - **Constraint-enforced invariants**: duplicate labels and duplicate
//!   entity identities are rejected by unique indexes at insert time, which
//!   keeps concurrent creators race-free.
//! - **WAL mode**: readers proceed alongside the writer; all blocking work
//!   runs under `tokio::task::spawn_blocking`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tagstore_sqlite::{create_tag_store, SqliteConfig, SqlitePool};
//!
//! let pool = SqlitePool::new(SqliteConfig::new("./tagstore.db"))?;
//! let store = create_tag_store(pool);
//!
//! let bio = store.create_taxonomy("bio", owner_id).await?;
//! let animal = store.create_tag(bio.id, "animal", None).await?;
//! ```

pub mod config;
pub mod connection;
pub mod entities;
pub mod error;
pub mod hierarchy;
pub mod schema;

use tagstore_core::TagStore;

// Re-exports
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use entities::SqliteEntityTagIndex;
pub use error::{SqliteError, SqliteResult};
pub use hierarchy::SqliteTagHierarchy;

/// Wire a [`TagStore`] façade over both SQLite implementations sharing the
/// given pool.
pub fn create_tag_store(pool: SqlitePool) -> TagStore<SqliteTagHierarchy, SqliteEntityTagIndex> {
    TagStore::new(
        SqliteTagHierarchy::new(pool.clone()),
        SqliteEntityTagIndex::new(pool),
    )
}
