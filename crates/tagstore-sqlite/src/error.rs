//! Error types for the SQLite backend

use rusqlite::ErrorCode;
use tagstore_core::TagStoreError;
use thiserror::Error;

/// SQLite backend error type.
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Schema/migration error
    #[error("schema error: {0}")]
    Schema(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// True for a UNIQUE (or primary key) constraint rejection.
///
/// This is how duplicate labels and duplicate identity pairs surface: the
/// insert itself fails, atomically, instead of an application-level
/// check-then-act race.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Map a rusqlite error into the caller-facing error type.
///
/// Busy/locked/cannot-open are the transient class: callers may retry those
/// with backoff, so they become `StorageUnavailable`. Everything else is a
/// plain backend failure.
pub(crate) fn map_sql(err: rusqlite::Error) -> TagStoreError {
    SqliteError::from(err).into()
}

fn is_transient(code: ErrorCode) -> bool {
    matches!(
        code,
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen
    )
}

impl From<SqliteError> for TagStoreError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(msg) => Self::StorageUnavailable(msg),
            SqliteError::Schema(msg) => Self::Backend(msg),
            SqliteError::Rusqlite(rusqlite::Error::SqliteFailure(e, msg))
                if is_transient(e.code) =>
            {
                Self::StorageUnavailable(msg.unwrap_or_else(|| e.to_string()))
            }
            SqliteError::Rusqlite(e) => Self::Backend(e.to_string()),
        }
    }
}
