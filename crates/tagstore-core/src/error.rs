//! Error types for tag-store operations

use crate::model::{TagId, TaxonomyId};
use thiserror::Error;

/// Error type shared by every tag-store operation.
///
/// All variants are reported synchronously to the caller of the failing
/// operation; nothing is retried internally. Only [`StorageUnavailable`]
/// is worth retrying, with backoff, from the caller's side.
///
/// [`StorageUnavailable`]: TagStoreError::StorageUnavailable
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagStoreError {
    /// Label empty or containing the path separator.
    #[error("invalid label: {0:?}")]
    InvalidLabel(String),

    /// Referenced taxonomy does not exist.
    #[error("unknown taxonomy: {0}")]
    UnknownTaxonomy(TaxonomyId),

    /// Referenced parent tag does not exist in the target taxonomy.
    #[error("unknown parent tag: {0}")]
    UnknownParent(TagId),

    /// Referenced tag does not exist.
    #[error("unknown tag: {0}")]
    UnknownTag(TagId),

    /// The label is already present somewhere in the taxonomy
    /// (case-insensitive).
    #[error("label {label:?} already exists in taxonomy {taxonomy_id}")]
    DuplicateLabel {
        taxonomy_id: TaxonomyId,
        label: String,
    },

    /// Non-cascading delete blocked by descendants or associations.
    #[error("tag {0} still has descendants or associations")]
    TagInUse(TagId),

    /// Transient storage failure (busy, locked, unreachable). The caller
    /// may retry with backoff; the store never retries on its own.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Any other storage backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for tag-store operations.
pub type TagStoreResult<T> = Result<T, TagStoreError>;

impl TagStoreError {
    /// Check if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}
