//! Materialized-path construction and prefix queries
//!
//! A tag's position in its taxonomy is encoded as a single string of the form
//! `"<taxonomy_id>/<ancestor_label>/.../<label>/"`. Because labels never
//! contain the separator, no escaping is needed, and every proper prefix
//! ending in a separator names an ancestor. Subtree membership then reduces
//! to a string-prefix test, which the storage layer answers with a range scan
//! over an ordered index instead of walking parent pointers.

use crate::error::{TagStoreError, TagStoreResult};
use crate::model::TaxonomyId;

/// Separator between path segments. Labels must never contain it.
pub const SEPARATOR: char = '/';

/// Check that a label is usable as a path segment.
///
/// Labels must be non-empty and must not contain [`SEPARATOR`], which is the
/// sole structural delimiter of materialized paths.
pub fn validate_label(label: &str) -> TagStoreResult<()> {
    if label.is_empty() || label.contains(SEPARATOR) {
        return Err(TagStoreError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

/// Build the materialized path for a tag.
///
/// ```
/// use tagstore_core::path::build_path;
///
/// assert_eq!(build_path(15, "easy", None), "15/easy/");
/// assert_eq!(build_path(200, "lion", Some("200/animal/mammal/")), "200/animal/mammal/lion/");
/// ```
///
/// # Panics
///
/// Panics if `parent_path` does not start with `"<taxonomy_id>/"`. A parent
/// from a different taxonomy is a programming error in the caller, and
/// silently producing a cross-taxonomy path would corrupt the tree.
pub fn build_path(taxonomy_id: TaxonomyId, label: &str, parent_path: Option<&str>) -> String {
    let prefix = format!("{}{}", taxonomy_id, SEPARATOR);
    match parent_path {
        Some(parent) => {
            assert!(
                parent.starts_with(&prefix),
                "parent path {:?} is not rooted in taxonomy {}",
                parent,
                taxonomy_id
            );
            format!("{}{}{}", parent, label, SEPARATOR)
        }
        None => format!("{}{}{}", prefix, label, SEPARATOR),
    }
}

/// True iff `candidate` lies in the subtree rooted at `ancestor` (inclusive).
///
/// `ancestor` must end with the separator for this to hold; that rules out
/// partial-label matches such as `"1/cat/"` against the prefix `"1/ca"`.
pub fn is_descendant_prefix(candidate: &str, ancestor: &str) -> bool {
    ancestor.ends_with(SEPARATOR) && candidate.starts_with(ancestor)
}

/// Number of tag segments in `path`, excluding the taxonomy id segment.
///
/// Root tags are at depth 1.
pub fn depth(path: &str) -> usize {
    path.matches(SEPARATOR).count().saturating_sub(1)
}

/// Exclusive upper bound for a range scan over everything prefixed by `path`.
///
/// A subtree query against an ordered index is the half-open interval
/// `[path, prefix_upper_bound(path))`: the trailing separator is bumped to
/// the next code point, so `"1/animal/"` scans up to (but not including)
/// `"1/animal0"`, covering every descendant path and nothing else.
pub fn prefix_upper_bound(path: &str) -> String {
    debug_assert!(path.ends_with(SEPARATOR));
    let mut bound = String::with_capacity(path.len());
    bound.push_str(&path[..path.len() - SEPARATOR.len_utf8()]);
    // SEPARATOR is ASCII, so the next code point is a plain byte bump
    bound.push((SEPARATOR as u8 + 1) as char);
    bound
}
