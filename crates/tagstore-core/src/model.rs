//! Domain records for taxonomies, tags, and taggable entities

use crate::path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row id of a [`Taxonomy`].
pub type TaxonomyId = i64;

/// Row id of a [`Tag`].
pub type TagId = i64;

/// Row id of an [`Entity`].
pub type EntityId = i64;

/// A collection of tags, some of which may be organized into a hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub id: TaxonomyId,
    pub name: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A tag within a taxonomy.
///
/// `path` is the materialized path: taxonomy-scoped, separator-terminated,
/// with every proper prefix ending in a separator naming an ancestor. See
/// [`crate::path`] for the encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub taxonomy_id: TaxonomyId,
    /// The tag string, like "good problem". Stored case is preserved;
    /// lookups and uniqueness are case-insensitive.
    pub label: String,
    /// Materialized path, e.g. `"200/animal/mammal/lion/"`.
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Depth within the taxonomy; root tags are at depth 1.
    pub fn depth(&self) -> usize {
        path::depth(&self.path)
    }

    /// True iff `self` lies in the subtree rooted at `ancestor` (inclusive).
    pub fn is_descendant_of(&self, ancestor: &Tag) -> bool {
        path::is_descendant_prefix(&self.path, &ancestor.path)
    }
}

/// An external object that can be tagged.
///
/// Identity is the `(entity_type, external_id)` pair; the store does not
/// interpret either string beyond identity and lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: String,
    pub external_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: TagId, label: &str, path: &str) -> Tag {
        Tag {
            id,
            taxonomy_id: 1,
            label: label.to_string(),
            path: path.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn tag_depth_follows_path() {
        assert_eq!(tag(1, "animal", "1/animal/").depth(), 1);
        assert_eq!(tag(2, "lion", "1/animal/mammal/lion/").depth(), 3);
    }

    #[test]
    fn descendant_test_uses_paths() {
        let animal = tag(1, "animal", "1/animal/");
        let lion = tag(2, "lion", "1/animal/mammal/lion/");
        assert!(lion.is_descendant_of(&animal));
        assert!(animal.is_descendant_of(&animal));
        assert!(!animal.is_descendant_of(&lion));
    }
}
