//! Storage traits and the combined tag-store façade
//!
//! Two focused traits split the store along its natural seam: the tag
//! hierarchy (taxonomies, tags, subtree queries) and the entity↔tag
//! association index. Backends implement both; [`TagStore`] composes them
//! into the surface callers use.
//!
//! The concurrency contract lives at the storage boundary: duplicate-label
//! detection must come from the backend's uniqueness constraint rejecting
//! the insert (one success, one [`DuplicateLabel`] under any interleaving),
//! and cascading deletes must be transactional.
//!
//! [`DuplicateLabel`]: crate::TagStoreError::DuplicateLabel

use crate::error::TagStoreResult;
use crate::model::{Entity, EntityId, Tag, TagId, Taxonomy, TaxonomyId};
use async_trait::async_trait;

// ============================================================================
// TagHierarchy Trait
// ============================================================================

/// Taxonomies, tags, and subtree queries over materialized paths.
#[async_trait]
pub trait TagHierarchy: Send + Sync {
    /// Create a taxonomy with a fresh id.
    async fn create_taxonomy(&self, name: &str, owner_id: i64) -> TagStoreResult<Taxonomy>;

    /// Fetch a taxonomy by id.
    async fn get_taxonomy(&self, taxonomy_id: TaxonomyId) -> TagStoreResult<Option<Taxonomy>>;

    /// Delete a taxonomy and everything in it: associations of its tags,
    /// the tags themselves, then the taxonomy row, atomically.
    ///
    /// Returns the number of tags removed.
    async fn delete_taxonomy(&self, taxonomy_id: TaxonomyId) -> TagStoreResult<usize>;

    /// Create a tag, optionally under a parent tag of the same taxonomy.
    ///
    /// The label must be valid per [`crate::path::validate_label`] and
    /// unique (case-insensitively) across the whole taxonomy, not just
    /// among siblings.
    async fn create_tag(
        &self,
        taxonomy_id: TaxonomyId,
        label: &str,
        parent: Option<TagId>,
    ) -> TagStoreResult<Tag>;

    /// Fetch a tag by id.
    async fn get_tag(&self, tag_id: TagId) -> TagStoreResult<Option<Tag>>;

    /// All tags in the subtree rooted at `ancestor_tag_id`, including the
    /// ancestor itself, ordered by label.
    async fn get_tag_by_path_prefix(
        &self,
        taxonomy_id: TaxonomyId,
        ancestor_tag_id: TagId,
    ) -> TagStoreResult<Vec<Tag>>;

    /// Case-insensitive exact-label lookup within a taxonomy.
    async fn find_by_label(
        &self,
        taxonomy_id: TaxonomyId,
        label: &str,
    ) -> TagStoreResult<Option<Tag>>;

    /// Delete a tag.
    ///
    /// Without `cascade`, fails with [`TagInUse`] if the tag has descendants
    /// or associations. With `cascade`, removes the whole subtree and its
    /// associations atomically. Returns the number of tags removed.
    ///
    /// [`TagInUse`]: crate::TagStoreError::TagInUse
    async fn delete_tag(&self, tag_id: TagId, cascade: bool) -> TagStoreResult<usize>;
}

// ============================================================================
// EntityTagIndex Trait
// ============================================================================

/// The many-to-many association between opaque entities and tags.
#[async_trait]
pub trait EntityTagIndex: Send + Sync {
    /// Idempotent upsert keyed by the `(entity_type, external_id)` pair.
    async fn get_or_create_entity(
        &self,
        entity_type: &str,
        external_id: &str,
    ) -> TagStoreResult<Entity>;

    /// Fetch an entity by its identity pair.
    async fn get_entity(
        &self,
        entity_type: &str,
        external_id: &str,
    ) -> TagStoreResult<Option<Entity>>;

    /// Associate an entity with a tag. Re-tagging is a no-op.
    async fn tag_entity(&self, entity_id: EntityId, tag_id: TagId) -> TagStoreResult<()>;

    /// Remove an association. No-op when absent.
    async fn untag_entity(&self, entity_id: EntityId, tag_id: TagId) -> TagStoreResult<()>;

    /// All tags held by an entity, across taxonomies, ordered by label.
    async fn tags_of(&self, entity_id: EntityId) -> TagStoreResult<Vec<Tag>>;

    /// Entities associated with the ancestor tag or any of its descendants.
    ///
    /// An entity tagged with several tags inside the subtree is reported
    /// once.
    async fn entities_under(
        &self,
        taxonomy_id: TaxonomyId,
        ancestor_tag_id: TagId,
    ) -> TagStoreResult<Vec<Entity>>;
}

// ============================================================================
// TagStore Façade
// ============================================================================

/// The combined tag-store surface: a [`TagHierarchy`] plus an
/// [`EntityTagIndex`] over the same underlying storage.
pub struct TagStore<H, E> {
    hierarchy: H,
    entities: E,
}

impl<H: TagHierarchy, E: EntityTagIndex> TagStore<H, E> {
    pub fn new(hierarchy: H, entities: E) -> Self {
        Self {
            hierarchy,
            entities,
        }
    }

    /// Access the hierarchy half directly.
    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    /// Access the association half directly.
    pub fn entities(&self) -> &E {
        &self.entities
    }

    pub async fn create_taxonomy(&self, name: &str, owner_id: i64) -> TagStoreResult<Taxonomy> {
        self.hierarchy.create_taxonomy(name, owner_id).await
    }

    pub async fn get_taxonomy(&self, taxonomy_id: TaxonomyId) -> TagStoreResult<Option<Taxonomy>> {
        self.hierarchy.get_taxonomy(taxonomy_id).await
    }

    /// Delete a taxonomy; no tag or association referencing it survives.
    pub async fn delete_taxonomy(&self, taxonomy_id: TaxonomyId) -> TagStoreResult<usize> {
        self.hierarchy.delete_taxonomy(taxonomy_id).await
    }

    pub async fn create_tag(
        &self,
        taxonomy_id: TaxonomyId,
        label: &str,
        parent: Option<TagId>,
    ) -> TagStoreResult<Tag> {
        self.hierarchy.create_tag(taxonomy_id, label, parent).await
    }

    pub async fn get_tag(&self, tag_id: TagId) -> TagStoreResult<Option<Tag>> {
        self.hierarchy.get_tag(tag_id).await
    }

    pub async fn get_tag_by_path_prefix(
        &self,
        taxonomy_id: TaxonomyId,
        ancestor_tag_id: TagId,
    ) -> TagStoreResult<Vec<Tag>> {
        self.hierarchy
            .get_tag_by_path_prefix(taxonomy_id, ancestor_tag_id)
            .await
    }

    pub async fn find_by_label(
        &self,
        taxonomy_id: TaxonomyId,
        label: &str,
    ) -> TagStoreResult<Option<Tag>> {
        self.hierarchy.find_by_label(taxonomy_id, label).await
    }

    pub async fn delete_tag(&self, tag_id: TagId, cascade: bool) -> TagStoreResult<usize> {
        self.hierarchy.delete_tag(tag_id, cascade).await
    }

    pub async fn get_or_create_entity(
        &self,
        entity_type: &str,
        external_id: &str,
    ) -> TagStoreResult<Entity> {
        self.entities
            .get_or_create_entity(entity_type, external_id)
            .await
    }

    pub async fn get_entity(
        &self,
        entity_type: &str,
        external_id: &str,
    ) -> TagStoreResult<Option<Entity>> {
        self.entities.get_entity(entity_type, external_id).await
    }

    pub async fn tag_entity(&self, entity_id: EntityId, tag_id: TagId) -> TagStoreResult<()> {
        self.entities.tag_entity(entity_id, tag_id).await
    }

    pub async fn untag_entity(&self, entity_id: EntityId, tag_id: TagId) -> TagStoreResult<()> {
        self.entities.untag_entity(entity_id, tag_id).await
    }

    pub async fn tags_of(&self, entity_id: EntityId) -> TagStoreResult<Vec<Tag>> {
        self.entities.tags_of(entity_id).await
    }

    pub async fn entities_under(
        &self,
        taxonomy_id: TaxonomyId,
        ancestor_tag_id: TagId,
    ) -> TagStoreResult<Vec<Entity>> {
        self.entities
            .entities_under(taxonomy_id, ancestor_tag_id)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TagStoreError;
    use crate::path;
    use chrono::Utc;
    use std::collections::{BTreeSet, HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// In-memory implementation of both traits for exercising the façade.
    #[derive(Clone, Default)]
    struct MemoryStore {
        state: Arc<Mutex<MemoryState>>,
    }

    #[derive(Default)]
    struct MemoryState {
        next_id: i64,
        taxonomies: HashMap<TaxonomyId, Taxonomy>,
        tags: HashMap<TagId, Tag>,
        entities: HashMap<EntityId, Entity>,
        associations: HashSet<(EntityId, TagId)>,
    }

    impl MemoryState {
        fn alloc_id(&mut self) -> i64 {
            self.next_id += 1;
            self.next_id
        }

        fn subtree_ids(&self, ancestor: &Tag) -> Vec<TagId> {
            self.tags
                .values()
                .filter(|t| {
                    t.taxonomy_id == ancestor.taxonomy_id
                        && path::is_descendant_prefix(&t.path, &ancestor.path)
                })
                .map(|t| t.id)
                .collect()
        }
    }

    #[async_trait]
    impl TagHierarchy for MemoryStore {
        async fn create_taxonomy(&self, name: &str, owner_id: i64) -> TagStoreResult<Taxonomy> {
            let mut state = self.state.lock().unwrap();
            let taxonomy = Taxonomy {
                id: state.alloc_id(),
                name: name.to_string(),
                owner_id,
                created_at: Utc::now(),
            };
            state.taxonomies.insert(taxonomy.id, taxonomy.clone());
            Ok(taxonomy)
        }

        async fn get_taxonomy(
            &self,
            taxonomy_id: TaxonomyId,
        ) -> TagStoreResult<Option<Taxonomy>> {
            Ok(self.state.lock().unwrap().taxonomies.get(&taxonomy_id).cloned())
        }

        async fn delete_taxonomy(&self, taxonomy_id: TaxonomyId) -> TagStoreResult<usize> {
            let mut state = self.state.lock().unwrap();
            if state.taxonomies.remove(&taxonomy_id).is_none() {
                return Err(TagStoreError::UnknownTaxonomy(taxonomy_id));
            }
            let doomed: Vec<TagId> = state
                .tags
                .values()
                .filter(|t| t.taxonomy_id == taxonomy_id)
                .map(|t| t.id)
                .collect();
            state.associations.retain(|(_, tag_id)| !doomed.contains(tag_id));
            for tag_id in &doomed {
                state.tags.remove(tag_id);
            }
            Ok(doomed.len())
        }

        async fn create_tag(
            &self,
            taxonomy_id: TaxonomyId,
            label: &str,
            parent: Option<TagId>,
        ) -> TagStoreResult<Tag> {
            path::validate_label(label)?;
            let mut state = self.state.lock().unwrap();
            if !state.taxonomies.contains_key(&taxonomy_id) {
                return Err(TagStoreError::UnknownTaxonomy(taxonomy_id));
            }
            let parent_path = match parent {
                Some(parent_id) => Some(
                    state
                        .tags
                        .get(&parent_id)
                        .filter(|t| t.taxonomy_id == taxonomy_id)
                        .map(|t| t.path.clone())
                        .ok_or(TagStoreError::UnknownParent(parent_id))?,
                ),
                None => None,
            };
            let duplicate = state.tags.values().any(|t| {
                t.taxonomy_id == taxonomy_id && t.label.eq_ignore_ascii_case(label)
            });
            if duplicate {
                return Err(TagStoreError::DuplicateLabel {
                    taxonomy_id,
                    label: label.to_string(),
                });
            }
            let tag = Tag {
                id: state.alloc_id(),
                taxonomy_id,
                label: label.to_string(),
                path: path::build_path(taxonomy_id, label, parent_path.as_deref()),
                created_at: Utc::now(),
            };
            state.tags.insert(tag.id, tag.clone());
            Ok(tag)
        }

        async fn get_tag(&self, tag_id: TagId) -> TagStoreResult<Option<Tag>> {
            Ok(self.state.lock().unwrap().tags.get(&tag_id).cloned())
        }

        async fn get_tag_by_path_prefix(
            &self,
            taxonomy_id: TaxonomyId,
            ancestor_tag_id: TagId,
        ) -> TagStoreResult<Vec<Tag>> {
            let state = self.state.lock().unwrap();
            let ancestor = state
                .tags
                .get(&ancestor_tag_id)
                .filter(|t| t.taxonomy_id == taxonomy_id)
                .ok_or(TagStoreError::UnknownTag(ancestor_tag_id))?;
            let mut tags: Vec<Tag> = state
                .tags
                .values()
                .filter(|t| {
                    t.taxonomy_id == taxonomy_id
                        && path::is_descendant_prefix(&t.path, &ancestor.path)
                })
                .cloned()
                .collect();
            tags.sort_by(|a, b| a.label.cmp(&b.label));
            Ok(tags)
        }

        async fn find_by_label(
            &self,
            taxonomy_id: TaxonomyId,
            label: &str,
        ) -> TagStoreResult<Option<Tag>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .tags
                .values()
                .find(|t| t.taxonomy_id == taxonomy_id && t.label.eq_ignore_ascii_case(label))
                .cloned())
        }

        async fn delete_tag(&self, tag_id: TagId, cascade: bool) -> TagStoreResult<usize> {
            let mut state = self.state.lock().unwrap();
            let tag = state
                .tags
                .get(&tag_id)
                .cloned()
                .ok_or(TagStoreError::UnknownTag(tag_id))?;
            let subtree = state.subtree_ids(&tag);
            let has_associations = state
                .associations
                .iter()
                .any(|(_, t)| subtree.contains(t));
            if !cascade && (subtree.len() > 1 || has_associations) {
                return Err(TagStoreError::TagInUse(tag_id));
            }
            state.associations.retain(|(_, t)| !subtree.contains(t));
            for id in &subtree {
                state.tags.remove(id);
            }
            Ok(subtree.len())
        }
    }

    #[async_trait]
    impl EntityTagIndex for MemoryStore {
        async fn get_or_create_entity(
            &self,
            entity_type: &str,
            external_id: &str,
        ) -> TagStoreResult<Entity> {
            let mut state = self.state.lock().unwrap();
            if let Some(existing) = state
                .entities
                .values()
                .find(|e| e.entity_type == entity_type && e.external_id == external_id)
            {
                return Ok(existing.clone());
            }
            let entity = Entity {
                id: state.alloc_id(),
                entity_type: entity_type.to_string(),
                external_id: external_id.to_string(),
                created_at: Utc::now(),
            };
            state.entities.insert(entity.id, entity.clone());
            Ok(entity)
        }

        async fn get_entity(
            &self,
            entity_type: &str,
            external_id: &str,
        ) -> TagStoreResult<Option<Entity>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .entities
                .values()
                .find(|e| e.entity_type == entity_type && e.external_id == external_id)
                .cloned())
        }

        async fn tag_entity(&self, entity_id: EntityId, tag_id: TagId) -> TagStoreResult<()> {
            let mut state = self.state.lock().unwrap();
            if !state.tags.contains_key(&tag_id) {
                return Err(TagStoreError::UnknownTag(tag_id));
            }
            state.associations.insert((entity_id, tag_id));
            Ok(())
        }

        async fn untag_entity(&self, entity_id: EntityId, tag_id: TagId) -> TagStoreResult<()> {
            self.state
                .lock()
                .unwrap()
                .associations
                .remove(&(entity_id, tag_id));
            Ok(())
        }

        async fn tags_of(&self, entity_id: EntityId) -> TagStoreResult<Vec<Tag>> {
            let state = self.state.lock().unwrap();
            let mut tags: Vec<Tag> = state
                .associations
                .iter()
                .filter(|(e, _)| *e == entity_id)
                .filter_map(|(_, t)| state.tags.get(t).cloned())
                .collect();
            tags.sort_by(|a, b| a.label.cmp(&b.label));
            Ok(tags)
        }

        async fn entities_under(
            &self,
            taxonomy_id: TaxonomyId,
            ancestor_tag_id: TagId,
        ) -> TagStoreResult<Vec<Entity>> {
            let state = self.state.lock().unwrap();
            let ancestor = state
                .tags
                .get(&ancestor_tag_id)
                .filter(|t| t.taxonomy_id == taxonomy_id)
                .ok_or(TagStoreError::UnknownTag(ancestor_tag_id))?;
            let subtree: Vec<TagId> = state.subtree_ids(ancestor);
            let ids: BTreeSet<EntityId> = state
                .associations
                .iter()
                .filter(|(_, t)| subtree.contains(t))
                .map(|(e, _)| *e)
                .collect();
            Ok(ids
                .into_iter()
                .filter_map(|id| state.entities.get(&id).cloned())
                .collect())
        }
    }

    fn store() -> TagStore<MemoryStore, MemoryStore> {
        let backend = MemoryStore::default();
        TagStore::new(backend.clone(), backend)
    }

    #[tokio::test]
    async fn bio_scenario_end_to_end() {
        let store = store();
        let bio = store.create_taxonomy("bio", 7).await.unwrap();

        let animal = store.create_tag(bio.id, "animal", None).await.unwrap();
        let mammal = store
            .create_tag(bio.id, "mammal", Some(animal.id))
            .await
            .unwrap();
        let lion = store
            .create_tag(bio.id, "lion", Some(mammal.id))
            .await
            .unwrap();
        assert_eq!(lion.path, format!("{}/animal/mammal/lion/", bio.id));

        let course = store
            .get_or_create_entity("course", "course-v1:X")
            .await
            .unwrap();
        store.tag_entity(course.id, lion.id).await.unwrap();

        let under_animal = store.entities_under(bio.id, animal.id).await.unwrap();
        assert_eq!(under_animal, vec![course.clone()]);

        // Cascading delete of "mammal" takes "lion" and the association
        let removed = store.delete_tag(mammal.id, true).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.find_by_label(bio.id, "lion").await.unwrap().is_none());
        assert!(store.tags_of(course.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_labels_rejected_anywhere_in_taxonomy() {
        let store = store();
        let tax = store.create_taxonomy("bio", 1).await.unwrap();
        let animal = store.create_tag(tax.id, "animal", None).await.unwrap();

        // Same label under a different parent, different case
        let err = store
            .create_tag(tax.id, "Animal", Some(animal.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TagStoreError::DuplicateLabel { .. }));

        // A different taxonomy is free to reuse it
        let other = store.create_taxonomy("zoo", 1).await.unwrap();
        assert!(store.create_tag(other.id, "animal", None).await.is_ok());
    }

    #[tokio::test]
    async fn label_validation_is_enforced() {
        let store = store();
        let tax = store.create_taxonomy("bio", 1).await.unwrap();
        assert!(matches!(
            store.create_tag(tax.id, "a/b", None).await.unwrap_err(),
            TagStoreError::InvalidLabel(_)
        ));
        assert!(matches!(
            store.create_tag(tax.id, "", None).await.unwrap_err(),
            TagStoreError::InvalidLabel(_)
        ));
    }

    #[tokio::test]
    async fn missing_references_are_typed_errors() {
        let store = store();
        assert!(matches!(
            store.create_tag(99, "animal", None).await.unwrap_err(),
            TagStoreError::UnknownTaxonomy(99)
        ));

        let tax = store.create_taxonomy("bio", 1).await.unwrap();
        assert!(matches!(
            store.create_tag(tax.id, "animal", Some(42)).await.unwrap_err(),
            TagStoreError::UnknownParent(42)
        ));

        // A parent tag from a different taxonomy is just as unknown
        let other = store.create_taxonomy("zoo", 1).await.unwrap();
        let stray = store.create_tag(other.id, "animal", None).await.unwrap();
        assert!(matches!(
            store
                .create_tag(tax.id, "mammal", Some(stray.id))
                .await
                .unwrap_err(),
            TagStoreError::UnknownParent(_)
        ));
    }

    #[tokio::test]
    async fn find_by_label_ignores_case() {
        let store = store();
        let tax = store.create_taxonomy("bio", 1).await.unwrap();
        let created = store.create_tag(tax.id, "Animal", None).await.unwrap();

        for probe in ["animal", "ANIMAL", "Animal"] {
            let found = store.find_by_label(tax.id, probe).await.unwrap().unwrap();
            assert_eq!(found.id, created.id);
            assert_eq!(found.label, "Animal"); // stored case preserved
        }
    }

    #[tokio::test]
    async fn subtree_query_is_inclusive_ordered_and_scoped() {
        let store = store();
        let tax = store.create_taxonomy("bio", 1).await.unwrap();
        let animal = store.create_tag(tax.id, "animal", None).await.unwrap();
        store
            .create_tag(tax.id, "reptile", Some(animal.id))
            .await
            .unwrap();
        store
            .create_tag(tax.id, "mammal", Some(animal.id))
            .await
            .unwrap();
        store.create_tag(tax.id, "fungus", None).await.unwrap();

        let subtree = store
            .get_tag_by_path_prefix(tax.id, animal.id)
            .await
            .unwrap();
        let labels: Vec<&str> = subtree.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["animal", "mammal", "reptile"]);
    }

    #[tokio::test]
    async fn non_cascading_delete_is_refused_while_in_use() {
        let store = store();
        let tax = store.create_taxonomy("bio", 1).await.unwrap();
        let animal = store.create_tag(tax.id, "animal", None).await.unwrap();
        store
            .create_tag(tax.id, "mammal", Some(animal.id))
            .await
            .unwrap();

        assert!(matches!(
            store.delete_tag(animal.id, false).await.unwrap_err(),
            TagStoreError::TagInUse(_)
        ));

        let lone = store.create_tag(tax.id, "fungus", None).await.unwrap();
        let entity = store.get_or_create_entity("course", "c1").await.unwrap();
        store.tag_entity(entity.id, lone.id).await.unwrap();
        assert!(matches!(
            store.delete_tag(lone.id, false).await.unwrap_err(),
            TagStoreError::TagInUse(_)
        ));

        store.untag_entity(entity.id, lone.id).await.unwrap();
        assert_eq!(store.delete_tag(lone.id, false).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_taxonomy_leaves_no_residue() {
        let store = store();
        let tax = store.create_taxonomy("bio", 1).await.unwrap();
        let animal = store.create_tag(tax.id, "animal", None).await.unwrap();
        let mammal = store
            .create_tag(tax.id, "mammal", Some(animal.id))
            .await
            .unwrap();
        let entity = store.get_or_create_entity("course", "c1").await.unwrap();
        store.tag_entity(entity.id, mammal.id).await.unwrap();

        let removed = store.delete_taxonomy(tax.id).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.get_taxonomy(tax.id).await.unwrap().is_none());
        assert!(store.get_tag(animal.id).await.unwrap().is_none());
        assert!(store.tags_of(entity.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tagging_is_idempotent_and_spans_taxonomies() {
        let store = store();
        let bio = store.create_taxonomy("bio", 1).await.unwrap();
        let difficulty = store.create_taxonomy("difficulty", 1).await.unwrap();
        let animal = store.create_tag(bio.id, "animal", None).await.unwrap();
        let easy = store.create_tag(difficulty.id, "easy", None).await.unwrap();

        let entity = store.get_or_create_entity("course", "c1").await.unwrap();
        let again = store.get_or_create_entity("course", "c1").await.unwrap();
        assert_eq!(entity, again);

        store.tag_entity(entity.id, animal.id).await.unwrap();
        store.tag_entity(entity.id, animal.id).await.unwrap();
        store.tag_entity(entity.id, easy.id).await.unwrap();

        let tags = store.tags_of(entity.id).await.unwrap();
        let labels: Vec<&str> = tags.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["animal", "easy"]);

        // Untagging something absent stays quiet
        store.untag_entity(entity.id, 999).await.unwrap();

        // Tagging against a missing tag is a typed error
        assert!(matches!(
            store.tag_entity(entity.id, 999).await.unwrap_err(),
            TagStoreError::UnknownTag(999)
        ));
    }

    #[tokio::test]
    async fn entities_under_does_not_double_report() {
        let store = store();
        let tax = store.create_taxonomy("bio", 1).await.unwrap();
        let animal = store.create_tag(tax.id, "animal", None).await.unwrap();
        let mammal = store
            .create_tag(tax.id, "mammal", Some(animal.id))
            .await
            .unwrap();

        let entity = store.get_or_create_entity("course", "c1").await.unwrap();
        store.tag_entity(entity.id, animal.id).await.unwrap();
        store.tag_entity(entity.id, mammal.id).await.unwrap();

        let under = store.entities_under(tax.id, animal.id).await.unwrap();
        assert_eq!(under.len(), 1);
    }
}
