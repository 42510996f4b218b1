//! TagHierarchy implementation for SQLite
//!
//! Subtree membership is never answered by walking parent links. Every tag
//! row carries its materialized path, and "everything under this tag" is the
//! half-open range `[path, prefix_upper_bound(path))` against the
//! `(taxonomy_id, path)` index. Duplicate labels are rejected by the unique
//! index on `(taxonomy_id, lower(label))` at insert time, so two racing
//! creators get exactly one success and one `DuplicateLabel`.

use crate::connection::SqlitePool;
use crate::error::{is_unique_violation, map_sql};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tagstore_core::{
    path, Tag, TagHierarchy, TagId, TagStoreError, TagStoreResult, Taxonomy, TaxonomyId,
};
use tracing::debug;

/// SQLite implementation of [`TagHierarchy`].
#[derive(Clone)]
pub struct SqliteTagHierarchy {
    pool: SqlitePool,
}

impl SqliteTagHierarchy {
    /// Create a new hierarchy over the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagHierarchy for SqliteTagHierarchy {
    async fn create_taxonomy(&self, name: &str, owner_id: i64) -> TagStoreResult<Taxonomy> {
        let pool = self.pool.clone();
        let name = name.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let created_at = Utc::now();
                conn.execute(
                    "INSERT INTO taxonomies (name, owner_id, created_at) VALUES (?1, ?2, ?3)",
                    params![name, owner_id, created_at.to_rfc3339()],
                )
                .map_err(map_sql)?;

                Ok(Taxonomy {
                    id: conn.last_insert_rowid(),
                    name,
                    owner_id,
                    created_at,
                })
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn get_taxonomy(&self, taxonomy_id: TaxonomyId) -> TagStoreResult<Option<Taxonomy>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.query_row(
                    "SELECT id, name, owner_id, created_at FROM taxonomies WHERE id = ?1",
                    [taxonomy_id],
                    row_to_taxonomy,
                )
                .optional()
                .map_err(map_sql)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn delete_taxonomy(&self, taxonomy_id: TaxonomyId) -> TagStoreResult<usize> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction().map_err(map_sql)?;

                let exists: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM taxonomies WHERE id = ?1",
                        [taxonomy_id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(map_sql)?;
                if exists.is_none() {
                    return Err(TagStoreError::UnknownTaxonomy(taxonomy_id));
                }

                tx.execute(
                    "DELETE FROM entity_tags WHERE tag_id IN
                         (SELECT id FROM tags WHERE taxonomy_id = ?1)",
                    [taxonomy_id],
                )
                .map_err(map_sql)?;
                let removed = tx
                    .execute("DELETE FROM tags WHERE taxonomy_id = ?1", [taxonomy_id])
                    .map_err(map_sql)?;
                tx.execute("DELETE FROM taxonomies WHERE id = ?1", [taxonomy_id])
                    .map_err(map_sql)?;

                tx.commit().map_err(map_sql)?;
                debug!(taxonomy_id, removed_tags = removed, "deleted taxonomy");
                Ok(removed)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn create_tag(
        &self,
        taxonomy_id: TaxonomyId,
        label: &str,
        parent: Option<TagId>,
    ) -> TagStoreResult<Tag> {
        path::validate_label(label)?;

        let pool = self.pool.clone();
        let label = label.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction().map_err(map_sql)?;

                let taxonomy: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM taxonomies WHERE id = ?1",
                        [taxonomy_id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(map_sql)?;
                if taxonomy.is_none() {
                    return Err(TagStoreError::UnknownTaxonomy(taxonomy_id));
                }

                // A parent outside this taxonomy is as absent as a missing one
                let parent_path = match parent {
                    Some(parent_id) => {
                        let found: Option<String> = tx
                            .query_row(
                                "SELECT path FROM tags WHERE id = ?1 AND taxonomy_id = ?2",
                                params![parent_id, taxonomy_id],
                                |row| row.get(0),
                            )
                            .optional()
                            .map_err(map_sql)?;
                        Some(found.ok_or(TagStoreError::UnknownParent(parent_id))?)
                    }
                    None => None,
                };

                let tag_path = path::build_path(taxonomy_id, &label, parent_path.as_deref());
                let created_at = Utc::now();

                // The unique index on (taxonomy_id, lower(label)) is the
                // duplicate check; no pre-query, no race window.
                let inserted = tx.execute(
                    "INSERT INTO tags (taxonomy_id, label, path, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![taxonomy_id, label, tag_path, created_at.to_rfc3339()],
                );
                if let Err(err) = inserted {
                    if is_unique_violation(&err) {
                        return Err(TagStoreError::DuplicateLabel { taxonomy_id, label });
                    }
                    return Err(map_sql(err));
                }
                let id = tx.last_insert_rowid();

                tx.commit().map_err(map_sql)?;
                Ok(Tag {
                    id,
                    taxonomy_id,
                    label,
                    path: tag_path,
                    created_at,
                })
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn get_tag(&self, tag_id: TagId) -> TagStoreResult<Option<Tag>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.query_row(
                    "SELECT id, taxonomy_id, label, path, created_at FROM tags WHERE id = ?1",
                    [tag_id],
                    row_to_tag,
                )
                .optional()
                .map_err(map_sql)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn get_tag_by_path_prefix(
        &self,
        taxonomy_id: TaxonomyId,
        ancestor_tag_id: TagId,
    ) -> TagStoreResult<Vec<Tag>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let ancestor_path: Option<String> = conn
                    .query_row(
                        "SELECT path FROM tags WHERE id = ?1 AND taxonomy_id = ?2",
                        params![ancestor_tag_id, taxonomy_id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(map_sql)?;
                let ancestor_path =
                    ancestor_path.ok_or(TagStoreError::UnknownTag(ancestor_tag_id))?;
                let upper = path::prefix_upper_bound(&ancestor_path);

                let mut stmt = conn
                    .prepare(
                        "SELECT id, taxonomy_id, label, path, created_at
                         FROM tags
                         WHERE taxonomy_id = ?1 AND path >= ?2 AND path < ?3
                         ORDER BY label",
                    )
                    .map_err(map_sql)?;
                let tags = stmt
                    .query_map(params![taxonomy_id, ancestor_path, upper], row_to_tag)
                    .map_err(map_sql)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(map_sql)?;

                Ok(tags)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn find_by_label(
        &self,
        taxonomy_id: TaxonomyId,
        label: &str,
    ) -> TagStoreResult<Option<Tag>> {
        let pool = self.pool.clone();
        let label = label.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                // Probes the expression index on (taxonomy_id, lower(label))
                conn.query_row(
                    "SELECT id, taxonomy_id, label, path, created_at
                     FROM tags
                     WHERE taxonomy_id = ?1 AND lower(label) = lower(?2)",
                    params![taxonomy_id, label],
                    row_to_tag,
                )
                .optional()
                .map_err(map_sql)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn delete_tag(&self, tag_id: TagId, cascade: bool) -> TagStoreResult<usize> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction().map_err(map_sql)?;

                let tag = tx
                    .query_row(
                        "SELECT id, taxonomy_id, label, path, created_at FROM tags WHERE id = ?1",
                        [tag_id],
                        row_to_tag,
                    )
                    .optional()
                    .map_err(map_sql)?
                    .ok_or(TagStoreError::UnknownTag(tag_id))?;
                let upper = path::prefix_upper_bound(&tag.path);

                if !cascade {
                    let descendants: i64 = tx
                        .query_row(
                            "SELECT COUNT(*) FROM tags
                             WHERE taxonomy_id = ?1 AND path >= ?2 AND path < ?3 AND id <> ?4",
                            params![tag.taxonomy_id, tag.path, upper, tag.id],
                            |row| row.get(0),
                        )
                        .map_err(map_sql)?;
                    let associations: i64 = tx
                        .query_row(
                            "SELECT COUNT(*) FROM entity_tags WHERE tag_id = ?1",
                            [tag.id],
                            |row| row.get(0),
                        )
                        .map_err(map_sql)?;
                    if descendants > 0 || associations > 0 {
                        return Err(TagStoreError::TagInUse(tag_id));
                    }
                }

                // Subtree and its associations go together or not at all
                tx.execute(
                    "DELETE FROM entity_tags WHERE tag_id IN
                         (SELECT id FROM tags
                          WHERE taxonomy_id = ?1 AND path >= ?2 AND path < ?3)",
                    params![tag.taxonomy_id, tag.path, upper],
                )
                .map_err(map_sql)?;
                let removed = tx
                    .execute(
                        "DELETE FROM tags WHERE taxonomy_id = ?1 AND path >= ?2 AND path < ?3",
                        params![tag.taxonomy_id, tag.path, upper],
                    )
                    .map_err(map_sql)?;

                tx.commit().map_err(map_sql)?;
                debug!(tag_id, removed, cascade, "deleted tag");
                Ok(removed)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }
}

/// Convert a database row to a Taxonomy
fn row_to_taxonomy(row: &rusqlite::Row) -> rusqlite::Result<Taxonomy> {
    Ok(Taxonomy {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        created_at: parse_timestamp(row.get::<_, String>(3)?),
    })
}

/// Convert a database row to a Tag
pub(crate) fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        taxonomy_id: row.get(1)?,
        label: row.get(2)?,
        path: row.get(3)?,
        created_at: parse_timestamp(row.get::<_, String>(4)?),
    })
}

pub(crate) fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
