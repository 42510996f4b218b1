//! EntityTagIndex implementation for SQLite

use crate::connection::SqlitePool;
use crate::error::map_sql;
use crate::hierarchy::{parse_timestamp, row_to_tag};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tagstore_core::{
    path, Entity, EntityId, EntityTagIndex, Tag, TagId, TagStoreError, TagStoreResult, TaxonomyId,
};

/// SQLite implementation of [`EntityTagIndex`].
#[derive(Clone)]
pub struct SqliteEntityTagIndex {
    pool: SqlitePool,
}

impl SqliteEntityTagIndex {
    /// Create a new index over the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityTagIndex for SqliteEntityTagIndex {
    async fn get_or_create_entity(
        &self,
        entity_type: &str,
        external_id: &str,
    ) -> TagStoreResult<Entity> {
        let pool = self.pool.clone();
        let entity_type = entity_type.to_string();
        let external_id = external_id.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                // The unique identity pair makes this upsert race-safe:
                // a losing insert is a no-op and the read returns the winner
                conn.execute(
                    "INSERT INTO entities (entity_type, external_id, created_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(entity_type, external_id) DO NOTHING",
                    params![entity_type, external_id, Utc::now().to_rfc3339()],
                )
                .map_err(map_sql)?;

                conn.query_row(
                    "SELECT id, entity_type, external_id, created_at
                     FROM entities
                     WHERE entity_type = ?1 AND external_id = ?2",
                    params![entity_type, external_id],
                    row_to_entity,
                )
                .map_err(map_sql)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn get_entity(
        &self,
        entity_type: &str,
        external_id: &str,
    ) -> TagStoreResult<Option<Entity>> {
        let pool = self.pool.clone();
        let entity_type = entity_type.to_string();
        let external_id = external_id.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.query_row(
                    "SELECT id, entity_type, external_id, created_at
                     FROM entities
                     WHERE entity_type = ?1 AND external_id = ?2",
                    params![entity_type, external_id],
                    row_to_entity,
                )
                .optional()
                .map_err(map_sql)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn tag_entity(&self, entity_id: EntityId, tag_id: TagId) -> TagStoreResult<()> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let tag: Option<i64> = conn
                    .query_row("SELECT id FROM tags WHERE id = ?1", [tag_id], |row| {
                        row.get(0)
                    })
                    .optional()
                    .map_err(map_sql)?;
                if tag.is_none() {
                    return Err(TagStoreError::UnknownTag(tag_id));
                }

                conn.execute(
                    "INSERT INTO entity_tags (entity_id, tag_id, created_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(entity_id, tag_id) DO NOTHING",
                    params![entity_id, tag_id, Utc::now().to_rfc3339()],
                )
                .map_err(map_sql)?;

                Ok(())
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn untag_entity(&self, entity_id: EntityId, tag_id: TagId) -> TagStoreResult<()> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.execute(
                    "DELETE FROM entity_tags WHERE entity_id = ?1 AND tag_id = ?2",
                    params![entity_id, tag_id],
                )
                .map_err(map_sql)?;
                Ok(())
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn tags_of(&self, entity_id: EntityId) -> TagStoreResult<Vec<Tag>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT t.id, t.taxonomy_id, t.label, t.path, t.created_at
                         FROM tags t
                         JOIN entity_tags et ON et.tag_id = t.id
                         WHERE et.entity_id = ?1
                         ORDER BY t.label",
                    )
                    .map_err(map_sql)?;
                let tags = stmt
                    .query_map([entity_id], row_to_tag)
                    .map_err(map_sql)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(map_sql)?;

                Ok(tags)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }

    async fn entities_under(
        &self,
        taxonomy_id: TaxonomyId,
        ancestor_tag_id: TagId,
    ) -> TagStoreResult<Vec<Entity>> {
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

                // One range scan over the subtree joined onto the association
                // table; DISTINCT keeps multiply-tagged entities single
                let mut stmt = conn
                    .prepare(
                        "SELECT DISTINCT e.id, e.entity_type, e.external_id, e.created_at
                         FROM entities e
                         JOIN entity_tags et ON et.entity_id = e.id
                         JOIN tags t ON t.id = et.tag_id
                         WHERE t.taxonomy_id = ?1 AND t.path >= ?2 AND t.path < ?3
                         ORDER BY e.id",
                    )
                    .map_err(map_sql)?;
                let entities = stmt
                    .query_map(params![taxonomy_id, ancestor_path, upper], row_to_entity)
                    .map_err(map_sql)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(map_sql)?;

                Ok(entities)
            })
        })
        .await
        .map_err(|e| TagStoreError::Backend(e.to_string()))?
    }
}

/// Convert a database row to an Entity
fn row_to_entity(row: &rusqlite::Row) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: row.get(0)?,
        entity_type: row.get(1)?,
        external_id: row.get(2)?,
        created_at: parse_timestamp(row.get::<_, String>(3)?),
    })
}
