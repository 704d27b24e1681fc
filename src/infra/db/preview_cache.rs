use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::{
    application::repos::{PreviewCacheRepo, RepoError},
    domain::{entities::PreviewEntry, types::CardKind},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PreviewRow {
    entity_type: CardKind,
    entity_id: String,
    cache_key: String,
    storage_path: String,
    data_hash: String,
    expires_at: OffsetDateTime,
}

impl From<PreviewRow> for PreviewEntry {
    fn from(row: PreviewRow) -> Self {
        Self {
            kind: row.entity_type,
            entity_id: row.entity_id,
            cache_key: row.cache_key,
            storage_path: row.storage_path,
            data_hash: row.data_hash,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl PreviewCacheRepo for PostgresRepositories {
    async fn lookup(&self, cache_key: &str) -> Result<Option<PreviewEntry>, RepoError> {
        let row = query_as::<_, PreviewRow>(
            "SELECT entity_type, entity_id, cache_key, storage_path, data_hash, expires_at \
             FROM preview_cache \
             WHERE cache_key = $1",
        )
        .bind(cache_key)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PreviewEntry::from))
    }

    async fn upsert(&self, entry: &PreviewEntry) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO preview_cache \
                 (cache_key, entity_type, entity_id, storage_path, data_hash, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (cache_key) DO UPDATE SET \
                 entity_type = EXCLUDED.entity_type, \
                 entity_id = EXCLUDED.entity_id, \
                 storage_path = EXCLUDED.storage_path, \
                 data_hash = EXCLUDED.data_hash, \
                 expires_at = EXCLUDED.expires_at, \
                 updated_at = now()",
        )
        .bind(&entry.cache_key)
        .bind(entry.kind)
        .bind(&entry.entity_id)
        .bind(&entry.storage_path)
        .bind(&entry.data_hash)
        .bind(entry.expires_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
