//! Postgres link store.
//!
//! Schema and migrations live with the surrounding application; this store
//! expects an `external_links` table with partial unique indexes over the
//! active rows for `(adapter, external_id)` and `(adapter, entity_type,
//! internal_id)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use steeple_core::{EntityId, EntityType};

use crate::error::{SyncError, SyncResult};

use super::{ExternalLink, LinkPatch, LinkStore};

const SELECT_COLUMNS: &str = "adapter, entity_type, internal_id, external_id, syncing, \
     last_processed_at, created_at, updated_at, deleted_at";

/// Link store backed by Postgres.
#[derive(Clone)]
pub struct PgLinkStore {
    pool: PgPool,
}

impl PgLinkStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_link(row: &PgRow) -> SyncResult<ExternalLink> {
        let adapter: String = row.get("adapter");
        let entity_type: String = row.get("entity_type");
        let entity_type = entity_type
            .parse::<EntityType>()
            .map_err(|message| SyncError::ExternalLinkRetrieval {
                adapter: adapter.clone(),
                message,
            })?;
        let internal_id: Uuid = row.get("internal_id");

        Ok(ExternalLink {
            adapter,
            entity_type,
            internal_id: EntityId::from_uuid(internal_id),
            external_id: row.get("external_id"),
            syncing: row.get("syncing"),
            last_processed_at: row.get("last_processed_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        })
    }

    async fn insert(&self, link: &ExternalLink) -> SyncResult<()> {
        sqlx::query(
            r"
            INSERT INTO external_links (
                adapter, entity_type, internal_id, external_id, syncing,
                last_processed_at, created_at, updated_at, deleted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&link.adapter)
        .bind(link.entity_type.as_str())
        .bind(link.internal_id.as_uuid())
        .bind(&link.external_id)
        .bind(link.syncing)
        .bind(link.last_processed_at)
        .bind(link.created_at)
        .bind(link.updated_at)
        .bind(link.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                SyncError::ExternalLinkUpsert {
                    adapter: link.adapter.clone(),
                    entity_type: link.entity_type,
                    message: db.message().to_string(),
                }
            }
            _ => SyncError::Database(e),
        })?;

        Ok(())
    }
}

#[async_trait]
impl LinkStore for PgLinkStore {
    #[instrument(skip(self, link), fields(adapter = %link.adapter, external_id = %link.external_id))]
    async fn create(&self, link: ExternalLink) -> SyncResult<ExternalLink> {
        self.insert(&link).await?;
        Ok(link)
    }

    async fn create_many(&self, links: Vec<ExternalLink>) -> SyncResult<Vec<ExternalLink>> {
        for link in &links {
            self.insert(link).await?;
        }
        Ok(links)
    }

    #[instrument(skip(self))]
    async fn find_by_external_id(
        &self,
        adapter: &str,
        external_id: &str,
    ) -> SyncResult<Option<ExternalLink>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {SELECT_COLUMNS}
            FROM external_links
            WHERE adapter = $1 AND external_id = $2 AND deleted_at IS NULL
            ",
        ))
        .bind(adapter)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_link).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_entity(
        &self,
        adapter: &str,
        entity_type: EntityType,
        internal_id: EntityId,
    ) -> SyncResult<Option<ExternalLink>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {SELECT_COLUMNS}
            FROM external_links
            WHERE adapter = $1 AND entity_type = $2 AND internal_id = $3
              AND deleted_at IS NULL
            ",
        ))
        .bind(adapter)
        .bind(entity_type.as_str())
        .bind(internal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_link).transpose()
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, adapter: &str, external_id: &str, patch: LinkPatch) -> SyncResult<()> {
        sqlx::query(
            r"
            UPDATE external_links
            SET syncing = COALESCE($3, syncing),
                last_processed_at = COALESCE($4, last_processed_at),
                updated_at = $5
            WHERE adapter = $1 AND external_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(adapter)
        .bind(external_id)
        .bind(patch.syncing)
        .bind(patch.last_processed_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, adapter: &str, external_id: &str) -> SyncResult<()> {
        sqlx::query(
            r"
            UPDATE external_links
            SET deleted_at = $3, updated_at = $3
            WHERE adapter = $1 AND external_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(adapter)
        .bind(external_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_stale(
        &self,
        adapter: &str,
        entity_type: EntityType,
        older_than: DateTime<Utc>,
    ) -> SyncResult<Vec<ExternalLink>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {SELECT_COLUMNS}
            FROM external_links
            WHERE adapter = $1 AND entity_type = $2 AND deleted_at IS NULL
              AND updated_at < $3
            ORDER BY updated_at
            ",
        ))
        .bind(adapter)
        .bind(entity_type.as_str())
        .bind(older_than)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_link).collect()
    }
}
