//! In-memory link store.
//!
//! Backs the router, orchestrator, and webhook test suites, and doubles as
//! the store for single-process embedding. Enforces the same active-row
//! invariants as the Postgres store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use steeple_core::{EntityId, EntityType};

use crate::error::{SyncError, SyncResult};

use super::{ExternalLink, LinkPatch, LinkStore};

/// Link store holding rows in process memory.
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    rows: RwLock<Vec<ExternalLink>>,
}

impl MemoryLinkStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every row, active and soft-deleted.
    pub async fn all(&self) -> Vec<ExternalLink> {
        self.rows.read().await.clone()
    }

    fn active_conflict(rows: &[ExternalLink], link: &ExternalLink) -> bool {
        rows.iter().filter(|row| row.is_active()).any(|row| {
            row.adapter == link.adapter
                && (row.external_id == link.external_id
                    || (row.entity_type == link.entity_type
                        && row.internal_id == link.internal_id))
        })
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn create(&self, link: ExternalLink) -> SyncResult<ExternalLink> {
        let mut rows = self.rows.write().await;
        if Self::active_conflict(&rows, &link) {
            return Err(SyncError::ExternalLinkUpsert {
                adapter: link.adapter.clone(),
                entity_type: link.entity_type,
                message: format!("active link already exists for '{}'", link.external_id),
            });
        }
        rows.push(link.clone());
        Ok(link)
    }

    async fn create_many(&self, links: Vec<ExternalLink>) -> SyncResult<Vec<ExternalLink>> {
        let mut rows = self.rows.write().await;
        for link in &links {
            if Self::active_conflict(&rows, link) {
                return Err(SyncError::ExternalLinkUpsert {
                    adapter: link.adapter.clone(),
                    entity_type: link.entity_type,
                    message: format!("active link already exists for '{}'", link.external_id),
                });
            }
        }
        rows.extend(links.iter().cloned());
        Ok(links)
    }

    async fn find_by_external_id(
        &self,
        adapter: &str,
        external_id: &str,
    ) -> SyncResult<Option<ExternalLink>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| {
                row.is_active() && row.adapter == adapter && row.external_id == external_id
            })
            .cloned())
    }

    async fn find_by_entity(
        &self,
        adapter: &str,
        entity_type: EntityType,
        internal_id: EntityId,
    ) -> SyncResult<Option<ExternalLink>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| {
                row.is_active()
                    && row.adapter == adapter
                    && row.entity_type == entity_type
                    && row.internal_id == internal_id
            })
            .cloned())
    }

    async fn update(&self, adapter: &str, external_id: &str, patch: LinkPatch) -> SyncResult<()> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|row| {
            row.is_active() && row.adapter == adapter && row.external_id == external_id
        }) {
            if let Some(syncing) = patch.syncing {
                row.syncing = syncing;
            }
            if let Some(at) = patch.last_processed_at {
                row.last_processed_at = Some(at);
            }
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete(&self, adapter: &str, external_id: &str) -> SyncResult<()> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|row| {
            row.is_active() && row.adapter == adapter && row.external_id == external_id
        }) {
            let now = Utc::now();
            row.deleted_at = Some(now);
            row.updated_at = now;
        }
        Ok(())
    }

    async fn find_stale(
        &self,
        adapter: &str,
        entity_type: EntityType,
        older_than: DateTime<Utc>,
    ) -> SyncResult<Vec<ExternalLink>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| {
                row.is_active()
                    && row.adapter == adapter
                    && row.entity_type == entity_type
                    && row.updated_at < older_than
            })
            .cloned()
            .collect())
    }
}
