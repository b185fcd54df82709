//! External links.
//!
//! An external link is the persisted identity mapping between one canonical
//! entity and its counterpart record in one external adapter. Links are
//! append-only with soft deletion; at most one active row exists per
//! `(adapter, external_id)` and per `(adapter, entity_type, internal_id)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use steeple_core::{EntityId, EntityType};

use crate::error::SyncResult;

mod memory;
mod pg;

pub use memory::MemoryLinkStore;
pub use pg::PgLinkStore;

/// Persisted identity mapping row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub adapter: String,
    pub entity_type: EntityType,
    pub internal_id: EntityId,
    pub external_id: String,
    /// Advisory progress indicator. Not a lock: it never excludes
    /// concurrent writers, and it is reset on both success and failure.
    pub syncing: bool,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ExternalLink {
    /// Create a fresh active link stamped with the current time.
    pub fn new(
        adapter: impl Into<String>,
        entity_type: EntityType,
        internal_id: EntityId,
        external_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            adapter: adapter.into(),
            entity_type,
            internal_id,
            external_id: external_id.into(),
            syncing: false,
            last_processed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether the link has not been soft-deleted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Partial patch applied by [`LinkStore::update`].
///
/// Every patch bumps `updated_at`, which is what re-confirms a link during
/// a sync pass and shields it from deletion detection.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub syncing: Option<bool>,
    pub last_processed_at: Option<DateTime<Utc>>,
}

impl LinkPatch {
    /// Patch only the advisory syncing flag.
    #[must_use]
    pub fn syncing(value: bool) -> Self {
        Self {
            syncing: Some(value),
            ..Self::default()
        }
    }

    /// Patch recording a processed record at `at`.
    #[must_use]
    pub fn processed_at(at: DateTime<Utc>) -> Self {
        Self {
            last_processed_at: Some(at),
            ..Self::default()
        }
    }
}

/// Persistent store of external links.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Append one link. Fails when an active row already exists for the
    /// link's `(adapter, external_id)` or `(adapter, entity_type,
    /// internal_id)`.
    async fn create(&self, link: ExternalLink) -> SyncResult<ExternalLink>;

    /// Append a batch of links.
    async fn create_many(&self, links: Vec<ExternalLink>) -> SyncResult<Vec<ExternalLink>>;

    /// Find the active link for an external record.
    async fn find_by_external_id(
        &self,
        adapter: &str,
        external_id: &str,
    ) -> SyncResult<Option<ExternalLink>>;

    /// Find the active link for a canonical entity.
    async fn find_by_entity(
        &self,
        adapter: &str,
        entity_type: EntityType,
        internal_id: EntityId,
    ) -> SyncResult<Option<ExternalLink>>;

    /// Apply a partial patch to the active link, bumping `updated_at`.
    async fn update(&self, adapter: &str, external_id: &str, patch: LinkPatch) -> SyncResult<()>;

    /// Soft-delete the active link by setting `deleted_at`.
    async fn soft_delete(&self, adapter: &str, external_id: &str) -> SyncResult<()>;

    /// Active links for `(adapter, entity_type)` whose `updated_at`
    /// predates `older_than`.
    async fn find_stale(
        &self,
        adapter: &str,
        entity_type: EntityType,
        older_than: DateTime<Utc>,
    ) -> SyncResult<Vec<ExternalLink>>;
}

/// Set the advisory syncing flag on a batch of links, unbounded.
///
/// Flag updates are advisory, so individual failures are logged and
/// swallowed rather than failing the surrounding sync.
pub async fn mark_sync_in_progress(store: &dyn LinkStore, links: &[ExternalLink]) {
    set_syncing(store, links, true).await;
}

/// Clear the advisory syncing flag on a batch of links, unbounded.
///
/// Invoked on success and failure paths alike.
pub async fn mark_sync_completed(store: &dyn LinkStore, links: &[ExternalLink]) {
    set_syncing(store, links, false).await;
}

async fn set_syncing(store: &dyn LinkStore, links: &[ExternalLink], value: bool) {
    let results = join_all(links.iter().map(|link| {
        store.update(
            &link.adapter,
            &link.external_id,
            LinkPatch::syncing(value),
        )
    }))
    .await;

    for (link, result) in links.iter().zip(results) {
        if let Err(error) = result {
            warn!(
                adapter = %link.adapter,
                entity_type = %link.entity_type,
                external_id = %link.external_id,
                %error,
                "failed to update advisory syncing flag"
            );
        }
    }
}
