//! Sync orchestrator.
//!
//! Pulls external collections into the canonical graph. Two modes: a full
//! collection sync per entity type, driven by a schedule, and a single
//! entity sync, driven by webhooks. The full pass ends with deletion
//! detection, which is the only way external-side deletions are learned
//! since the vendors expose no deletion feed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use tracing::{info, instrument, warn};

use steeple_adapter::registry::BoxedAdapter;
use steeple_adapter::transform::EntityTransformer;
use steeple_adapter::types::RawRecord;
use steeple_core::{EntityId, EntityType};

use crate::error::{SyncError, SyncResult};
use crate::link::{
    mark_sync_completed, mark_sync_in_progress, ExternalLink, LinkPatch, LinkStore,
};
use crate::sink::{EntitySink, EntityUpsert, RelationshipUpsert};

/// Aggregate result of one full entity-type sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub pages: u32,
    pub records: u64,
    pub links_created: u64,
    pub links_confirmed: u64,
    pub records_failed: u64,
    pub deleted: u64,
    /// True when the manifest excluded the entity from sync.
    pub skipped: bool,
}

impl SyncSummary {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Pull-sync engine for one adapter.
pub struct SyncOrchestrator {
    adapter: BoxedAdapter,
    links: Arc<dyn LinkStore>,
    sink: Arc<dyn EntitySink>,
}

impl SyncOrchestrator {
    pub fn new(
        adapter: BoxedAdapter,
        links: Arc<dyn LinkStore>,
        sink: Arc<dyn EntitySink>,
    ) -> Self {
        Self {
            adapter,
            links,
            sink,
        }
    }

    /// Sync every syncable entity type concurrently.
    ///
    /// Types are independent of each other; only the pages within one type
    /// are sequential.
    pub async fn sync_all(&self) -> Vec<(EntityType, SyncResult<SyncSummary>)> {
        let types: Vec<EntityType> = self
            .adapter
            .manifest()
            .syncable()
            .map(|entry| entry.entity_type)
            .collect();

        join_all(types.into_iter().map(|entity_type| async move {
            (entity_type, self.sync_entity_type(entity_type).await)
        }))
        .await
    }

    /// Full collection sync for one entity type.
    ///
    /// Streams every page sequentially (vendor pagination is stateful),
    /// upserts links and entities, then soft-deletes links that were not
    /// re-confirmed during the pass. Staleness compares link `updated_at`
    /// against the pass start with no skew window, so a storage clock
    /// behind the orchestrator clock shrinks the safety margin.
    #[instrument(skip(self), fields(adapter = %self.adapter.tag()))]
    pub async fn sync_entity_type(&self, entity_type: EntityType) -> SyncResult<SyncSummary> {
        let entry = self.adapter.manifest().require(entity_type)?;
        if entry.skip_sync {
            info!(%entity_type, "entity excluded from sync by manifest");
            return Ok(SyncSummary::skipped());
        }

        let sync_start = Utc::now();
        let transformer = &entry.transformer;
        let mut summary = SyncSummary::default();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .adapter
                .list_entity_page(entity_type, cursor.as_deref())
                .await?;
            summary.pages += 1;

            self.process_records(entity_type, transformer, &page.records, &mut summary)
                .await?;

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        summary.deleted = self.detect_deletions(entity_type, sync_start).await?;

        info!(
            %entity_type,
            pages = summary.pages,
            records = summary.records,
            links_created = summary.links_created,
            records_failed = summary.records_failed,
            deleted = summary.deleted,
            "entity type sync complete"
        );
        Ok(summary)
    }

    /// Sync one external record, webhook-triggered.
    #[instrument(skip(self), fields(adapter = %self.adapter.tag()))]
    pub async fn sync_entity_id(
        &self,
        entity_type: EntityType,
        external_id: &str,
    ) -> SyncResult<()> {
        let record = self
            .adapter
            .fetch_entity_by_id(entity_type, external_id)
            .await?;
        let transformer = self.adapter.transformer(entity_type)?;

        let prepared = self.prepare(entity_type, transformer, &record).await?;
        let links = [prepared.link.clone()];

        mark_sync_in_progress(self.links.as_ref(), &links).await;
        let entities = self.sink.process_entities(vec![prepared.upsert]).await;
        let relationships = if prepared.relationships.is_empty() {
            Ok(())
        } else {
            self.sink
                .process_relationships(prepared.relationships)
                .await
        };
        mark_sync_completed(self.links.as_ref(), &links).await;

        entities.map_err(|e| SyncError::EntityProcessing {
            message: e.to_string(),
        })?;
        relationships.map_err(|e| SyncError::RelationshipProcessing {
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Soft-delete the link for an external record and mark its canonical
    /// entity deleted. Returns false when no active link exists, which is
    /// not an error.
    #[instrument(skip(self), fields(adapter = %self.adapter.tag()))]
    pub async fn delete_by_external_id(&self, external_id: &str) -> SyncResult<bool> {
        let Some(link) = self
            .links
            .find_by_external_id(self.adapter.tag(), external_id)
            .await?
        else {
            info!(external_id, "no external link for deletion; skipping");
            return Ok(false);
        };

        self.links
            .soft_delete(&link.adapter, &link.external_id)
            .await?;
        self.sink
            .mark_deleted(link.entity_type, link.internal_id)
            .await
            .map_err(|e| SyncError::EntityDeletion {
                entity_type: link.entity_type,
                internal_id: link.internal_id,
                message: e.to_string(),
            })?;
        Ok(true)
    }

    async fn process_records(
        &self,
        entity_type: EntityType,
        transformer: &EntityTransformer,
        records: &[RawRecord],
        summary: &mut SyncSummary,
    ) -> SyncResult<()> {
        let mut entity_batch = Vec::new();
        let mut relationship_batch = Vec::new();
        let mut touched = Vec::new();

        for record in records {
            summary.records += 1;
            match self.prepare(entity_type, transformer, record).await {
                Ok(prepared) => {
                    if prepared.link_created {
                        summary.links_created += 1;
                    } else {
                        summary.links_confirmed += 1;
                    }
                    entity_batch.push(prepared.upsert);
                    relationship_batch.extend(prepared.relationships);
                    touched.push(prepared.link);
                }
                Err(error) => {
                    summary.records_failed += 1;
                    warn!(
                        adapter = %self.adapter.tag(),
                        %entity_type,
                        external_id = %record.id,
                        %error,
                        "record failed; continuing with the rest of the page"
                    );
                }
            }
        }

        if entity_batch.is_empty() {
            return Ok(());
        }

        mark_sync_in_progress(self.links.as_ref(), &touched).await;
        let entities = self.sink.process_entities(entity_batch).await;
        let relationships = if relationship_batch.is_empty() {
            Ok(())
        } else {
            self.sink.process_relationships(relationship_batch).await
        };
        mark_sync_completed(self.links.as_ref(), &touched).await;

        entities.map_err(|e| SyncError::EntityProcessing {
            message: e.to_string(),
        })?;
        relationships.map_err(|e| SyncError::RelationshipProcessing {
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Decode one record and upsert its link.
    async fn prepare(
        &self,
        entity_type: EntityType,
        transformer: &EntityTransformer,
        record: &RawRecord,
    ) -> SyncResult<PreparedRecord> {
        let attributes = transformer.decode(&record.attributes)?;

        let adapter = self.adapter.tag();
        let (link, link_created) = match self
            .links
            .find_by_external_id(adapter, &record.id)
            .await?
        {
            Some(link) => {
                // Re-confirm: bumping updated_at shields the link from
                // this pass's deletion detection.
                self.links
                    .update(adapter, &record.id, LinkPatch::processed_at(Utc::now()))
                    .await?;
                (link, false)
            }
            None => {
                let link =
                    ExternalLink::new(adapter, entity_type, EntityId::new(), record.id.clone());
                (self.links.create(link).await?, true)
            }
        };

        let relationships = parse_relationships(
            entity_type,
            &record.id,
            link.internal_id,
            &record.relationships,
        );

        Ok(PreparedRecord {
            upsert: EntityUpsert {
                entity_type,
                internal_id: link.internal_id,
                external_id: record.id.clone(),
                attributes,
            },
            relationships,
            link,
            link_created,
        })
    }

    async fn detect_deletions(
        &self,
        entity_type: EntityType,
        sync_start: DateTime<Utc>,
    ) -> SyncResult<u64> {
        let adapter = self.adapter.tag();
        let stale = self
            .links
            .find_stale(adapter, entity_type, sync_start)
            .await
            .map_err(|e| SyncError::Detection {
                adapter: adapter.to_string(),
                entity_type,
                message: e.to_string(),
            })?;

        let mut deleted = 0;
        for link in stale {
            match self.retire_stale_link(&link).await {
                Ok(()) => deleted += 1,
                Err(error) => warn!(
                    adapter = %link.adapter,
                    %entity_type,
                    external_id = %link.external_id,
                    %error,
                    "failed to retire stale link"
                ),
            }
        }
        Ok(deleted)
    }

    async fn retire_stale_link(&self, link: &ExternalLink) -> SyncResult<()> {
        self.links
            .soft_delete(&link.adapter, &link.external_id)
            .await?;
        self.sink
            .mark_deleted(link.entity_type, link.internal_id)
            .await
            .map_err(|e| SyncError::EntityDeletion {
                entity_type: link.entity_type,
                internal_id: link.internal_id,
                message: e.to_string(),
            })
    }
}

struct PreparedRecord {
    upsert: EntityUpsert,
    relationships: Vec<RelationshipUpsert>,
    link: ExternalLink,
    link_created: bool,
}

/// Parse a vendor relationship block into relationship upserts.
///
/// Accepts both to-one (`{"data": {"type", "id"}}`) and to-many
/// (`{"data": [...]}`) shapes. Entries without a concrete `data.type` and
/// `data.id` pair are skipped; a `data: null` entry clears nothing because
/// the canonical side owns relationship deletion.
fn parse_relationships(
    source_entity_type: EntityType,
    source_external_id: &str,
    source_internal_id: EntityId,
    relationships: &Value,
) -> Vec<RelationshipUpsert> {
    let Some(block) = relationships.as_object() else {
        return Vec::new();
    };

    let mut upserts = Vec::new();
    for (name, relationship) in block {
        let Some(data) = relationship.get("data") else {
            continue;
        };

        let targets: Vec<&Value> = match data {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![data],
            _ => continue,
        };

        for target in targets {
            let (Some(target_type), Some(target_id)) = (
                target.get("type").and_then(Value::as_str),
                target.get("id").and_then(Value::as_str),
            ) else {
                continue;
            };

            upserts.push(RelationshipUpsert {
                source_entity_type,
                source_internal_id,
                source_external_id: source_external_id.to_string(),
                name: name.clone(),
                target_type: target_type.to_string(),
                target_external_id: target_id.to_string(),
            });
        }
    }
    upserts
}
