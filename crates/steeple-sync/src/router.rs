//! CRUD mutation router.
//!
//! Consumes internal write operations tagged with a table name and routes
//! them to the adapter's create/update/delete calls through the link
//! store. Operations in a batch are independent: a failure is caught,
//! logged with its context, and never aborts siblings.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use steeple_adapter::error::AdapterError;
use steeple_adapter::registry::BoxedAdapter;
use steeple_core::{EntityId, EntityType};

use crate::error::{RouterError, RouterResult};
use crate::inflect::table_to_entity_name;
use crate::link::{ExternalLink, LinkStore};

/// The write operations the router accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudOp {
    Insert,
    Update,
    Upsert,
    Delete,
}

impl CrudOp {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CrudOp::Insert => "insert",
            CrudOp::Update => "update",
            CrudOp::Upsert => "upsert",
            CrudOp::Delete => "delete",
        }
    }
}

impl std::fmt::Display for CrudOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `<table>|<operation>` mutation name.
pub fn parse_mutation_name(name: &str) -> RouterResult<(String, CrudOp)> {
    let Some((table, op)) = name.split_once('|') else {
        return Err(RouterError::InvalidMutationName {
            mutation_name: name.to_string(),
        });
    };

    let op = match op {
        "insert" => CrudOp::Insert,
        "update" => CrudOp::Update,
        "upsert" => CrudOp::Upsert,
        "delete" => CrudOp::Delete,
        other => {
            return Err(RouterError::UnsupportedOperation {
                operation: other.to_string(),
                mutation_name: name.to_string(),
            })
        }
    };

    Ok((table.to_string(), op))
}

/// Primary key of the mutated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub id: EntityId,
}

/// One unit of work consumed by the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudOperation {
    pub op: CrudOp,
    pub table_name: String,
    pub primary_key: PrimaryKey,
    /// Canonical-shaped row value.
    pub value: serde_json::Value,
}

/// What happened to one routed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A new external record was created and a link persisted.
    Created,
    /// The existing external record was updated through its link.
    Updated,
    /// The external record and its link were deleted.
    Deleted,
    /// Delete with no link on file; nothing to do.
    SkippedNoLink,
    /// The table name maps to no known entity type.
    SkippedUnmappedTable,
    /// The operation failed and was logged.
    Failed,
}

/// Aggregate result of one routed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterSummary {
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl RouterSummary {
    fn add(&mut self, outcome: RouteOutcome) {
        match outcome {
            RouteOutcome::Created => self.created += 1,
            RouteOutcome::Updated => self.updated += 1,
            RouteOutcome::Deleted => self.deleted += 1,
            RouteOutcome::SkippedNoLink | RouteOutcome::SkippedUnmappedTable => self.skipped += 1,
            RouteOutcome::Failed => self.failed += 1,
        }
    }
}

/// Routes CRUD operations to one adapter.
pub struct CrudRouter {
    adapter: BoxedAdapter,
    links: Arc<dyn LinkStore>,
}

impl CrudRouter {
    pub fn new(adapter: BoxedAdapter, links: Arc<dyn LinkStore>) -> Self {
        Self { adapter, links }
    }

    /// Route a batch with unbounded concurrency.
    ///
    /// Every operation is processed independently; failures are logged and
    /// counted without aborting siblings.
    pub async fn route_batch(&self, operations: Vec<CrudOperation>) -> RouterSummary {
        let outcomes = join_all(
            operations
                .iter()
                .map(|operation| self.route_logged(operation)),
        )
        .await;

        let mut summary = RouterSummary::default();
        for outcome in outcomes {
            summary.add(outcome);
        }

        info!(
            adapter = %self.adapter.tag(),
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            skipped = summary.skipped,
            failed = summary.failed,
            "routed crud batch"
        );
        summary
    }

    async fn route_logged(&self, operation: &CrudOperation) -> RouteOutcome {
        match self.route_one(operation).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let (entity_name, external_id) = match &error {
                    RouterError::OperationFailed {
                        entity_name,
                        external_id,
                        ..
                    } => (entity_name.clone(), external_id.clone()),
                    _ => (table_to_entity_name(&operation.table_name), None),
                };
                warn!(
                    adapter = %self.adapter.tag(),
                    entity = %entity_name,
                    external_id = external_id.as_deref().unwrap_or("-"),
                    operation = %operation.op,
                    %error,
                    "crud operation failed"
                );
                RouteOutcome::Failed
            }
        }
    }

    /// Route one operation.
    pub async fn route_one(&self, operation: &CrudOperation) -> RouterResult<RouteOutcome> {
        let entity_name = table_to_entity_name(&operation.table_name);
        let Ok(entity_type) = entity_name.parse::<EntityType>() else {
            debug!(
                adapter = %self.adapter.tag(),
                table = %operation.table_name,
                entity = %entity_name,
                "table maps to no entity type; skipping"
            );
            return Ok(RouteOutcome::SkippedUnmappedTable);
        };

        match operation.op {
            CrudOp::Insert | CrudOp::Update | CrudOp::Upsert => {
                self.write(entity_type, &entity_name, operation).await
            }
            CrudOp::Delete => self.delete(entity_type, &entity_name, operation).await,
        }
    }

    async fn write(
        &self,
        entity_type: EntityType,
        entity_name: &str,
        operation: &CrudOperation,
    ) -> RouterResult<RouteOutcome> {
        let value = operation.value.as_object().ok_or_else(|| {
            self.failed(
                operation.op,
                entity_name,
                None,
                AdapterError::transform(entity_type, "mutation value is not a JSON object"),
            )
        })?;

        let encoded = self
            .adapter
            .transformer(entity_type)
            .and_then(|t| t.encode(value))
            .map_err(|e| self.failed(operation.op, entity_name, None, e))?;

        let existing = self
            .links
            .find_by_entity(self.adapter.tag(), entity_type, operation.primary_key.id)
            .await
            .map_err(|e| self.failed(operation.op, entity_name, None, e))?;

        match existing {
            None => {
                let record = self
                    .adapter
                    .create_entity(entity_type, &encoded)
                    .await
                    .map_err(|e| self.failed(operation.op, entity_name, None, e))?;

                let link = ExternalLink::new(
                    self.adapter.tag(),
                    entity_type,
                    operation.primary_key.id,
                    &record.id,
                );
                self.links
                    .create(link)
                    .await
                    .map_err(|e| {
                        self.failed(operation.op, entity_name, Some(record.id.clone()), e)
                    })?;

                Ok(RouteOutcome::Created)
            }
            Some(link) => {
                self.adapter
                    .update_entity(entity_type, &link.external_id, &encoded)
                    .await
                    .map_err(|e| {
                        self.failed(
                            operation.op,
                            entity_name,
                            Some(link.external_id.clone()),
                            e,
                        )
                    })?;

                Ok(RouteOutcome::Updated)
            }
        }
    }

    async fn delete(
        &self,
        entity_type: EntityType,
        entity_name: &str,
        operation: &CrudOperation,
    ) -> RouterResult<RouteOutcome> {
        let existing = self
            .links
            .find_by_entity(self.adapter.tag(), entity_type, operation.primary_key.id)
            .await
            .map_err(|e| self.failed(operation.op, entity_name, None, e))?;

        let Some(link) = existing else {
            info!(
                adapter = %self.adapter.tag(),
                entity = %entity_name,
                internal_id = %operation.primary_key.id,
                "delete with no external link; skipping"
            );
            return Ok(RouteOutcome::SkippedNoLink);
        };

        self.adapter
            .delete_entity(entity_type, &link.external_id)
            .await
            .map_err(|e| {
                self.failed(
                    operation.op,
                    entity_name,
                    Some(link.external_id.clone()),
                    e,
                )
            })?;

        // Retire the link as well so later writes re-create instead of
        // updating a record the vendor no longer has.
        self.links
            .soft_delete(self.adapter.tag(), &link.external_id)
            .await
            .map_err(|e| {
                self.failed(
                    operation.op,
                    entity_name,
                    Some(link.external_id.clone()),
                    e,
                )
            })?;

        Ok(RouteOutcome::Deleted)
    }

    fn failed(
        &self,
        operation: CrudOp,
        entity_name: &str,
        external_id: Option<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> RouterError {
        RouterError::OperationFailed {
            operation,
            entity_name: entity_name.to_string(),
            external_id,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::link::MemoryLinkStore;
    use crate::testutil::MockAdapter;

    fn operation(op: CrudOp, table: &str, id: EntityId, value: serde_json::Value) -> CrudOperation {
        CrudOperation {
            op,
            table_name: table.to_string(),
            primary_key: PrimaryKey { id },
            value,
        }
    }

    fn person_value() -> serde_json::Value {
        json!({
            "firstName": "Foo",
            "lastName": "Bar",
            "customFields": []
        })
    }

    #[test]
    fn test_parse_mutation_name() {
        let (table, op) = parse_mutation_name("people|insert").unwrap();
        assert_eq!(table, "people");
        assert_eq!(op, CrudOp::Insert);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let err = parse_mutation_name("people|unknown").unwrap_err();
        match err {
            RouterError::UnsupportedOperation {
                operation,
                mutation_name,
            } => {
                assert_eq!(operation, "unknown");
                assert_eq!(mutation_name, "people|unknown");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_separator_rejected() {
        let err = parse_mutation_name("peopleinsert").unwrap_err();
        assert!(matches!(err, RouterError::InvalidMutationName { .. }));
    }

    #[tokio::test]
    async fn test_insert_without_link_creates() {
        let adapter = Arc::new(MockAdapter::new());
        let links = Arc::new(MemoryLinkStore::new());
        let router = CrudRouter::new(adapter.clone(), links.clone());
        let id = EntityId::new();

        let outcome = router
            .route_one(&operation(CrudOp::Insert, "people", id, person_value()))
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Created);
        assert_eq!(adapter.created.lock().unwrap().len(), 1);
        assert!(adapter.updated.lock().unwrap().is_empty());

        // Exactly one new link, carrying the vendor-assigned id.
        let link = links
            .find_by_entity("pco", EntityType::Person, id)
            .await
            .unwrap()
            .expect("link persisted");
        assert_eq!(link.external_id, "ext-1");

        // The payload reaching the vendor is encoded back to its shape.
        let (_, attributes) = &adapter.created.lock().unwrap()[0];
        assert_eq!(attributes.get("first_name"), Some(&json!("Foo")));
        assert!(!attributes.contains_key("firstName"));
    }

    #[tokio::test]
    async fn test_update_with_link_updates_in_place() {
        let adapter = Arc::new(MockAdapter::new());
        let links = Arc::new(MemoryLinkStore::new());
        let router = CrudRouter::new(adapter.clone(), links.clone());
        let id = EntityId::new();

        links
            .create(ExternalLink::new("pco", EntityType::Person, id, "ext-9"))
            .await
            .unwrap();

        let outcome = router
            .route_one(&operation(CrudOp::Update, "people", id, person_value()))
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Updated);
        assert!(adapter.created.lock().unwrap().is_empty());
        let updated = adapter.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].1, "ext-9");
    }

    #[tokio::test]
    async fn test_upsert_follows_link_presence() {
        let adapter = Arc::new(MockAdapter::new());
        let links = Arc::new(MemoryLinkStore::new());
        let router = CrudRouter::new(adapter.clone(), links.clone());
        let id = EntityId::new();

        let first = router
            .route_one(&operation(CrudOp::Upsert, "people", id, person_value()))
            .await
            .unwrap();
        assert_eq!(first, RouteOutcome::Created);

        let second = router
            .route_one(&operation(CrudOp::Upsert, "people", id, person_value()))
            .await
            .unwrap();
        assert_eq!(second, RouteOutcome::Updated);

        assert_eq!(adapter.created.lock().unwrap().len(), 1);
        assert_eq!(adapter.updated.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_without_link_is_a_noop() {
        let adapter = Arc::new(MockAdapter::new());
        let links = Arc::new(MemoryLinkStore::new());
        let router = CrudRouter::new(adapter.clone(), links);

        let outcome = router
            .route_one(&operation(
                CrudOp::Delete,
                "people",
                EntityId::new(),
                json!({}),
            ))
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::SkippedNoLink);
        assert!(adapter.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_link_calls_adapter_and_retires_link() {
        let adapter = Arc::new(MockAdapter::new());
        let links = Arc::new(MemoryLinkStore::new());
        let router = CrudRouter::new(adapter.clone(), links.clone());
        let id = EntityId::new();

        links
            .create(ExternalLink::new("pco", EntityType::Person, id, "ext-3"))
            .await
            .unwrap();

        let outcome = router
            .route_one(&operation(CrudOp::Delete, "people", id, json!({})))
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Deleted);
        assert_eq!(
            adapter.deleted.lock().unwrap().as_slice(),
            &[(EntityType::Person, "ext-3".to_string())]
        );
        assert!(links
            .find_by_entity("pco", EntityType::Person, id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unmapped_table_skipped() {
        let adapter = Arc::new(MockAdapter::new());
        let router = CrudRouter::new(adapter.clone(), Arc::new(MemoryLinkStore::new()));

        let outcome = router
            .route_one(&operation(
                CrudOp::Insert,
                "sermon_series",
                EntityId::new(),
                json!({}),
            ))
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::SkippedUnmappedTable);
        assert!(adapter.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let adapter = Arc::new(MockAdapter::new().failing_creates());
        let links = Arc::new(MemoryLinkStore::new());
        let router = CrudRouter::new(adapter.clone(), links.clone());
        let id = EntityId::new();

        // The update has a link and succeeds even though the insert fails.
        links
            .create(ExternalLink::new("pco", EntityType::Person, id, "ext-7"))
            .await
            .unwrap();

        let summary = router
            .route_batch(vec![
                operation(CrudOp::Insert, "people", EntityId::new(), person_value()),
                operation(CrudOp::Update, "people", id, person_value()),
            ])
            .await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.updated, 1);
    }
}
