//! Persistence collaborator interface.
//!
//! The surrounding application supplies an [`EntitySink`] that writes
//! canonical entities, relationships, and deletions to its own store. The
//! orchestrator treats the sink as a pure side-effecting collaborator:
//! sink errors propagate uncaught and fail the enclosing job.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use steeple_core::{EntityId, EntityType};

/// Failure reported by the persistence layer.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// One canonical entity write.
#[derive(Debug, Clone)]
pub struct EntityUpsert {
    pub entity_type: EntityType,
    pub internal_id: EntityId,
    pub external_id: String,
    /// Canonical-shaped attribute bag produced by the transformer.
    pub attributes: Map<String, Value>,
}

/// One relationship write parsed from a vendor relationship block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipUpsert {
    pub source_entity_type: EntityType,
    pub source_internal_id: EntityId,
    pub source_external_id: String,
    /// The relationship name as the vendor declares it.
    pub name: String,
    /// The vendor's type name for the target record.
    pub target_type: String,
    pub target_external_id: String,
}

/// Canonical persistence callbacks supplied by the surrounding application.
#[async_trait]
pub trait EntitySink: Send + Sync {
    /// Upsert a batch of canonical entities.
    async fn process_entities(&self, batch: Vec<EntityUpsert>) -> Result<(), SinkError>;

    /// Upsert a batch of relationships.
    async fn process_relationships(&self, batch: Vec<RelationshipUpsert>) -> Result<(), SinkError>;

    /// Mark one canonical entity deleted.
    async fn mark_deleted(&self, entity_type: EntityType, internal_id: EntityId)
        -> Result<(), SinkError>;
}
