//! Sync engine error types.

use thiserror::Error;

use steeple_adapter::error::AdapterError;
use steeple_core::{EntityId, EntityType};

use crate::router::CrudOp;

/// Error that can occur in the link store and sync orchestrator.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Creating or updating an external link failed.
    #[error("external link upsert failed for {adapter}/{entity_type}: {message}")]
    ExternalLinkUpsert {
        adapter: String,
        entity_type: EntityType,
        message: String,
    },

    /// Reading external links failed.
    #[error("external link retrieval failed for {adapter}: {message}")]
    ExternalLinkRetrieval { adapter: String, message: String },

    /// The persistence layer rejected an entity batch.
    #[error("entity processing failed: {message}")]
    EntityProcessing { message: String },

    /// The persistence layer rejected a relationship batch.
    #[error("relationship processing failed: {message}")]
    RelationshipProcessing { message: String },

    /// The stale-link query behind deletion detection failed.
    #[error("deletion detection failed for {adapter}/{entity_type}: {message}")]
    Detection {
        adapter: String,
        entity_type: EntityType,
        message: String,
    },

    /// Marking a canonical entity deleted failed.
    #[error("entity deletion failed for {entity_type} {internal_id}: {message}")]
    EntityDeletion {
        entity_type: EntityType,
        internal_id: EntityId,
        message: String,
    },

    /// Merging two canonical entities failed.
    #[error("entity merging failed: {message}")]
    EntityMerging { message: String },

    /// An adapter call failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Storage-level failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Error that can occur while routing CRUD mutations.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The mutation name does not carry the `entity|operation` separator.
    #[error("invalid mutation name '{mutation_name}': missing '|' separator")]
    InvalidMutationName { mutation_name: String },

    /// The mutation names an operation the router does not support.
    #[error("unsupported operation '{operation}' in mutation '{mutation_name}'")]
    UnsupportedOperation {
        operation: String,
        mutation_name: String,
    },

    /// An external call or link write inside one operation failed.
    #[error("{operation} of {entity_name} failed")]
    OperationFailed {
        operation: CrudOp,
        entity_name: String,
        external_id: Option<String>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Link store failure outside a single operation.
    #[error(transparent)]
    Link(#[from] SyncError),
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
