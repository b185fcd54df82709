//! # Adapter Framework
//!
//! Core abstractions for connecting steeple to external Church Management
//! System APIs.
//!
//! The framework uses a capability-based trait system: each vendor
//! implements the base [`Adapter`](traits::Adapter) trait plus whichever
//! capability traits its API supports, and the synchronization engine is
//! written purely against those traits.
//!
//! ## Crate Organization
//!
//! - [`traits`] - Adapter capability traits
//! - [`manifest`] - Per-entity registry of endpoints and transformers
//! - [`fieldmap`] - Declarative external-to-canonical field tables
//! - [`transform`] - The bidirectional transformer
//! - [`registry`] - Process-wide adapter lookup by vendor tag
//! - [`types`] - Raw records, pages, tokens, webhook wire types
//! - [`error`] - Error types with transient/permanent classification

pub mod error;
pub mod fieldmap;
pub mod manifest;
pub mod registry;
pub mod traits;
pub mod transform;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{AdapterError, AdapterResult};
    pub use crate::fieldmap::{FieldMap, FieldSpec, Normalizer};
    pub use crate::manifest::{
        Endpoint, EndpointKind, HttpMethod, Manifest, ManifestBuilder, ManifestEntry,
    };
    pub use crate::registry::{AdapterRegistry, AdapterRegistryBuilder, BoxedAdapter};
    pub use crate::traits::{
        Adapter, CrudCapable, EntityCreate, EntityDelete, EntityFetch, EntityList, EntityUpdate,
        FetchToken, FullAdapter, SyncCapable, WebhookCapable,
    };
    pub use crate::transform::{EntityTransformer, CUSTOM_FIELDS_KEY};
    pub use crate::types::{
        AccessToken, ExternalSubscription, RawRecord, RecordPage, WebhookEvent,
    };
}

// Re-export async_trait for adapter implementors
pub use async_trait::async_trait;
