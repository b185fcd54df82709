//! Entity manifest.
//!
//! A static per-entity registry of endpoints, transformer, and sync
//! eligibility. Built once at process start through [`ManifestBuilder`],
//! which rejects duplicate entity keys eagerly; the built [`Manifest`]
//! exposes no mutation.

use std::collections::HashMap;

use serde_json::Value;

use steeple_core::EntityType;

use crate::error::{AdapterError, AdapterResult};
use crate::transform::EntityTransformer;

/// HTTP method for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operations a manifest entry can expose endpoints for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    List,
    Get,
    Create,
    Update,
    Delete,
}

/// One vendor endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// Everything the engine knows about one entity of one adapter.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub entity_type: EntityType,
    /// The vendor module the entity lives under, e.g. `people`.
    pub module: String,
    pub endpoints: HashMap<EndpointKind, Endpoint>,
    pub transformer: EntityTransformer,
    /// Entities flagged here are excluded from collection sync.
    pub skip_sync: bool,
    /// Vendor error schemas keyed by HTTP status code.
    pub errors: HashMap<u16, Value>,
}

impl ManifestEntry {
    /// Create an entry with no endpoints and sync enabled.
    pub fn new(
        entity_type: EntityType,
        module: impl Into<String>,
        transformer: EntityTransformer,
    ) -> Self {
        Self {
            entity_type,
            module: module.into(),
            endpoints: HashMap::new(),
            transformer,
            skip_sync: false,
            errors: HashMap::new(),
        }
    }

    /// Add an endpoint using builder style.
    #[must_use]
    pub fn endpoint(mut self, kind: EndpointKind, endpoint: Endpoint) -> Self {
        self.endpoints.insert(kind, endpoint);
        self
    }

    /// Exclude this entity from collection sync.
    #[must_use]
    pub fn skip_sync(mut self) -> Self {
        self.skip_sync = true;
        self
    }

    /// Declare a vendor error schema for an HTTP status code.
    #[must_use]
    pub fn error_schema(mut self, status: u16, schema: Value) -> Self {
        self.errors.insert(status, schema);
        self
    }
}

/// Builder for a [`Manifest`].
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    entries: HashMap<EntityType, ManifestEntry>,
}

impl ManifestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, rejecting a duplicate entity key.
    pub fn entry(mut self, entry: ManifestEntry) -> AdapterResult<Self> {
        let entity_type = entry.entity_type;
        if self.entries.insert(entity_type, entry).is_some() {
            return Err(AdapterError::DuplicateManifestEntry { entity_type });
        }
        Ok(self)
    }

    /// Finish building. The result is read-only.
    #[must_use]
    pub fn build(self) -> Manifest {
        Manifest {
            entries: self.entries,
        }
    }
}

/// Immutable per-entity registry for one adapter.
#[derive(Debug, Clone)]
pub struct Manifest {
    entries: HashMap<EntityType, ManifestEntry>,
}

impl Manifest {
    /// Look up the entry for an entity type.
    #[must_use]
    pub fn entry(&self, entity_type: EntityType) -> Option<&ManifestEntry> {
        self.entries.get(&entity_type)
    }

    /// Look up an entry, failing when it is absent.
    pub fn require(&self, entity_type: EntityType) -> AdapterResult<&ManifestEntry> {
        self.entries
            .get(&entity_type)
            .ok_or(AdapterError::ManifestEntryMissing { entity_type })
    }

    /// All registered entity types.
    pub fn entity_types(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.entries.keys().copied()
    }

    /// Entries eligible for collection sync.
    pub fn syncable(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values().filter(|e| !e.skip_sync)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
