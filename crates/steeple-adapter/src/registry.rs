//! Adapter registry.
//!
//! Process-wide, read-only map from vendor tag to adapter instance.
//! Built once at startup; duplicate tags are rejected eagerly, and lookups
//! for unregistered tags fail fast naming every registered tag.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AdapterError, AdapterResult};
use crate::traits::FullAdapter;

/// A shared, dynamically dispatched adapter.
pub type BoxedAdapter = Arc<dyn FullAdapter>;

/// Builder for an [`AdapterRegistry`].
#[derive(Default, Debug)]
pub struct AdapterRegistryBuilder {
    adapters: HashMap<String, BoxedAdapter>,
}

impl AdapterRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own tag, rejecting duplicates.
    pub fn register(mut self, adapter: BoxedAdapter) -> AdapterResult<Self> {
        let tag = adapter.tag().to_string();
        if self.adapters.insert(tag.clone(), adapter).is_some() {
            return Err(AdapterError::DuplicateAdapterTag { tag });
        }
        Ok(self)
    }

    /// Finish building. The result is read-only.
    #[must_use]
    pub fn build(self) -> AdapterRegistry {
        AdapterRegistry {
            adapters: self.adapters,
        }
    }
}

/// Read-only registry of adapters keyed by vendor tag.
pub struct AdapterRegistry {
    adapters: HashMap<String, BoxedAdapter>,
}

impl AdapterRegistry {
    /// Look up an adapter by tag, failing fast on unknown tags.
    pub fn get(&self, tag: &str) -> AdapterResult<BoxedAdapter> {
        self.adapters.get(tag).cloned().ok_or_else(|| {
            let mut registered: Vec<String> = self.adapters.keys().cloned().collect();
            registered.sort();
            AdapterError::UnsupportedAdapter {
                tag: tag.to_string(),
                registered,
            }
        })
    }

    /// All registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
