//! Bidirectional transformation between external and canonical shapes.
//!
//! Decoding maps a raw vendor attribute bag onto the canonical field
//! names, preserving unmapped-but-declared fields as typed custom fields.
//! Encoding reverses the rename and folds this adapter's custom fields back
//! onto the bag.
//!
//! Decode then encode reproduces the original bag only for custom fields
//! whose source is the adapter being encoded to; custom fields that came
//! from a different adapter are dropped on encode rather than leaked into
//! the wrong vendor's API.

use serde_json::{Map, Value};

use steeple_core::{CustomField, EntityType, DEFAULT_STATUS, DEFAULT_TYPE};

use crate::error::{AdapterError, AdapterResult};
use crate::fieldmap::FieldMap;

/// Canonical attribute holding the custom-field overflow list.
pub const CUSTOM_FIELDS_KEY: &str = "customFields";

/// Bidirectional transformer for one entity of one adapter.
#[derive(Debug, Clone)]
pub struct EntityTransformer {
    source: String,
    entity_type: EntityType,
    fields: FieldMap,
}

impl EntityTransformer {
    /// Create a transformer for `entity_type` owned by the adapter `source`.
    pub fn new(source: impl Into<String>, entity_type: EntityType, fields: FieldMap) -> Self {
        Self {
            source: source.into(),
            entity_type,
            fields,
        }
    }

    /// The adapter tag that owns this transformer.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The entity type this transformer covers.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// The mapping table behind this transformer.
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Decode a raw external attribute bag into canonical shape.
    ///
    /// Declared fields are copy-renamed or wrapped as custom fields;
    /// undeclared and skipped fields are dropped. Canonical defaults absent
    /// from the source are backfilled afterwards.
    pub fn decode(&self, external: &Map<String, Value>) -> AdapterResult<Map<String, Value>> {
        let mut canonical = Map::new();
        let mut customs: Vec<CustomField> = Vec::new();

        for (name, value) in external {
            let Some(spec) = self.fields.get(name) else {
                continue;
            };
            if spec.skip {
                continue;
            }
            if spec.custom {
                let field =
                    CustomField::from_external(spec.value_type, &self.source, name, value)
                        .map_err(|e| AdapterError::transform(self.entity_type, e.to_string()))?;
                customs.push(field);
                continue;
            }
            if let Some(target) = &spec.canonical {
                let mapped = match spec.normalizer {
                    Some(normalizer) => normalizer.apply(value),
                    None => value.clone(),
                };
                canonical.insert(target.clone(), mapped);
            }
        }

        canonical.insert(
            CUSTOM_FIELDS_KEY.to_string(),
            serde_json::to_value(customs)
                .map_err(|e| AdapterError::transform(self.entity_type, e.to_string()))?,
        );
        if !canonical.contains_key("type") {
            canonical.insert("type".to_string(), Value::String(DEFAULT_TYPE.to_string()));
        }
        if !canonical.contains_key("status") {
            canonical.insert(
                "status".to_string(),
                Value::String(DEFAULT_STATUS.to_string()),
            );
        }

        Ok(canonical)
    }

    /// Encode a canonical attribute bag back into this adapter's shape.
    ///
    /// Standard fields are reverse-renamed; custom fields sourced from this
    /// adapter are de-prefixed onto the bag with nulls preserved, and
    /// custom fields from other adapters are dropped.
    pub fn encode(&self, canonical: &Map<String, Value>) -> AdapterResult<Map<String, Value>> {
        let reverse = self.fields.reverse();
        let mut external = Map::new();

        for (name, value) in canonical {
            if name == CUSTOM_FIELDS_KEY {
                let fields: Vec<CustomField> = serde_json::from_value(value.clone())
                    .map_err(|e| {
                        AdapterError::transform(
                            self.entity_type,
                            format!("malformed {CUSTOM_FIELDS_KEY}: {e}"),
                        )
                    })?;
                for field in fields.iter().filter(|f| f.source() == self.source) {
                    let Some(external_name) = field.external_name() else {
                        return Err(AdapterError::transform(
                            self.entity_type,
                            format!(
                                "custom field '{}' does not carry the '{}' prefix",
                                field.name(),
                                self.source
                            ),
                        ));
                    };
                    external.insert(external_name.to_string(), field.value_json());
                }
                continue;
            }

            if let Some(ext) = reverse.get(name.as_str()) {
                external.insert((*ext).to_string(), value.clone());
            }
        }

        Ok(external)
    }
}
