//! Per-entity field mapping tables.
//!
//! Each adapter declares, for every entity it syncs, an explicit table from
//! external field names to canonical targets. The table is built alongside
//! the adapter's entity definitions; nothing here inspects types at
//! runtime.

use std::collections::HashMap;

use serde_json::Value;

use steeple_core::{normalize_gender, ValueKind};

/// Normalization applied to a mapped value on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// Collapse vendor gender spellings onto `male`/`female`/null.
    Gender,
}

impl Normalizer {
    /// Apply the normalization to a raw value.
    #[must_use]
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Normalizer::Gender => normalize_gender(value),
        }
    }
}

/// How one external field maps into the canonical shape.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Target canonical field name. None for custom and skipped fields.
    pub canonical: Option<String>,
    /// Preserve this field as a custom field instead of renaming it.
    pub custom: bool,
    /// Drop this field entirely.
    pub skip: bool,
    /// Primitive type tag, used for custom-field wrapping.
    pub value_type: ValueKind,
    /// Optional value normalization applied on decode.
    pub normalizer: Option<Normalizer>,
}

impl FieldSpec {
    /// A field renamed onto a canonical target.
    pub fn maps_to(canonical: impl Into<String>) -> Self {
        Self {
            canonical: Some(canonical.into()),
            custom: false,
            skip: false,
            value_type: ValueKind::String,
            normalizer: None,
        }
    }

    /// A field preserved as a typed custom field.
    #[must_use]
    pub fn custom(value_type: ValueKind) -> Self {
        Self {
            canonical: None,
            custom: true,
            skip: false,
            value_type,
            normalizer: None,
        }
    }

    /// A field dropped on decode and encode.
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            canonical: None,
            custom: false,
            skip: true,
            value_type: ValueKind::String,
            normalizer: None,
        }
    }

    /// Attach a decode-time normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Override the declared value type.
    #[must_use]
    pub fn with_type(mut self, value_type: ValueKind) -> Self {
        self.value_type = value_type;
        self
    }
}

/// The full external-to-canonical mapping table for one entity.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    specs: HashMap<String, FieldSpec>,
}

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field mapping using builder style.
    #[must_use]
    pub fn field(mut self, external: impl Into<String>, spec: FieldSpec) -> Self {
        self.specs.insert(external.into(), spec);
        self
    }

    /// Look up the spec for an external field name.
    #[must_use]
    pub fn get(&self, external: &str) -> Option<&FieldSpec> {
        self.specs.get(external)
    }

    /// Iterate over all declared mappings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.specs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build the canonical-to-external reverse index for encoding.
    ///
    /// Custom and skipped fields have no reverse entry; they are handled
    /// through the custom-field partition instead.
    #[must_use]
    pub fn reverse(&self) -> HashMap<&str, &str> {
        self.specs
            .iter()
            .filter(|(_, spec)| !spec.custom && !spec.skip)
            .filter_map(|(ext, spec)| spec.canonical.as_deref().map(|c| (c, ext.as_str())))
            .collect()
    }
}

impl FromIterator<(String, FieldSpec)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (String, FieldSpec)>>(iter: T) -> Self {
        Self {
            specs: iter.into_iter().collect(),
        }
    }
}
