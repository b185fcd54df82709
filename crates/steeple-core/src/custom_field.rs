//! Vendor-specific overflow attributes.
//!
//! External records often carry fields with no canonical counterpart.
//! Those are preserved losslessly as custom fields so a later write back to
//! the same vendor can reproduce them exactly.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Primitive type tag for a custom field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
}

impl ValueKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The declared type tag did not match the incoming value.
#[derive(Debug, Error)]
#[error("custom field '{name}' expected a {expected} value, got {found}")]
pub struct CustomFieldTypeError {
    pub name: String,
    pub expected: ValueKind,
    pub found: &'static str,
}

/// An external attribute with no canonical counterpart.
///
/// The `name` is the external field name prefixed with the source adapter
/// tag (`pco_middle_name`), which keeps names unique when one entity
/// carries custom fields from several adapters. A `null` vendor value stays
/// a typed field with `value: None` rather than being dropped or coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag", rename_all = "lowercase")]
pub enum CustomField {
    String {
        name: String,
        source: String,
        value: Option<String>,
    },
    Number {
        name: String,
        source: String,
        value: Option<Number>,
    },
    Boolean {
        name: String,
        source: String,
        value: Option<bool>,
    },
}

impl CustomField {
    /// Build the adapter-prefixed name for an external field.
    #[must_use]
    pub fn prefixed_name(source: &str, external_name: &str) -> String {
        format!("{source}_{external_name}")
    }

    /// Wrap a raw vendor value as a custom field.
    ///
    /// `external_name` is the unprefixed vendor field name. Returns an error
    /// when a non-null value disagrees with the declared kind.
    pub fn from_external(
        kind: ValueKind,
        source: &str,
        external_name: &str,
        value: &Value,
    ) -> Result<Self, CustomFieldTypeError> {
        let name = Self::prefixed_name(source, external_name);
        let source = source.to_string();

        match kind {
            ValueKind::String => {
                let value = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => {
                        return Err(CustomFieldTypeError {
                            name,
                            expected: kind,
                            found: json_type_name(other),
                        })
                    }
                };
                Ok(CustomField::String {
                    name,
                    source,
                    value,
                })
            }
            ValueKind::Number => {
                let value = match value {
                    Value::Null => None,
                    Value::Number(n) => Some(n.clone()),
                    other => {
                        return Err(CustomFieldTypeError {
                            name,
                            expected: kind,
                            found: json_type_name(other),
                        })
                    }
                };
                Ok(CustomField::Number {
                    name,
                    source,
                    value,
                })
            }
            ValueKind::Boolean => {
                let value = match value {
                    Value::Null => None,
                    Value::Bool(b) => Some(*b),
                    other => {
                        return Err(CustomFieldTypeError {
                            name,
                            expected: kind,
                            found: json_type_name(other),
                        })
                    }
                };
                Ok(CustomField::Boolean {
                    name,
                    source,
                    value,
                })
            }
        }
    }

    /// The adapter-prefixed field name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            CustomField::String { name, .. }
            | CustomField::Number { name, .. }
            | CustomField::Boolean { name, .. } => name,
        }
    }

    /// The adapter tag this field came from.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            CustomField::String { source, .. }
            | CustomField::Number { source, .. }
            | CustomField::Boolean { source, .. } => source,
        }
    }

    /// The type tag of this field.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            CustomField::String { .. } => ValueKind::String,
            CustomField::Number { .. } => ValueKind::Number,
            CustomField::Boolean { .. } => ValueKind::Boolean,
        }
    }

    /// The unprefixed vendor field name, if the name carries this field's
    /// source prefix.
    #[must_use]
    pub fn external_name(&self) -> Option<&str> {
        let prefix = format!("{}_", self.source());
        self.name().strip_prefix(&prefix)
    }

    /// The value as JSON, with `None` mapping back to `null`.
    #[must_use]
    pub fn value_json(&self) -> Value {
        match self {
            CustomField::String { value, .. } => value
                .as_ref()
                .map_or(Value::Null, |s| Value::String(s.clone())),
            CustomField::Number { value, .. } => value
                .as_ref()
                .map_or(Value::Null, |n| Value::Number(n.clone())),
            CustomField::Boolean { value, .. } => value.map_or(Value::Null, Value::Bool),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
