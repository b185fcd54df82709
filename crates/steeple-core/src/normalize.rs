//! Domain value normalization.
//!
//! Vendors disagree on enumerated values. Normalizers collapse the shapes
//! seen in the wild onto the canonical vocabulary; anything unrecognized
//! becomes null rather than leaking a vendor spelling into the graph.

use serde_json::Value;

/// Normalize a vendor gender value to `"male"`, `"female"`, or null.
#[must_use]
pub fn normalize_gender(value: &Value) -> Value {
    match value.as_str() {
        Some("M" | "Male" | "male") => Value::String("male".to_string()),
        Some("F" | "Female" | "female") => Value::String("female".to_string()),
        _ => Value::Null,
    }
}
