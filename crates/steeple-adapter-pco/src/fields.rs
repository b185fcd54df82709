//! PCO field tables and manifest.
//!
//! One mapping table per synced entity, declared next to the manifest
//! entry that owns it. Attributes the canonical model has no slot for are
//! preserved as custom fields; bookkeeping attributes the engine reads
//! elsewhere (`created_at`, `updated_at`) are skipped so they never leak
//! into the canonical bag.

use steeple_adapter::fieldmap::{FieldMap, FieldSpec, Normalizer};
use steeple_adapter::manifest::{
    Endpoint, EndpointKind, HttpMethod, Manifest, ManifestBuilder, ManifestEntry,
};
use steeple_adapter::transform::EntityTransformer;
use steeple_core::{EntityType, ValueKind};

/// The adapter tag, used as the custom-field source and link adapter
/// column.
pub const ADAPTER_TAG: &str = "pco";

/// Webhook actions subscribed to for every synced entity.
const WEBHOOK_ACTIONS: [&str; 3] = ["created", "updated", "destroyed"];

fn person_fields() -> FieldMap {
    FieldMap::new()
        .field("first_name", FieldSpec::maps_to("firstName"))
        .field("last_name", FieldSpec::maps_to("lastName"))
        .field(
            "gender",
            FieldSpec::maps_to("gender").with_normalizer(Normalizer::Gender),
        )
        .field("birthdate", FieldSpec::maps_to("birthdate"))
        .field("avatar", FieldSpec::maps_to("avatar"))
        .field("status", FieldSpec::maps_to("status"))
        .field("middle_name", FieldSpec::custom(ValueKind::String))
        .field("nickname", FieldSpec::custom(ValueKind::String))
        .field("grade", FieldSpec::custom(ValueKind::Number))
        .field("child", FieldSpec::custom(ValueKind::Boolean))
        .field("created_at", FieldSpec::skipped())
        .field("updated_at", FieldSpec::skipped())
}

fn address_fields() -> FieldMap {
    FieldMap::new()
        .field("street", FieldSpec::maps_to("streetLine1"))
        .field("street_line_2", FieldSpec::maps_to("streetLine2"))
        .field("city", FieldSpec::maps_to("city"))
        .field("state", FieldSpec::maps_to("state"))
        .field("zip", FieldSpec::maps_to("zip"))
        .field("location", FieldSpec::maps_to("location"))
        .field("primary", FieldSpec::custom(ValueKind::Boolean))
        .field("created_at", FieldSpec::skipped())
        .field("updated_at", FieldSpec::skipped())
}

fn campus_fields() -> FieldMap {
    FieldMap::new()
        .field("name", FieldSpec::maps_to("name"))
        .field("description", FieldSpec::maps_to("description"))
        .field("time_zone", FieldSpec::custom(ValueKind::String))
        .field("created_at", FieldSpec::skipped())
        .field("updated_at", FieldSpec::skipped())
}

fn phone_number_fields() -> FieldMap {
    FieldMap::new()
        .field("number", FieldSpec::maps_to("number"))
        .field("location", FieldSpec::maps_to("location"))
        .field("primary", FieldSpec::maps_to("primary").with_type(ValueKind::Boolean))
        .field("carrier", FieldSpec::custom(ValueKind::String))
        .field("created_at", FieldSpec::skipped())
        .field("updated_at", FieldSpec::skipped())
}

fn group_fields() -> FieldMap {
    FieldMap::new()
        .field("name", FieldSpec::maps_to("name"))
        .field("description", FieldSpec::maps_to("description"))
        .field("memberships_count", FieldSpec::custom(ValueKind::Number))
        .field("created_at", FieldSpec::skipped())
        .field("updated_at", FieldSpec::skipped())
}

fn crud_endpoints(entry: ManifestEntry, collection: &str) -> ManifestEntry {
    entry
        .endpoint(EndpointKind::List, Endpoint::new(HttpMethod::Get, collection))
        .endpoint(EndpointKind::Get, Endpoint::new(HttpMethod::Get, collection))
        .endpoint(
            EndpointKind::Create,
            Endpoint::new(HttpMethod::Post, collection),
        )
        .endpoint(
            EndpointKind::Update,
            Endpoint::new(HttpMethod::Patch, collection),
        )
        .endpoint(
            EndpointKind::Delete,
            Endpoint::new(HttpMethod::Delete, collection),
        )
        .error_schema(
            404,
            serde_json::json!({"errors": [{"status": "404", "title": "Not Found"}]}),
        )
        .error_schema(
            429,
            serde_json::json!({"errors": [{"status": "429", "title": "Rate Limit Exceeded"}]}),
        )
}

fn transformer(entity_type: EntityType, fields: FieldMap) -> EntityTransformer {
    EntityTransformer::new(ADAPTER_TAG, entity_type, fields)
}

/// Build the PCO manifest.
///
/// Panics on duplicate entries, which would be a bug in this table; it is
/// built once at adapter construction.
#[must_use]
pub fn manifest() -> Manifest {
    ManifestBuilder::new()
        .entry(crud_endpoints(
            ManifestEntry::new(
                EntityType::Person,
                "people",
                transformer(EntityType::Person, person_fields()),
            ),
            "/people/v2/people",
        ))
        .expect("unique manifest entities")
        .entry(crud_endpoints(
            ManifestEntry::new(
                EntityType::Address,
                "people",
                transformer(EntityType::Address, address_fields()),
            ),
            "/people/v2/addresses",
        ))
        .expect("unique manifest entities")
        .entry(crud_endpoints(
            ManifestEntry::new(
                EntityType::Campus,
                "people",
                transformer(EntityType::Campus, campus_fields()),
            ),
            "/people/v2/campuses",
        ))
        .expect("unique manifest entities")
        .entry(crud_endpoints(
            ManifestEntry::new(
                EntityType::PhoneNumber,
                "people",
                transformer(EntityType::PhoneNumber, phone_number_fields()),
            ),
            "/people/v2/phone_numbers",
        ))
        .expect("unique manifest entities")
        .entry(crud_endpoints(
            ManifestEntry::new(
                EntityType::Group,
                "groups",
                transformer(EntityType::Group, group_fields()),
            ),
            "/groups/v2/groups",
        ))
        .expect("unique manifest entities")
        .build()
}

/// Snake-case event segment for an entity type.
fn event_segment(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Person => "person",
        EntityType::Address => "address",
        EntityType::Campus => "campus",
        EntityType::PhoneNumber => "phone_number",
        EntityType::Group => "group",
    }
}

/// Every webhook event type the manifest wants subscriptions for.
#[must_use]
pub fn webhook_event_types(manifest: &Manifest) -> Vec<String> {
    let mut event_types: Vec<String> = manifest
        .syncable()
        .flat_map(|entry| {
            let module = entry.module.clone();
            let segment = event_segment(entry.entity_type);
            WEBHOOK_ACTIONS
                .iter()
                .map(move |action| format!("{module}.v2.events.{segment}.{action}"))
        })
        .collect();
    event_types.sort();
    event_types
}
