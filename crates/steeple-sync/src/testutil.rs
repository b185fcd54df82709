//! Shared fixtures for the router and orchestrator test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use steeple_adapter::error::{AdapterError, AdapterResult};
use steeple_adapter::fieldmap::{FieldMap, FieldSpec, Normalizer};
use steeple_adapter::manifest::{Manifest, ManifestBuilder, ManifestEntry};
use steeple_adapter::traits::{
    Adapter, EntityCreate, EntityDelete, EntityFetch, EntityList, EntityUpdate, FetchToken,
    WebhookCapable,
};
use steeple_adapter::transform::EntityTransformer;
use steeple_adapter::types::{
    AccessToken, ExternalSubscription, RawRecord, RecordPage, WebhookEvent,
};
use steeple_core::{EntityId, EntityType, ValueKind};

use crate::sink::{EntitySink, EntityUpsert, RelationshipUpsert, SinkError};

fn person_fields() -> FieldMap {
    FieldMap::new()
        .field("first_name", FieldSpec::maps_to("firstName"))
        .field("last_name", FieldSpec::maps_to("lastName"))
        .field("middle_name", FieldSpec::custom(ValueKind::String))
        .field(
            "gender",
            FieldSpec::maps_to("gender").with_normalizer(Normalizer::Gender),
        )
}

fn campus_fields() -> FieldMap {
    FieldMap::new()
        .field("name", FieldSpec::maps_to("name"))
        .field("description", FieldSpec::maps_to("description"))
}

fn test_manifest() -> Manifest {
    ManifestBuilder::new()
        .entry(ManifestEntry::new(
            EntityType::Person,
            "people",
            EntityTransformer::new("pco", EntityType::Person, person_fields()),
        ))
        .unwrap()
        .entry(ManifestEntry::new(
            EntityType::Campus,
            "people",
            EntityTransformer::new("pco", EntityType::Campus, campus_fields()),
        ))
        .unwrap()
        .entry(
            ManifestEntry::new(
                EntityType::Group,
                "groups",
                EntityTransformer::new("pco", EntityType::Group, FieldMap::new()),
            )
            .skip_sync(),
        )
        .unwrap()
        .build()
}

/// Scriptable in-memory adapter.
pub struct MockAdapter {
    manifest: Manifest,
    pub records: Mutex<HashMap<EntityType, Vec<RawRecord>>>,
    pub page_size: usize,
    pub created: Mutex<Vec<(EntityType, Map<String, Value>)>>,
    pub updated: Mutex<Vec<(EntityType, String, Map<String, Value>)>>,
    pub deleted: Mutex<Vec<(EntityType, String)>>,
    next_id: AtomicU64,
    fail_create: bool,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            manifest: test_manifest(),
            records: Mutex::new(HashMap::new()),
            page_size: 2,
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_create: false,
        }
    }

    /// Make every create call fail with a fetch error.
    pub fn failing_creates(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Seed the vendor-side collection for one entity type.
    pub fn seed(&self, entity_type: EntityType, records: Vec<RawRecord>) {
        self.records.lock().unwrap().insert(entity_type, records);
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    fn tag(&self) -> &'static str {
        "pco"
    }

    fn display_name(&self) -> &str {
        "mock pco"
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

#[async_trait]
impl FetchToken for MockAdapter {
    async fn fetch_token(&self) -> AdapterResult<AccessToken> {
        Ok(AccessToken::new("test-token"))
    }
}

#[async_trait]
impl EntityFetch for MockAdapter {
    async fn fetch_entity_by_id(
        &self,
        entity_type: EntityType,
        external_id: &str,
    ) -> AdapterResult<RawRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&entity_type)
            .and_then(|records| records.iter().find(|r| r.id == external_id))
            .cloned()
            .ok_or_else(|| AdapterError::EntityNotFound {
                entity_type,
                external_id: external_id.to_string(),
            })
    }
}

#[async_trait]
impl EntityList for MockAdapter {
    async fn list_entity_page(
        &self,
        entity_type: EntityType,
        cursor: Option<&str>,
    ) -> AdapterResult<RecordPage> {
        let records = self.records.lock().unwrap();
        let all = records.get(&entity_type).cloned().unwrap_or_default();
        let offset: usize = cursor.map_or(0, |c| c.parse().unwrap_or(0));
        let page: Vec<RawRecord> = all.iter().skip(offset).take(self.page_size).cloned().collect();
        let next = offset + page.len();
        let next_cursor = (next < all.len()).then(|| next.to_string());

        Ok(RecordPage {
            records: page,
            next_cursor,
            total: Some(all.len() as u64),
        })
    }
}

#[async_trait]
impl EntityCreate for MockAdapter {
    async fn create_entity(
        &self,
        entity_type: EntityType,
        attributes: &Map<String, Value>,
    ) -> AdapterResult<RawRecord> {
        if self.fail_create {
            return Err(AdapterError::fetch("create rejected by vendor"));
        }
        let id = format!("ext-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.created
            .lock()
            .unwrap()
            .push((entity_type, attributes.clone()));
        Ok(RawRecord::new(entity_type, id, attributes.clone()))
    }
}

#[async_trait]
impl EntityUpdate for MockAdapter {
    async fn update_entity(
        &self,
        entity_type: EntityType,
        external_id: &str,
        attributes: &Map<String, Value>,
    ) -> AdapterResult<RawRecord> {
        self.updated.lock().unwrap().push((
            entity_type,
            external_id.to_string(),
            attributes.clone(),
        ));
        Ok(RawRecord::new(entity_type, external_id, attributes.clone()))
    }
}

#[async_trait]
impl EntityDelete for MockAdapter {
    async fn delete_entity(
        &self,
        entity_type: EntityType,
        external_id: &str,
    ) -> AdapterResult<()> {
        self.deleted
            .lock()
            .unwrap()
            .push((entity_type, external_id.to_string()));
        Ok(())
    }
}

#[async_trait]
impl WebhookCapable for MockAdapter {
    fn webhook_event_types(&self) -> Vec<String> {
        vec!["people.v2.events.person.updated".to_string()]
    }

    async fn list_webhook_subscriptions(&self) -> AdapterResult<Vec<ExternalSubscription>> {
        Ok(vec![])
    }

    async fn create_webhook_subscription(
        &self,
        url: &str,
        event_type: &str,
    ) -> AdapterResult<ExternalSubscription> {
        Ok(ExternalSubscription {
            id: "sub-1".to_string(),
            name: event_type.to_string(),
            url: url.to_string(),
            active: true,
            secret: Some("whsec".to_string()),
        })
    }

    async fn activate_webhook_subscription(
        &self,
        subscription_id: &str,
    ) -> AdapterResult<ExternalSubscription> {
        Ok(ExternalSubscription {
            id: subscription_id.to_string(),
            name: String::new(),
            url: String::new(),
            active: true,
            secret: None,
        })
    }

    fn parse_webhook_payload(&self, _body: &[u8]) -> AdapterResult<Vec<WebhookEvent>> {
        Ok(vec![])
    }
}

/// Sink that records everything it is handed.
#[derive(Default)]
pub struct RecordingSink {
    pub entities: Mutex<Vec<EntityUpsert>>,
    pub relationships: Mutex<Vec<RelationshipUpsert>>,
    pub deleted: Mutex<Vec<(EntityType, EntityId)>>,
    pub fail_entities: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_entities: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl EntitySink for RecordingSink {
    async fn process_entities(&self, batch: Vec<EntityUpsert>) -> Result<(), SinkError> {
        if self.fail_entities {
            return Err(SinkError::new("entity store unavailable"));
        }
        self.entities.lock().unwrap().extend(batch);
        Ok(())
    }

    async fn process_relationships(
        &self,
        batch: Vec<RelationshipUpsert>,
    ) -> Result<(), SinkError> {
        self.relationships.lock().unwrap().extend(batch);
        Ok(())
    }

    async fn mark_deleted(
        &self,
        entity_type: EntityType,
        internal_id: EntityId,
    ) -> Result<(), SinkError> {
        self.deleted.lock().unwrap().push((entity_type, internal_id));
        Ok(())
    }
}
