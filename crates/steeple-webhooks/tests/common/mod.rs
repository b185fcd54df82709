//! Shared fixtures for the reconciler and processor test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use steeple_adapter::error::{AdapterError, AdapterResult};
use steeple_adapter::fieldmap::{FieldMap, FieldSpec};
use steeple_adapter::manifest::{Manifest, ManifestBuilder, ManifestEntry};
use steeple_adapter::traits::{
    Adapter, EntityCreate, EntityDelete, EntityFetch, EntityList, EntityUpdate, FetchToken,
    WebhookCapable,
};
use steeple_adapter::transform::EntityTransformer;
use steeple_adapter::types::{
    AccessToken, ExternalSubscription, RawRecord, RecordPage, WebhookEvent,
};
use steeple_core::{EntityId, EntityType};
use steeple_sync::{EntitySink, EntityUpsert, RelationshipUpsert, SinkError};

/// Scriptable adapter with a controllable vendor-side subscription list.
pub struct MockAdapter {
    manifest: Manifest,
    event_types: Vec<String>,
    pub records: Mutex<HashMap<EntityType, Vec<RawRecord>>>,
    pub subscriptions: Mutex<Vec<ExternalSubscription>>,
    pub created_subscriptions: Mutex<Vec<(String, String)>>,
    pub activated_subscriptions: Mutex<Vec<String>>,
    pub fail_activation: bool,
}

impl MockAdapter {
    pub fn new(event_types: Vec<&str>) -> Self {
        let manifest = ManifestBuilder::new()
            .entry(ManifestEntry::new(
                EntityType::Person,
                "people",
                EntityTransformer::new(
                    "pco",
                    EntityType::Person,
                    FieldMap::new()
                        .field("first_name", FieldSpec::maps_to("firstName"))
                        .field("last_name", FieldSpec::maps_to("lastName")),
                ),
            ))
            .unwrap()
            .build();

        Self {
            manifest,
            event_types: event_types.into_iter().map(String::from).collect(),
            records: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(Vec::new()),
            created_subscriptions: Mutex::new(Vec::new()),
            activated_subscriptions: Mutex::new(Vec::new()),
            fail_activation: false,
        }
    }

    pub fn with_subscription(self, sub: ExternalSubscription) -> Self {
        self.subscriptions.lock().unwrap().push(sub);
        self
    }

    /// Make every activate call fail.
    pub fn failing_activation(mut self) -> Self {
        self.fail_activation = true;
        self
    }

    pub fn seed_person(&self, id: &str, first_name: &str) {
        let mut attributes = Map::new();
        attributes.insert("first_name".to_string(), Value::String(first_name.into()));
        self.records
            .lock()
            .unwrap()
            .entry(EntityType::Person)
            .or_default()
            .push(RawRecord::new(EntityType::Person, id, attributes));
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
        _cursor: Option<&str>,
    ) -> AdapterResult<RecordPage> {
        let records = self.records.lock().unwrap();
        Ok(RecordPage {
            records: records.get(&entity_type).cloned().unwrap_or_default(),
            next_cursor: None,
            total: None,
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
        Ok(RawRecord::new(entity_type, "ext-1", attributes.clone()))
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
        Ok(RawRecord::new(entity_type, external_id, attributes.clone()))
    }
}

#[async_trait]
impl EntityDelete for MockAdapter {
    async fn delete_entity(
        &self,
        _entity_type: EntityType,
        _external_id: &str,
    ) -> AdapterResult<()> {
        Ok(())
    }
}

#[async_trait]
impl WebhookCapable for MockAdapter {
    fn webhook_event_types(&self) -> Vec<String> {
        self.event_types.clone()
    }

    async fn list_webhook_subscriptions(&self) -> AdapterResult<Vec<ExternalSubscription>> {
        Ok(self.subscriptions.lock().unwrap().clone())
    }

    async fn create_webhook_subscription(
        &self,
        url: &str,
        event_type: &str,
    ) -> AdapterResult<ExternalSubscription> {
        let mut created = self.created_subscriptions.lock().unwrap();
        created.push((url.to_string(), event_type.to_string()));
        Ok(ExternalSubscription {
            id: format!("sub-{}", created.len()),
            name: event_type.to_string(),
            url: url.to_string(),
            active: true,
            secret: Some(format!("whsec-{}", created.len())),
        })
    }

    async fn activate_webhook_subscription(
        &self,
        subscription_id: &str,
    ) -> AdapterResult<ExternalSubscription> {
        if self.fail_activation {
            return Err(AdapterError::webhook_subscription(
                "activation rejected by vendor",
            ));
        }
        self.activated_subscriptions
            .lock()
            .unwrap()
            .push(subscription_id.to_string());

        let subs = self.subscriptions.lock().unwrap();
        let sub = subs
            .iter()
            .find(|s| s.id == subscription_id)
            .cloned()
            .ok_or_else(|| AdapterError::webhook_subscription("unknown subscription id"))?;

        Ok(ExternalSubscription {
            active: true,
            ..sub
        })
    }

    /// Test payload shape: `{"events": [{"name": "...", "id": "..."}]}`.
    fn parse_webhook_payload(&self, body: &[u8]) -> AdapterResult<Vec<WebhookEvent>> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AdapterError::webhook_processing(e.to_string()))?;

        value["events"]
            .as_array()
            .ok_or_else(|| AdapterError::webhook_processing("payload has no events array"))?
            .iter()
            .map(|event| {
                Ok(WebhookEvent {
                    name: event["name"]
                        .as_str()
                        .ok_or_else(|| AdapterError::webhook_processing("event has no name"))?
                        .to_string(),
                    payload_id: event["id"]
                        .as_str()
                        .ok_or_else(|| AdapterError::webhook_processing("event has no id"))?
                        .to_string(),
                })
            })
            .collect()
    }
}

/// Sink that records everything it is handed.
#[derive(Default)]
pub struct RecordingSink {
    pub entities: Mutex<Vec<EntityUpsert>>,
    pub deleted: Mutex<Vec<(EntityType, EntityId)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntitySink for RecordingSink {
    async fn process_entities(&self, batch: Vec<EntityUpsert>) -> Result<(), SinkError> {
        self.entities.lock().unwrap().extend(batch);
        Ok(())
    }

    async fn process_relationships(
        &self,
        _batch: Vec<RelationshipUpsert>,
    ) -> Result<(), SinkError> {
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
