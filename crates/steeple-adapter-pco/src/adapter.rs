//! The PCO adapter.
//!
//! PCO speaks JSON:API: every record arrives as
//! `{"type", "id", "attributes", "relationships"}` under a `data` key, and
//! collections paginate with `per_page`/`offset` query parameters plus a
//! `meta.next.offset` continuation.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Map, Value};

use steeple_adapter::error::{AdapterError, AdapterResult};
use steeple_adapter::manifest::{EndpointKind, Manifest};
use steeple_adapter::traits::{
    Adapter, EntityCreate, EntityDelete, EntityFetch, EntityList, EntityUpdate, FetchToken,
    WebhookCapable,
};
use steeple_adapter::types::{
    AccessToken, ExternalSubscription, RawRecord, RecordPage, WebhookEvent,
};
use steeple_core::EntityType;

use crate::client::{PcoClient, PcoResponse};
use crate::config::PcoConfig;
use crate::fields::{self, ADAPTER_TAG};

const SUBSCRIPTIONS_PATH: &str = "/webhooks/v2/subscriptions";

/// Planning Center Online adapter.
pub struct PcoAdapter {
    client: PcoClient,
    manifest: Manifest,
    display_name: String,
}

impl PcoAdapter {
    pub fn new(config: PcoConfig) -> AdapterResult<Self> {
        let display_name = format!("PCO: {}", config.base_url);
        Ok(Self {
            client: PcoClient::new(config)?,
            manifest: fields::manifest(),
            display_name,
        })
    }

    fn endpoint_path(&self, entity_type: EntityType, kind: EndpointKind) -> AdapterResult<&str> {
        let entry = self.manifest.require(entity_type)?;
        entry
            .endpoints
            .get(&kind)
            .map(|endpoint| endpoint.path.as_str())
            .ok_or_else(|| AdapterError::InvalidConfiguration {
                message: format!("no {kind:?} endpoint for {entity_type}"),
            })
    }

    fn parse_record(entity_type: EntityType, item: &Value) -> AdapterResult<RawRecord> {
        let id = item["id"]
            .as_str()
            .ok_or_else(|| AdapterError::fetch("record is missing an id"))?;
        let attributes: Map<String, Value> = item["attributes"]
            .as_object()
            .cloned()
            .unwrap_or_default();

        Ok(RawRecord {
            entity_type,
            id: id.to_string(),
            attributes,
            relationships: item.get("relationships").cloned().unwrap_or(Value::Null),
        })
    }

    fn parse_subscription(item: &Value) -> AdapterResult<ExternalSubscription> {
        let id = item["id"]
            .as_str()
            .ok_or_else(|| AdapterError::webhook_subscription("subscription has no id"))?;
        let attributes = &item["attributes"];

        Ok(ExternalSubscription {
            id: id.to_string(),
            name: attributes["name"].as_str().unwrap_or_default().to_string(),
            url: attributes["url"].as_str().unwrap_or_default().to_string(),
            active: attributes["active"].as_bool().unwrap_or(false),
            secret: attributes["authenticity_secret"]
                .as_str()
                .map(ToString::to_string),
        })
    }

    fn expect_success(
        response: PcoResponse,
        context: &str,
    ) -> AdapterResult<PcoResponse> {
        let response = response.check_common()?;
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(AdapterError::fetch(format!(
                "{context} returned {}: {}",
                response.status, response.body
            )))
        }
    }
}

#[async_trait]
impl Adapter for PcoAdapter {
    fn tag(&self) -> &'static str {
        ADAPTER_TAG
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

#[async_trait]
impl FetchToken for PcoAdapter {
    /// PCO personal access tokens are static; the bearer value is the
    /// basic-auth credential pair, with no expiry to track.
    async fn fetch_token(&self) -> AdapterResult<AccessToken> {
        let config = self.client.config();
        Ok(AccessToken::new(BASE64.encode(format!(
            "{}:{}",
            config.app_id, config.secret
        ))))
    }
}

#[async_trait]
impl EntityFetch for PcoAdapter {
    async fn fetch_entity_by_id(
        &self,
        entity_type: EntityType,
        external_id: &str,
    ) -> AdapterResult<RawRecord> {
        let path = self.endpoint_path(entity_type, EndpointKind::Get)?;
        let response = self
            .client
            .get(&format!("{path}/{external_id}"))
            .await?
            .check_common()?;

        if response.status.as_u16() == 404 {
            return Err(AdapterError::EntityNotFound {
                entity_type,
                external_id: external_id.to_string(),
            });
        }
        let response = Self::expect_success(response, "fetch")?;
        Self::parse_record(entity_type, &response.body["data"])
    }
}

#[async_trait]
impl EntityList for PcoAdapter {
    async fn list_entity_page(
        &self,
        entity_type: EntityType,
        cursor: Option<&str>,
    ) -> AdapterResult<RecordPage> {
        let path = self.endpoint_path(entity_type, EndpointKind::List)?;
        let offset: u64 = match cursor {
            Some(cursor) => cursor.parse().map_err(|_| {
                AdapterError::fetch(format!("invalid page cursor '{cursor}'"))
            })?,
            None => 0,
        };

        let url = format!(
            "{path}?per_page={}&offset={offset}",
            self.client.config().page_size
        );
        let response = Self::expect_success(self.client.get(&url).await?, "list")?;

        let data = response.body["data"]
            .as_array()
            .ok_or_else(|| AdapterError::fetch("list response has no data array"))?;
        let records = data
            .iter()
            .map(|item| Self::parse_record(entity_type, item))
            .collect::<AdapterResult<Vec<_>>>()?;

        Ok(RecordPage {
            records,
            next_cursor: response.body["meta"]["next"]["offset"]
                .as_u64()
                .map(|offset| offset.to_string()),
            total: response.body["meta"]["total_count"].as_u64(),
        })
    }
}

#[async_trait]
impl EntityCreate for PcoAdapter {
    async fn create_entity(
        &self,
        entity_type: EntityType,
        attributes: &Map<String, Value>,
    ) -> AdapterResult<RawRecord> {
        let path = self.endpoint_path(entity_type, EndpointKind::Create)?;
        let body = json!({
            "data": {
                "type": entity_type.as_str(),
                "attributes": attributes,
            }
        });

        let response = Self::expect_success(self.client.post(path, body).await?, "create")?;
        Self::parse_record(entity_type, &response.body["data"])
    }
}

#[async_trait]
impl EntityUpdate for PcoAdapter {
    async fn update_entity(
        &self,
        entity_type: EntityType,
        external_id: &str,
        attributes: &Map<String, Value>,
    ) -> AdapterResult<RawRecord> {
        let path = self.endpoint_path(entity_type, EndpointKind::Update)?;
        let body = json!({
            "data": {
                "type": entity_type.as_str(),
                "id": external_id,
                "attributes": attributes,
            }
        });

        let response = self
            .client
            .patch(&format!("{path}/{external_id}"), body)
            .await?
            .check_common()?;
        if response.status.as_u16() == 404 {
            return Err(AdapterError::EntityNotFound {
                entity_type,
                external_id: external_id.to_string(),
            });
        }
        let response = Self::expect_success(response, "update")?;
        Self::parse_record(entity_type, &response.body["data"])
    }
}

#[async_trait]
impl EntityDelete for PcoAdapter {
    async fn delete_entity(
        &self,
        entity_type: EntityType,
        external_id: &str,
    ) -> AdapterResult<()> {
        let path = self.endpoint_path(entity_type, EndpointKind::Delete)?;
        let response = self
            .client
            .delete(&format!("{path}/{external_id}"))
            .await?
            .check_common()?;

        if response.status.as_u16() == 404 {
            return Err(AdapterError::EntityNotFound {
                entity_type,
                external_id: external_id.to_string(),
            });
        }
        Self::expect_success(response, "delete")?;
        Ok(())
    }
}

#[async_trait]
impl WebhookCapable for PcoAdapter {
    fn webhook_event_types(&self) -> Vec<String> {
        fields::webhook_event_types(&self.manifest)
    }

    async fn list_webhook_subscriptions(&self) -> AdapterResult<Vec<ExternalSubscription>> {
        let response = self
            .client
            .get(SUBSCRIPTIONS_PATH)
            .await?
            .check_common()
            .map_err(|e| AdapterError::webhook_subscription(e.to_string()))?;

        response.body["data"]
            .as_array()
            .ok_or_else(|| {
                AdapterError::webhook_subscription("subscription listing has no data array")
            })?
            .iter()
            .map(Self::parse_subscription)
            .collect()
    }

    async fn create_webhook_subscription(
        &self,
        url: &str,
        event_type: &str,
    ) -> AdapterResult<ExternalSubscription> {
        let body = json!({
            "data": {
                "type": "Subscription",
                "attributes": {
                    "name": event_type,
                    "url": url,
                    "active": true,
                }
            }
        });

        let response = self
            .client
            .post(SUBSCRIPTIONS_PATH, body)
            .await?
            .check_common()?;
        if !response.status.is_success() {
            return Err(AdapterError::webhook_subscription(format!(
                "create returned {}: {}",
                response.status, response.body
            )));
        }
        Self::parse_subscription(&response.body["data"])
    }

    async fn activate_webhook_subscription(
        &self,
        subscription_id: &str,
    ) -> AdapterResult<ExternalSubscription> {
        let body = json!({
            "data": {
                "type": "Subscription",
                "id": subscription_id,
                "attributes": { "active": true }
            }
        });

        let response = self
            .client
            .patch(&format!("{SUBSCRIPTIONS_PATH}/{subscription_id}"), body)
            .await?
            .check_common()?;
        if !response.status.is_success() {
            return Err(AdapterError::webhook_subscription(format!(
                "activate returned {}: {}",
                response.status, response.body
            )));
        }
        Self::parse_subscription(&response.body["data"])
    }

    /// PCO wraps each delivered event's inner payload as a JSON-encoded
    /// string under `data[].attributes.payload`.
    fn parse_webhook_payload(&self, body: &[u8]) -> AdapterResult<Vec<WebhookEvent>> {
        let envelope: Value = serde_json::from_slice(body)
            .map_err(|e| AdapterError::webhook_processing(format!("unparseable body: {e}")))?;

        envelope["data"]
            .as_array()
            .ok_or_else(|| AdapterError::webhook_processing("payload has no data array"))?
            .iter()
            .map(|item| {
                let attributes = &item["attributes"];
                let name = attributes["name"]
                    .as_str()
                    .ok_or_else(|| AdapterError::webhook_processing("event has no name"))?;
                let payload: Value = attributes["payload"]
                    .as_str()
                    .map(serde_json::from_str)
                    .transpose()
                    .map_err(|e| {
                        AdapterError::webhook_processing(format!("unparseable inner payload: {e}"))
                    })?
                    .ok_or_else(|| AdapterError::webhook_processing("event has no payload"))?;
                let payload_id = payload["data"]["id"]
                    .as_str()
                    .ok_or_else(|| AdapterError::webhook_processing("payload has no data.id"))?;

                Ok(WebhookEvent {
                    name: name.to_string(),
                    payload_id: payload_id.to_string(),
                })
            })
            .collect()
    }
}
