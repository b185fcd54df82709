//! Adapter capability traits.
//!
//! Each external ChMS integration implements the base [`Adapter`] trait
//! plus the capabilities its API supports. The rest of the engine is
//! written against these traits and never branches on vendor identity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use steeple_core::EntityType;

use crate::error::AdapterResult;
use crate::manifest::Manifest;
use crate::transform::EntityTransformer;
use crate::types::{AccessToken, ExternalSubscription, RawRecord, RecordPage, WebhookEvent};

/// Base trait for all adapters.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short vendor tag, e.g. `"pco"`. Used as the custom-field source and
    /// the external-link adapter column.
    fn tag(&self) -> &'static str;

    /// Display name for this adapter instance.
    fn display_name(&self) -> &str;

    /// The static per-entity manifest for this adapter.
    fn manifest(&self) -> &Manifest;

    /// The transformer for one entity, from the manifest.
    fn transformer(&self, entity_type: EntityType) -> AdapterResult<&EntityTransformer> {
        Ok(&self.manifest().require(entity_type)?.transformer)
    }

    /// Extract the external-side modification timestamp from a raw record.
    ///
    /// The default reads an RFC 3339 `updated_at` attribute, which covers
    /// the vendors integrated so far.
    fn extract_updated_at(&self, record: &RawRecord) -> Option<DateTime<Utc>> {
        record
            .attributes
            .get("updated_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Capability for obtaining an API token.
#[async_trait]
pub trait FetchToken: Adapter {
    /// Fetch (or refresh) a bearer token for the external API.
    async fn fetch_token(&self) -> AdapterResult<AccessToken>;
}

/// Capability for fetching a single record by its external id.
#[async_trait]
pub trait EntityFetch: Adapter {
    /// Fetch one record. A missing record is
    /// [`AdapterError::EntityNotFound`](crate::error::AdapterError::EntityNotFound).
    async fn fetch_entity_by_id(
        &self,
        entity_type: EntityType,
        external_id: &str,
    ) -> AdapterResult<RawRecord>;
}

/// Capability for listing an external collection page by page.
///
/// The cursor makes the sequence lazy and restartable; the collection is
/// bounded only by the external system. Callers drive pages sequentially
/// for one entity type because vendor pagination is stateful.
#[async_trait]
pub trait EntityList: Adapter {
    /// Fetch one page. `cursor` of None starts from the beginning; the
    /// returned `next_cursor` of None ends the sequence.
    async fn list_entity_page(
        &self,
        entity_type: EntityType,
        cursor: Option<&str>,
    ) -> AdapterResult<RecordPage>;
}

/// Capability for creating records in the external system.
#[async_trait]
pub trait EntityCreate: Adapter {
    /// Create a record from an already-encoded external attribute bag.
    /// Returns the created record, carrying the vendor-assigned id.
    async fn create_entity(
        &self,
        entity_type: EntityType,
        attributes: &Map<String, Value>,
    ) -> AdapterResult<RawRecord>;
}

/// Capability for updating records in the external system.
#[async_trait]
pub trait EntityUpdate: Adapter {
    /// Update a record from an already-encoded external attribute bag.
    async fn update_entity(
        &self,
        entity_type: EntityType,
        external_id: &str,
        attributes: &Map<String, Value>,
    ) -> AdapterResult<RawRecord>;
}

/// Capability for deleting records from the external system.
#[async_trait]
pub trait EntityDelete: Adapter {
    async fn delete_entity(&self, entity_type: EntityType, external_id: &str)
        -> AdapterResult<()>;
}

/// Capability for webhook subscriptions and inbound payload parsing.
#[async_trait]
pub trait WebhookCapable: Adapter {
    /// The event types this adapter wants subscriptions for, drawn from
    /// its manifest.
    fn webhook_event_types(&self) -> Vec<String>;

    /// List the live subscriptions on the vendor side, unfiltered.
    async fn list_webhook_subscriptions(&self) -> AdapterResult<Vec<ExternalSubscription>>;

    /// Create an active subscription delivering `event_type` to `url`.
    async fn create_webhook_subscription(
        &self,
        url: &str,
        event_type: &str,
    ) -> AdapterResult<ExternalSubscription>;

    /// Activate an existing inactive subscription.
    async fn activate_webhook_subscription(
        &self,
        subscription_id: &str,
    ) -> AdapterResult<ExternalSubscription>;

    /// Parse a verified inbound payload into vendor-agnostic events.
    fn parse_webhook_payload(&self, body: &[u8]) -> AdapterResult<Vec<WebhookEvent>>;
}

/// Marker for adapters that support pull synchronization.
pub trait SyncCapable: EntityFetch + EntityList {}

impl<T> SyncCapable for T where T: EntityFetch + EntityList {}

/// Marker for adapters that support all outbound CRUD operations.
pub trait CrudCapable: EntityCreate + EntityUpdate + EntityDelete {}

impl<T> CrudCapable for T where T: EntityCreate + EntityUpdate + EntityDelete {}

/// The full capability set, used as the registry's boxed object type.
pub trait FullAdapter:
    FetchToken + EntityFetch + EntityList + EntityCreate + EntityUpdate + EntityDelete + WebhookCapable
{
}

impl<T> FullAdapter for T where
    T: FetchToken
        + EntityFetch
        + EntityList
        + EntityCreate
        + EntityUpdate
        + EntityDelete
        + WebhookCapable
{
}

impl std::fmt::Debug for dyn FullAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullAdapter").field("tag", &self.tag()).finish()
    }
}
