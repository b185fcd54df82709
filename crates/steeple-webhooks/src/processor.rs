//! Webhook payload processor.
//!
//! Verifies an inbound delivery against its subscription's stored secret,
//! then routes every event in the payload: a destroy action retires the
//! linked entity, anything else pulls the record fresh from the vendor.
//! Verification failure is terminal for the delivery; nothing is parsed
//! or written after a rejected signature.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use steeple_adapter::registry::BoxedAdapter;
use steeple_sync::SyncOrchestrator;

use crate::config::WebhookConfigStore;
use crate::crypto;
use crate::error::{WebhookError, WebhookResult};
use crate::event::EventName;

/// Default signature header prefix, `"<prefix>=<hex-hmac>"`.
pub const DEFAULT_SIGNATURE_PREFIX: &str = "sha256";

/// One inbound webhook delivery, as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    /// The event-type name the delivery belongs to, identifying the
    /// subscription and its secret.
    pub event_type: String,
    /// The signature header value.
    pub signature: String,
    /// The exact raw body. Signatures cover these bytes, so the HTTP
    /// layer must not re-serialize.
    pub body: Vec<u8>,
}

/// What one processed delivery did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub synced: u64,
    pub deleted: u64,
    pub skipped: u64,
}

/// Verifies and routes inbound webhook deliveries for one adapter.
pub struct WebhookProcessor {
    adapter: BoxedAdapter,
    store: Arc<dyn WebhookConfigStore>,
    orchestrator: Arc<SyncOrchestrator>,
    signature_prefix: String,
}

impl WebhookProcessor {
    pub fn new(
        adapter: BoxedAdapter,
        store: Arc<dyn WebhookConfigStore>,
        orchestrator: Arc<SyncOrchestrator>,
    ) -> Self {
        Self {
            adapter,
            store,
            orchestrator,
            signature_prefix: DEFAULT_SIGNATURE_PREFIX.to_string(),
        }
    }

    /// Override the signature header prefix for vendors that use another.
    #[must_use]
    pub fn with_signature_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.signature_prefix = prefix.into();
        self
    }

    /// Process one delivery.
    #[instrument(skip(self, delivery), fields(adapter = %self.adapter.tag(), event_type = %delivery.event_type))]
    pub async fn process(&self, delivery: &WebhookDelivery) -> WebhookResult<ProcessSummary> {
        let adapter = self.adapter.tag();

        let config = self
            .store
            .get(adapter, &delivery.event_type)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound {
                adapter: adapter.to_string(),
                event_type: delivery.event_type.clone(),
            })?;

        crypto::verify_signature(
            &delivery.signature,
            &self.signature_prefix,
            &config.secret,
            &delivery.body,
        )?;

        let events = self.adapter.parse_webhook_payload(&delivery.body)?;

        let mut summary = ProcessSummary::default();
        for event in events {
            let name = EventName::parse(&event.name)?;

            if name.is_destroy() {
                self.orchestrator
                    .delete_by_external_id(&event.payload_id)
                    .await?;
                summary.deleted += 1;
                continue;
            }

            let Some(entity_type) = name.entity_type() else {
                warn!(
                    adapter = %adapter,
                    event_name = %event.name,
                    "event entity maps to no canonical type; skipping"
                );
                summary.skipped += 1;
                continue;
            };

            self.orchestrator
                .sync_entity_id(entity_type, &event.payload_id)
                .await?;
            summary.synced += 1;
        }

        info!(
            adapter = %adapter,
            synced = summary.synced,
            deleted = summary.deleted,
            skipped = summary.skipped,
            "webhook delivery processed"
        );
        Ok(summary)
    }
}
