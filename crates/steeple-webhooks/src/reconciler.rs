//! Webhook subscription reconciler.
//!
//! Desired state is the adapter's manifest-driven event-type list; actual
//! state is the vendor's live subscription listing filtered to this
//! deployment's webhook URL. Each event type is brought from its observed
//! status to active-with-local-config. Event types are independent and
//! reconcile concurrently; one failure never aborts the others.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use steeple_adapter::registry::BoxedAdapter;
use steeple_adapter::types::ExternalSubscription;

use crate::config::{WebhookConfig, WebhookConfigStore};
use crate::error::WebhookResult;

/// Observed status of one desired event type, derived per pass and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// No subscription exists on the vendor side for this URL.
    Unset,
    /// A subscription exists but is switched off.
    Inactive(String),
    /// A subscription exists and is delivering.
    Active(String),
}

/// What one reconciled event type needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReconcileOutcome {
    Created,
    Activated,
    Confirmed,
    Backfilled,
}

/// Aggregate result of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: u64,
    pub activated: u64,
    pub confirmed: u64,
    pub backfilled: u64,
    pub failed: u64,
}

/// Keeps the vendor's subscriptions matching the manifest's event types.
pub struct SubscriptionReconciler {
    adapter: BoxedAdapter,
    store: Arc<dyn WebhookConfigStore>,
    webhook_url: String,
}

impl SubscriptionReconciler {
    pub fn new(
        adapter: BoxedAdapter,
        store: Arc<dyn WebhookConfigStore>,
        webhook_url: impl Into<String>,
    ) -> Self {
        Self {
            adapter,
            store,
            webhook_url: webhook_url.into(),
        }
    }

    /// Run one reconciliation pass over every desired event type.
    ///
    /// The vendor listing itself failing fails the pass; everything after
    /// that is isolated per event type.
    pub async fn reconcile(&self) -> WebhookResult<ReconcileSummary> {
        let desired = self.adapter.webhook_event_types();
        let listing = self.adapter.list_webhook_subscriptions().await?;
        let actual: Vec<ExternalSubscription> = listing
            .into_iter()
            .filter(|sub| sub.url == self.webhook_url)
            .collect();

        let outcomes = join_all(
            desired
                .iter()
                .map(|event_type| self.reconcile_event_type(event_type, &actual)),
        )
        .await;

        let mut summary = ReconcileSummary::default();
        for (event_type, outcome) in desired.iter().zip(outcomes) {
            match outcome {
                Ok(ReconcileOutcome::Created) => summary.created += 1,
                Ok(ReconcileOutcome::Activated) => summary.activated += 1,
                Ok(ReconcileOutcome::Confirmed) => summary.confirmed += 1,
                Ok(ReconcileOutcome::Backfilled) => summary.backfilled += 1,
                Err(error) => {
                    summary.failed += 1;
                    warn!(
                        adapter = %self.adapter.tag(),
                        event_type = %event_type,
                        %error,
                        "event type reconciliation failed"
                    );
                }
            }
        }

        info!(
            adapter = %self.adapter.tag(),
            created = summary.created,
            activated = summary.activated,
            confirmed = summary.confirmed,
            backfilled = summary.backfilled,
            failed = summary.failed,
            "webhook reconciliation pass complete"
        );
        Ok(summary)
    }

    /// Status of one event type against the URL-filtered listing.
    fn status_for(
        &self,
        event_type: &str,
        actual: &[ExternalSubscription],
    ) -> SubscriptionStatus {
        match actual
            .iter()
            .find(|sub| sub.name == event_type && sub.url == self.webhook_url)
        {
            None => SubscriptionStatus::Unset,
            Some(sub) if sub.active => SubscriptionStatus::Active(sub.id.clone()),
            Some(sub) => SubscriptionStatus::Inactive(sub.id.clone()),
        }
    }

    async fn reconcile_event_type(
        &self,
        event_type: &str,
        actual: &[ExternalSubscription],
    ) -> WebhookResult<ReconcileOutcome> {
        let adapter = self.adapter.tag();

        match self.status_for(event_type, actual) {
            SubscriptionStatus::Unset => {
                let sub = self
                    .adapter
                    .create_webhook_subscription(&self.webhook_url, event_type)
                    .await?;
                self.persist(event_type, &sub, None).await?;
                Ok(ReconcileOutcome::Created)
            }
            SubscriptionStatus::Inactive(id) => {
                let sub = self.adapter.activate_webhook_subscription(&id).await?;
                let fallback = self.store.get(adapter, event_type).await?;
                self.persist(event_type, &sub, fallback).await?;
                Ok(ReconcileOutcome::Activated)
            }
            SubscriptionStatus::Active(id) => {
                // Idempotent except for recovering a lost local row. Only
                // existence is checked; content drift (a rotated secret)
                // is not detected here.
                if self.store.get(adapter, event_type).await?.is_some() {
                    return Ok(ReconcileOutcome::Confirmed);
                }

                let sub = actual
                    .iter()
                    .find(|sub| sub.id == id)
                    .expect("status came from this listing");
                match &sub.secret {
                    Some(secret) => {
                        self.store
                            .upsert(WebhookConfig::new(adapter, event_type, secret, &sub.id))
                            .await?;
                        Ok(ReconcileOutcome::Backfilled)
                    }
                    None => {
                        warn!(
                            adapter = %adapter,
                            event_type = %event_type,
                            subscription_id = %sub.id,
                            "active subscription has no local config and the listing carries no secret"
                        );
                        Ok(ReconcileOutcome::Confirmed)
                    }
                }
            }
        }
    }

    /// Persist the local config row for a subscription the vendor just
    /// created or activated. The secret comes from the vendor response
    /// when present, else from the existing local row.
    async fn persist(
        &self,
        event_type: &str,
        sub: &ExternalSubscription,
        fallback: Option<WebhookConfig>,
    ) -> WebhookResult<()> {
        let secret = sub
            .secret
            .clone()
            .or(fallback.map(|config| config.secret));

        match secret {
            Some(secret) => {
                self.store
                    .upsert(WebhookConfig::new(
                        self.adapter.tag(),
                        event_type,
                        secret,
                        &sub.id,
                    ))
                    .await
            }
            None => {
                warn!(
                    adapter = %self.adapter.tag(),
                    event_type = %event_type,
                    subscription_id = %sub.id,
                    "vendor returned no secret; local config not written"
                );
                Ok(())
            }
        }
    }
}
