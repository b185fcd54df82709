//! # Webhook Machinery
//!
//! Keeps vendor webhook subscriptions matching the manifest's desired
//! event types, and verifies and routes the pushes those subscriptions
//! deliver.
//!
//! ## Crate Organization
//!
//! - [`crypto`] - HMAC-SHA256 signatures and AES-GCM secrets at rest
//! - [`event`] - Event-name parsing
//! - [`config`] - Local subscription config store
//! - [`reconciler`] - Desired-state subscription reconciliation
//! - [`processor`] - Inbound delivery verification and routing
//! - [`error`] - `WebhookError`

pub mod config;
pub mod crypto;
pub mod error;
pub mod event;
pub mod processor;
pub mod reconciler;

pub use config::{
    MemoryWebhookConfigStore, PgWebhookConfigStore, WebhookConfig, WebhookConfigStore,
};
pub use error::{WebhookError, WebhookResult};
pub use event::EventName;
pub use processor::{
    ProcessSummary, WebhookDelivery, WebhookProcessor, DEFAULT_SIGNATURE_PREFIX,
};
pub use reconciler::{ReconcileSummary, SubscriptionReconciler, SubscriptionStatus};
