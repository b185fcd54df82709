//! Error types for the webhook machinery.

use thiserror::Error;

use steeple_adapter::error::AdapterError;
use steeple_sync::SyncError;

/// Webhook system error variants.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed. Terminal for the delivery: nothing
    /// is processed after this.
    #[error("signature verification failed: {0}")]
    Verification(String),

    /// The event-type string does not follow
    /// `module.version.events.entity.action`.
    #[error("malformed event name '{event_name}'")]
    MalformedEventName { event_name: String },

    /// No local subscription config exists for the delivery.
    #[error("no subscription config for {adapter}/{event_type}")]
    SubscriptionNotFound { adapter: String, event_type: String },

    /// Encrypting or decrypting a stored secret failed.
    #[error("secret encryption failed: {0}")]
    Encryption(String),

    /// Storage-level failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Downstream sync failure while acting on a verified payload.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Adapter call failure.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;
