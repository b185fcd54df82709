//! Adapter error types.
//!
//! Error definitions with transient/permanent classification for retry logic.

use thiserror::Error;

use steeple_core::EntityType;

/// Error that can occur during adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A call against the external API failed.
    #[error("fetch failed: {message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external API asked us to back off.
    #[error("rate limited by external API")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Authentication against the external API failed.
    #[error("authentication failed: invalid or expired credentials")]
    AuthenticationFailed,

    /// A record could not be mapped between external and canonical shapes.
    #[error("transform failed for {entity_type}: {message}")]
    Transform {
        entity_type: EntityType,
        message: String,
    },

    /// The requested record does not exist in the external system.
    #[error("{entity_type} '{external_id}' not found in external system")]
    EntityNotFound {
        entity_type: EntityType,
        external_id: String,
    },

    /// A webhook subscription call against the external API failed.
    #[error("webhook subscription failed: {message}")]
    WebhookSubscription {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An inbound webhook payload could not be parsed.
    #[error("webhook processing failed: {message}")]
    WebhookProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The requested adapter tag is not registered.
    #[error("unsupported adapter '{tag}' (registered: {})", registered.join(", "))]
    UnsupportedAdapter { tag: String, registered: Vec<String> },

    /// A manifest was built with the same entity twice.
    #[error("duplicate manifest entry for {entity_type}")]
    DuplicateManifestEntry { entity_type: EntityType },

    /// A registry was built with the same adapter tag twice.
    #[error("duplicate adapter tag '{tag}'")]
    DuplicateAdapterTag { tag: String },

    /// The manifest has no entry for the requested entity.
    #[error("no manifest entry for {entity_type}")]
    ManifestEntryMissing { entity_type: EntityType },

    /// Adapter configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl AdapterError {
    /// Check if this error is transient and the operation may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AdapterError::Fetch { .. } | AdapterError::RateLimited { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    // Convenience constructors

    /// Create a fetch error.
    pub fn fetch(message: impl Into<String>) -> Self {
        AdapterError::Fetch {
            message: message.into(),
            source: None,
        }
    }

    /// Create a fetch error with source.
    pub fn fetch_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AdapterError::Fetch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a transform error.
    pub fn transform(entity_type: EntityType, message: impl Into<String>) -> Self {
        AdapterError::Transform {
            entity_type,
            message: message.into(),
        }
    }

    /// Create a webhook subscription error.
    pub fn webhook_subscription(message: impl Into<String>) -> Self {
        AdapterError::WebhookSubscription {
            message: message.into(),
            source: None,
        }
    }

    /// Create a webhook processing error.
    pub fn webhook_processing(message: impl Into<String>) -> Self {
        AdapterError::WebhookProcessing {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
