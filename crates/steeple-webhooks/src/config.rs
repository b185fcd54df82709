//! Local webhook subscription config.
//!
//! One row per `(adapter, event_type)`, recording the signing secret and
//! the vendor's subscription id. The reconciler writes rows; the payload
//! processor reads them to verify deliveries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::crypto;
use crate::error::WebhookResult;

/// Local record of one vendor webhook subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub adapter: String,
    pub event_type: String,
    /// Signing secret, plaintext in memory. The Postgres store encrypts it
    /// at rest.
    pub secret: String,
    pub external_webhook_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookConfig {
    /// Create a config row stamped with the current time.
    pub fn new(
        adapter: impl Into<String>,
        event_type: impl Into<String>,
        secret: impl Into<String>,
        external_webhook_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            adapter: adapter.into(),
            event_type: event_type.into(),
            secret: secret.into(),
            external_webhook_id: external_webhook_id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Store of local webhook subscription config.
#[async_trait]
pub trait WebhookConfigStore: Send + Sync {
    /// Fetch the config for one `(adapter, event_type)`.
    async fn get(&self, adapter: &str, event_type: &str) -> WebhookResult<Option<WebhookConfig>>;

    /// Insert or replace the config for the row's `(adapter, event_type)`.
    async fn upsert(&self, config: WebhookConfig) -> WebhookResult<()>;

    /// All config rows for one adapter.
    async fn list(&self, adapter: &str) -> WebhookResult<Vec<WebhookConfig>>;
}

/// Config store holding rows in process memory.
#[derive(Debug, Default)]
pub struct MemoryWebhookConfigStore {
    rows: RwLock<Vec<WebhookConfig>>,
}

impl MemoryWebhookConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookConfigStore for MemoryWebhookConfigStore {
    async fn get(&self, adapter: &str, event_type: &str) -> WebhookResult<Option<WebhookConfig>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| row.adapter == adapter && row.event_type == event_type)
            .cloned())
    }

    async fn upsert(&self, config: WebhookConfig) -> WebhookResult<()> {
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|row| row.adapter == config.adapter && row.event_type == config.event_type)
        {
            Some(row) => {
                let created_at = row.created_at;
                *row = WebhookConfig {
                    created_at,
                    updated_at: Utc::now(),
                    ..config
                };
            }
            None => rows.push(config),
        }
        Ok(())
    }

    async fn list(&self, adapter: &str) -> WebhookResult<Vec<WebhookConfig>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| row.adapter == adapter)
            .cloned()
            .collect())
    }
}

/// Config store backed by Postgres, encrypting secrets at rest.
///
/// Expects a `webhook_configs` table with a unique index over
/// `(adapter, event_type)`; schema lives with the surrounding application.
#[derive(Clone)]
pub struct PgWebhookConfigStore {
    pool: PgPool,
    encryption_key: Vec<u8>,
}

impl PgWebhookConfigStore {
    #[must_use]
    pub fn new(pool: PgPool, encryption_key: Vec<u8>) -> Self {
        Self {
            pool,
            encryption_key,
        }
    }
}

#[async_trait]
impl WebhookConfigStore for PgWebhookConfigStore {
    #[instrument(skip(self))]
    async fn get(&self, adapter: &str, event_type: &str) -> WebhookResult<Option<WebhookConfig>> {
        let row = sqlx::query(
            r"
            SELECT adapter, event_type, secret_encrypted, external_webhook_id,
                   created_at, updated_at
            FROM webhook_configs
            WHERE adapter = $1 AND event_type = $2
            ",
        )
        .bind(adapter)
        .bind(event_type)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let secret_encrypted: String = row.get("secret_encrypted");
            Ok(WebhookConfig {
                adapter: row.get("adapter"),
                event_type: row.get("event_type"),
                secret: crypto::decrypt_secret(&secret_encrypted, &self.encryption_key)?,
                external_webhook_id: row.get("external_webhook_id"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
        })
        .transpose()
    }

    #[instrument(skip(self, config), fields(adapter = %config.adapter, event_type = %config.event_type))]
    async fn upsert(&self, config: WebhookConfig) -> WebhookResult<()> {
        let secret_encrypted = crypto::encrypt_secret(&config.secret, &self.encryption_key)?;

        sqlx::query(
            r"
            INSERT INTO webhook_configs (
                adapter, event_type, secret_encrypted, external_webhook_id,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (adapter, event_type) DO UPDATE SET
                secret_encrypted = EXCLUDED.secret_encrypted,
                external_webhook_id = EXCLUDED.external_webhook_id,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(&config.adapter)
        .bind(&config.event_type)
        .bind(secret_encrypted)
        .bind(&config.external_webhook_id)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, adapter: &str) -> WebhookResult<Vec<WebhookConfig>> {
        let rows = sqlx::query(
            r"
            SELECT adapter, event_type, secret_encrypted, external_webhook_id,
                   created_at, updated_at
            FROM webhook_configs
            WHERE adapter = $1
            ORDER BY event_type
            ",
        )
        .bind(adapter)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let secret_encrypted: String = row.get("secret_encrypted");
                Ok(WebhookConfig {
                    adapter: row.get("adapter"),
                    event_type: row.get("event_type"),
                    secret: crypto::decrypt_secret(&secret_encrypted, &self.encryption_key)?,
                    external_webhook_id: row.get("external_webhook_id"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                })
            })
            .collect()
    }
}
