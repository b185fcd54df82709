//! Thin HTTP client over the PCO API.
//!
//! Status-to-error mapping happens in the adapter, where the entity
//! context lives; the client only shuttles JSON and surfaces transport
//! failures.

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;
use tracing::trace;

use steeple_adapter::error::{AdapterError, AdapterResult};

use crate::config::PcoConfig;

/// One API response, body already read.
#[derive(Debug)]
pub struct PcoResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Parsed `Retry-After` header, when the vendor sent one.
    pub retry_after_secs: Option<u64>,
}

impl PcoResponse {
    /// Map the non-success statuses every endpoint shares. 404 is left to
    /// the caller, which knows what was being fetched.
    pub fn check_common(self) -> AdapterResult<Self> {
        match self.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AdapterError::AuthenticationFailed)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(AdapterError::RateLimited {
                retry_after_secs: self.retry_after_secs,
            }),
            status if status.is_server_error() => Err(AdapterError::fetch(format!(
                "PCO returned {status}: {}",
                self.body
            ))),
            _ => Ok(self),
        }
    }
}

/// HTTP client bound to one set of PCO credentials.
pub struct PcoClient {
    http: Client,
    config: PcoConfig,
}

impl PcoClient {
    pub fn new(config: PcoConfig) -> AdapterResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AdapterError::InvalidConfiguration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &PcoConfig {
        &self.config
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub async fn get(&self, path: &str) -> AdapterResult<PcoResponse> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> AdapterResult<PcoResponse> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> AdapterResult<PcoResponse> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> AdapterResult<PcoResponse> {
        self.request(Method::DELETE, path, None).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> AdapterResult<PcoResponse> {
        let url = self.url(path);
        trace!(%method, %url, "PCO request");

        let mut builder = self
            .http
            .request(method, &url)
            .basic_auth(&self.config.app_id, Some(&self.config.secret))
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AdapterError::fetch_with_source(format!("request to {url} failed"), e))?;

        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let body = if status == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            response.json().await.unwrap_or(Value::Null)
        };

        Ok(PcoResponse {
            status,
            body,
            retry_after_secs,
        })
    }
}
