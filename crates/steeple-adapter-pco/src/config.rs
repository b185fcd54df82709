//! PCO adapter configuration.

use steeple_adapter::error::{AdapterError, AdapterResult};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.planningcenteronline.com";

/// Configuration for a [`PcoAdapter`](crate::PcoAdapter).
///
/// PCO personal access tokens are an application id plus secret pair sent
/// as HTTP basic auth.
#[derive(Clone)]
pub struct PcoConfig {
    pub base_url: String,
    pub app_id: String,
    pub secret: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Collection page size.
    pub page_size: u32,
}

impl PcoConfig {
    pub fn new(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id: app_id.into(),
            secret: secret.into(),
            timeout_secs: 30,
            page_size: 100,
        }
    }

    /// Point the adapter at another host, e.g. a test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> AdapterResult<()> {
        if self.app_id.is_empty() || self.secret.is_empty() {
            return Err(AdapterError::InvalidConfiguration {
                message: "PCO app id and secret are required".to_string(),
            });
        }
        if self.base_url.is_empty() {
            return Err(AdapterError::InvalidConfiguration {
                message: "PCO base url is required".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(AdapterError::InvalidConfiguration {
                message: "page size must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PcoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcoConfig")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}
