//! Wire-level types shared by all adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use steeple_core::EntityType;

/// A bearer token for the external API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    /// Expiry, when the vendor reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a token with no known expiry.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Check whether the token has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// One raw record from an external system, with the external id already
/// extracted from the vendor envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// The canonical entity type this record maps to.
    pub entity_type: EntityType,
    /// The vendor's identifier for the record.
    pub id: String,
    /// The vendor attribute bag, untransformed.
    pub attributes: Map<String, Value>,
    /// The vendor relationship block, untransformed. Null when absent.
    #[serde(default)]
    pub relationships: Value,
}

impl RawRecord {
    /// Create a record with no relationship block.
    pub fn new(entity_type: EntityType, id: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            entity_type,
            id: id.into(),
            attributes,
            relationships: Value::Null,
        }
    }
}

/// One page of an external collection listing.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<RawRecord>,
    /// Cursor for the next page. None when the collection is exhausted.
    pub next_cursor: Option<String>,
    /// Total collection size, when the vendor reports one.
    pub total: Option<u64>,
}

impl RecordPage {
    /// A terminal empty page.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            next_cursor: None,
            total: None,
        }
    }
}

/// A webhook subscription as the vendor reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSubscription {
    /// The vendor's subscription id.
    pub id: String,
    /// The event-type name the subscription covers.
    pub name: String,
    /// The delivery URL.
    pub url: String,
    pub active: bool,
    /// The signing secret, when the vendor returns it on this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// A vendor-agnostic webhook event extracted from an inbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// The dotted event-type string, e.g. `people.v2.events.person.updated`.
    pub name: String,
    /// The external id of the affected record.
    pub payload_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_token_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let mut token = AccessToken::new("abc");
        assert!(!token.is_expired(now));

        token.expires_at = Some(now - chrono::Duration::seconds(1));
        assert!(token.is_expired(now));

        token.expires_at = Some(now + chrono::Duration::seconds(1));
        assert!(!token.is_expired(now));
    }
}
