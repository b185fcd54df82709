//! Webhook event-name parsing.
//!
//! Vendors name their events `"<module>.<version>.events.<entity>.<action>"`,
//! e.g. `people.v2.events.person.updated`. The string is parsed
//! positionally; the literal `events` in the third slot anchors the shape.

use steeple_core::EntityType;
use steeple_sync::inflect::pascal_case;

use crate::error::WebhookError;

/// The action that retires the external record.
const DESTROY_ACTION: &str = "destroyed";

/// A parsed webhook event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventName {
    pub module: String,
    pub version: String,
    pub entity: String,
    pub action: String,
}

impl EventName {
    /// Parse a dotted event-type string.
    pub fn parse(raw: &str) -> Result<Self, WebhookError> {
        let parts: Vec<&str> = raw.split('.').collect();
        match parts.as_slice() {
            [module, version, "events", entity, action]
                if !module.is_empty()
                    && !version.is_empty()
                    && !entity.is_empty()
                    && !action.is_empty() =>
            {
                Ok(Self {
                    module: (*module).to_string(),
                    version: (*version).to_string(),
                    entity: (*entity).to_string(),
                    action: (*action).to_string(),
                })
            }
            _ => Err(WebhookError::MalformedEventName {
                event_name: raw.to_string(),
            }),
        }
    }

    /// Whether this event retires the record rather than upserting it.
    #[must_use]
    pub fn is_destroy(&self) -> bool {
        self.action == DESTROY_ACTION
    }

    /// The canonical entity type the event's entity segment maps to.
    #[must_use]
    pub fn entity_type(&self) -> Option<EntityType> {
        pascal_case(&self.entity).parse().ok()
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.events.{}.{}",
            self.module, self.version, self.entity, self.action
        )
    }
}
