//! Canonical entity types.
//!
//! One struct per domain object, plus the tagged [`Entity`] variant the
//! rest of the engine passes around. Canonical entities are created by the
//! sync orchestrator and the CRUD router; adapters never construct them
//! directly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::custom_field::CustomField;
use crate::ids::EntityId;

/// Default value for the canonical `type` attribute.
pub const DEFAULT_TYPE: &str = "default";

/// Default value for the canonical `status` attribute.
pub const DEFAULT_STATUS: &str = "active";

/// The kinds of domain objects steeple synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Person,
    Address,
    Campus,
    PhoneNumber,
    Group,
}

impl EntityType {
    /// Canonical pascal-case name, as stored on external links.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "Person",
            EntityType::Address => "Address",
            EntityType::Campus => "Campus",
            EntityType::PhoneNumber => "PhoneNumber",
            EntityType::Group => "Group",
        }
    }

    /// All entity types, in sync order.
    #[must_use]
    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Person,
            EntityType::Address,
            EntityType::Campus,
            EntityType::PhoneNumber,
            EntityType::Group,
        ]
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Person" => Ok(EntityType::Person),
            "Address" => Ok(EntityType::Address),
            "Campus" => Ok(EntityType::Campus),
            "PhoneNumber" => Ok(EntityType::PhoneNumber),
            "Group" => Ok(EntityType::Group),
            _ => Err(format!("unknown entity type: {s}")),
        }
    }
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// A person in the canonical graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub entity_kind: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub street_line_1: Option<String>,
    #[serde(default)]
    pub street_line_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub entity_kind: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// A physical campus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub entity_kind: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// A phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub primary: Option<bool>,
    #[serde(rename = "type", default = "default_type")]
    pub entity_kind: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// A group of people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub entity_kind: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// Tagged variant over the canonical domain types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entityType")]
pub enum Entity {
    Person(Person),
    Address(Address),
    Campus(Campus),
    PhoneNumber(PhoneNumber),
    Group(Group),
}

impl Entity {
    /// The entity type of this variant.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Person(_) => EntityType::Person,
            Entity::Address(_) => EntityType::Address,
            Entity::Campus(_) => EntityType::Campus,
            Entity::PhoneNumber(_) => EntityType::PhoneNumber,
            Entity::Group(_) => EntityType::Group,
        }
    }

    /// The custom fields carried by this entity.
    #[must_use]
    pub fn custom_fields(&self) -> &[CustomField] {
        match self {
            Entity::Person(p) => &p.custom_fields,
            Entity::Address(a) => &a.custom_fields,
            Entity::Campus(c) => &c.custom_fields,
            Entity::PhoneNumber(p) => &p.custom_fields,
            Entity::Group(g) => &g.custom_fields,
        }
    }
}
