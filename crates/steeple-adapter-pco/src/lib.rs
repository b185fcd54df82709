//! # Planning Center Online Adapter
//!
//! Implements the adapter capability traits against the PCO REST API:
//! JSON:API record parsing, offset pagination, webhook subscription
//! management, and the PCO field tables.
//!
//! ```ignore
//! use steeple_adapter_pco::{PcoAdapter, PcoConfig};
//!
//! let adapter = PcoAdapter::new(PcoConfig::new(app_id, secret))?;
//! let page = adapter.list_entity_page(EntityType::Person, None).await?;
//! ```

pub mod adapter;
pub mod client;
pub mod config;
pub mod fields;

pub use adapter::PcoAdapter;
pub use config::{PcoConfig, DEFAULT_BASE_URL};
pub use fields::ADAPTER_TAG;
