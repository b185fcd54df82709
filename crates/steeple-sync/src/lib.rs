//! # Synchronization Engine
//!
//! Keeps the canonical entity graph and external ChMS APIs eventually
//! consistent without a shared transaction.
//!
//! Three moving parts compose the adapter framework:
//!
//! - The [`link`] store persists the identity mapping between canonical
//!   entities and their external counterparts.
//! - The [`router`] pushes internal CRUD mutations out to the adapter,
//!   creating or reusing links as it goes.
//! - The [`orchestrator`] pulls external collections in, page by page, and
//!   detects out-of-band deletions by what a full pass failed to
//!   re-confirm.
//!
//! External create and update calls are at-least-once under retry; there
//! is no cross-process locking.
//!
//! ## Crate Organization
//!
//! - [`link`] - `ExternalLink`, the `LinkStore` trait, Postgres and
//!   in-memory implementations
//! - [`router`] - CRUD mutation routing and mutation-name parsing
//! - [`orchestrator`] - Full and single-entity pull sync
//! - [`sink`] - Persistence collaborator interface
//! - [`inflect`] - Table-name to entity-name derivation
//! - [`error`] - `SyncError` and `RouterError`

pub mod error;
pub mod inflect;
pub mod link;
pub mod orchestrator;
pub mod router;
pub mod sink;

#[cfg(test)]
mod testutil;

pub use error::{RouterError, RouterResult, SyncError, SyncResult};
pub use link::{
    mark_sync_completed, mark_sync_in_progress, ExternalLink, LinkPatch, LinkStore,
    MemoryLinkStore, PgLinkStore,
};
pub use orchestrator::{SyncOrchestrator, SyncSummary};
pub use router::{
    parse_mutation_name, CrudOp, CrudOperation, CrudRouter, PrimaryKey, RouteOutcome,
    RouterSummary,
};
pub use sink::{EntitySink, EntityUpsert, RelationshipUpsert, SinkError};
