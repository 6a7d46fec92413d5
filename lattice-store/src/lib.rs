//! LATTICE Store - Entity and Relationship Persistence
//!
//! Storage traits plus two implementations: [`PgGraphStore`] for production
//! (PostgreSQL via a deadpool connection pool) and [`MemoryGraphStore`] for
//! tests. All writes are idempotent upserts; conflicts are silently absorbed,
//! which is what makes at-least-once delivery safe against duplicates.
//!
//! Stores hold no durable state in process memory. Every run observes the
//! store's current truth, never a stale in-memory view.

pub mod memory;
pub mod pg;

pub use memory::MemoryGraphStore;
pub use pg::{PgConfig, PgGraphStore};

use async_trait::async_trait;
use lattice_core::{EntityId, StoreResult, Timestamp};

/// Idempotent persistence of named entities.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert the entity if no row with this name exists, and return the
    /// durable id either way.
    ///
    /// A name conflict is absorbed, not surfaced: the second and every later
    /// upsert of the same name is a no-op that still resolves the id. Fails
    /// only when the underlying connection is not usable.
    async fn upsert(&self, name: &str, kind: &str, created_at: Timestamp)
        -> StoreResult<EntityId>;

    /// Look up the stored identifier for a name, `None` when no row exists.
    async fn lookup_id(&self, name: &str) -> StoreResult<Option<EntityId>>;
}

/// Idempotent persistence of directed, named edges.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Insert a directed named edge, absorbing a duplicate-edge conflict.
    ///
    /// Both ids must be resolved entity identifiers; passing an unresolved
    /// id is a caller error. Referential integrity beyond the schema's
    /// foreign keys is not this store's concern.
    async fn upsert(&self, source_id: EntityId, target_id: EntityId, name: &str)
        -> StoreResult<()>;
}
