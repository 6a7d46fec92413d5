//! In-memory store implementation for tests.
//!
//! Mirrors the PostgreSQL implementation's conflict semantics exactly:
//! entity names are unique, the ordered `(source, target, name)` edge triple
//! is unique, and conflicts are absorbed. An availability toggle simulates a
//! store outage for failure-path tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use lattice_core::{Entity, EntityId, StoreError, StoreResult, Timestamp};

use crate::{EntityStore, RelationshipStore};

#[derive(Debug, Default)]
struct State {
    next_id: EntityId,
    entities: HashMap<String, Entity>,
    relationships: HashSet<(EntityId, EntityId, String)>,
}

/// In-memory graph store with idempotent-upsert semantics.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    state: RwLock<State>,
    available: AtomicBool,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle simulated availability. While unavailable every operation
    /// fails with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                reason: "simulated outage".to_string(),
            })
        }
    }

    /// Number of entity rows.
    pub fn entity_count(&self) -> usize {
        self.state.read().unwrap().entities.len()
    }

    /// Number of edge rows.
    pub fn relationship_count(&self) -> usize {
        self.state.read().unwrap().relationships.len()
    }

    /// Snapshot of the entity row for a name, if any.
    pub fn entity(&self, name: &str) -> Option<Entity> {
        self.state.read().unwrap().entities.get(name).cloned()
    }

    /// Whether the given edge row exists.
    pub fn has_relationship(&self, source_id: EntityId, target_id: EntityId, name: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .relationships
            .contains(&(source_id, target_id, name.to_string()))
    }
}

#[async_trait]
impl EntityStore for MemoryGraphStore {
    async fn upsert(
        &self,
        name: &str,
        kind: &str,
        created_at: Timestamp,
    ) -> StoreResult<EntityId> {
        self.check_available()?;
        let mut state = self.state.write().unwrap();

        if let Some(existing) = state.entities.get(name) {
            return Ok(existing.id);
        }

        state.next_id += 1;
        let id = state.next_id;
        state.entities.insert(
            name.to_string(),
            Entity {
                id,
                name: name.to_string(),
                kind: kind.to_string(),
                created_at,
            },
        );
        Ok(id)
    }

    async fn lookup_id(&self, name: &str) -> StoreResult<Option<EntityId>> {
        self.check_available()?;
        Ok(self.state.read().unwrap().entities.get(name).map(|e| e.id))
    }
}

#[async_trait]
impl RelationshipStore for MemoryGraphStore {
    async fn upsert(
        &self,
        source_id: EntityId,
        target_id: EntityId,
        name: &str,
    ) -> StoreResult<()> {
        self.check_available()?;
        self.state
            .write()
            .unwrap()
            .relationships
            .insert((source_id, target_id, name.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use tokio::runtime::Runtime;

    #[tokio::test]
    async fn test_entity_upsert_is_idempotent() {
        let store = MemoryGraphStore::new();

        let first = EntityStore::upsert(&store, "alice", "entity", Utc::now())
            .await
            .unwrap();
        let second = EntityStore::upsert(&store, "alice", "entity", Utc::now())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.entity_count(), 1);
    }

    #[tokio::test]
    async fn test_first_upsert_wins_the_row() {
        let store = MemoryGraphStore::new();
        let created = Utc::now();

        EntityStore::upsert(&store, "alice", "entity", created)
            .await
            .unwrap();
        EntityStore::upsert(&store, "alice", "other-kind", Utc::now())
            .await
            .unwrap();

        let entity = store.entity("alice").unwrap();
        assert_eq!(entity.kind, "entity");
        assert_eq!(entity.created_at, created);
    }

    #[tokio::test]
    async fn test_lookup_unknown_name_is_none() {
        let store = MemoryGraphStore::new();
        assert_eq!(store.lookup_id("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_resolves_upserted_id() {
        let store = MemoryGraphStore::new();
        let id = EntityStore::upsert(&store, "alice", "entity", Utc::now())
            .await
            .unwrap();
        assert_eq!(store.lookup_id("alice").await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn test_relationship_upsert_is_idempotent() {
        let store = MemoryGraphStore::new();

        RelationshipStore::upsert(&store, 1, 2, "manages")
            .await
            .unwrap();
        RelationshipStore::upsert(&store, 1, 2, "manages")
            .await
            .unwrap();

        assert_eq!(store.relationship_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_names_between_same_pair_are_distinct_edges() {
        let store = MemoryGraphStore::new();

        RelationshipStore::upsert(&store, 1, 2, "manages")
            .await
            .unwrap();
        RelationshipStore::upsert(&store, 1, 2, "mentors")
            .await
            .unwrap();

        assert_eq!(store.relationship_count(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = MemoryGraphStore::new();
        store.set_available(false);

        assert!(EntityStore::upsert(&store, "alice", "entity", Utc::now())
            .await
            .is_err());
        assert!(store.lookup_id("alice").await.is_err());
        assert!(RelationshipStore::upsert(&store, 1, 2, "manages")
            .await
            .is_err());

        store.set_available(true);
        assert!(EntityStore::upsert(&store, "alice", "entity", Utc::now())
            .await
            .is_ok());
    }

    proptest! {
        #[test]
        fn prop_repeated_entity_upserts_leave_one_row(
            name in "[a-zA-Z0-9_]{1,32}",
            repeats in 2usize..8,
        ) {
            let rt = Runtime::new().unwrap();
            rt.block_on(async {
                let store = MemoryGraphStore::new();
                let mut ids = Vec::new();
                for _ in 0..repeats {
                    ids.push(
                        EntityStore::upsert(&store, &name, "entity", Utc::now())
                            .await
                            .unwrap(),
                    );
                }
                prop_assert_eq!(store.entity_count(), 1);
                prop_assert!(ids.windows(2).all(|w| w[0] == w[1]));
                Ok(())
            })?;
        }

        #[test]
        fn prop_repeated_edge_upserts_leave_one_row(
            source in 1i64..100,
            target in 1i64..100,
            name in "[a-z]{1,16}",
            repeats in 2usize..8,
        ) {
            let rt = Runtime::new().unwrap();
            rt.block_on(async {
                let store = MemoryGraphStore::new();
                for _ in 0..repeats {
                    RelationshipStore::upsert(&store, source, target, &name)
                        .await
                        .unwrap();
                }
                prop_assert_eq!(store.relationship_count(), 1);
                Ok(())
            })?;
        }
    }
}
