//! PostgreSQL store implementation.
//!
//! Connection pooling via deadpool-postgres; all three statements are
//! parameterized and conflict-tolerant. The entity upsert uses the
//! insert-or-return-id form (`ON CONFLICT ... DO UPDATE ... RETURNING id`)
//! so one round trip both absorbs the name conflict and resolves the durable
//! id, leaving no window between insert and lookup.

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use lattice_core::{EntityId, StoreError, StoreResult, Timestamp};
use tokio_postgres::NoTls;

use crate::{EntityStore, RelationshipStore};

/// Entity upsert: absorb the name conflict and return the id either way.
/// The no-op `DO UPDATE` is what makes `RETURNING` fire on conflict.
const UPSERT_ENTITY: &str = "INSERT INTO entities (name, kind, created_at) \
     VALUES ($1, $2, $3) \
     ON CONFLICT (name) DO UPDATE SET name = excluded.name \
     RETURNING id";

/// Entity id lookup by unique name.
const SELECT_ENTITY_ID: &str = "SELECT id FROM entities WHERE name = $1";

/// Relationship upsert: the ordered triple is unique, duplicates are no-ops.
const UPSERT_RELATIONSHIP: &str = "INSERT INTO relationships (source_id, target_id, name) \
     VALUES ($1, $2, $3) \
     ON CONFLICT (source_id, target_id, name) DO NOTHING";

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "lattice".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_size: 4,
        }
    }
}

impl PgConfig {
    /// Create a database configuration from environment variables.
    ///
    /// Environment variables:
    /// - `LATTICE_DB_HOST`: PostgreSQL host (default: localhost)
    /// - `LATTICE_DB_PORT`: PostgreSQL port (default: 5432)
    /// - `LATTICE_DB_NAME`: Database name (default: lattice)
    /// - `LATTICE_DB_USER`: Database user (default: postgres)
    /// - `LATTICE_DB_PASSWORD`: Database password (default: empty)
    /// - `LATTICE_DB_POOL_SIZE`: Maximum pool size (default: 4)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("LATTICE_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("LATTICE_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("LATTICE_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("LATTICE_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("LATTICE_DB_PASSWORD").unwrap_or(defaults.password),
            max_size: std::env::var("LATTICE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> StoreResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(self.max_size));

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Unavailable {
                reason: format!("failed to create pool: {}", e),
            })
    }
}

/// PostgreSQL-backed entity and relationship store.
///
/// Holds only the pool; all durable state lives in the database.
#[derive(Clone)]
pub struct PgGraphStore {
    pool: Pool,
}

impl PgGraphStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a store from configuration.
    pub fn from_config(config: &PgConfig) -> StoreResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Apply the DDL in `sql/schema.sql`. Idempotent; meant for operational
    /// bootstrap, not for the ingest path.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(include_str!("../sql/schema.sql"))
            .await
            .map_err(unavailable)
    }

    async fn get_conn(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| StoreError::Unavailable {
            reason: format!("failed to get connection: {}", e),
        })
    }
}

fn unavailable(e: tokio_postgres::Error) -> StoreError {
    StoreError::Unavailable {
        reason: e.to_string(),
    }
}

#[async_trait]
impl EntityStore for PgGraphStore {
    async fn upsert(
        &self,
        name: &str,
        kind: &str,
        created_at: Timestamp,
    ) -> StoreResult<EntityId> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(UPSERT_ENTITY, &[&name, &kind, &created_at])
            .await
            .map_err(unavailable)?;
        Ok(row.get(0))
    }

    async fn lookup_id(&self, name: &str) -> StoreResult<Option<EntityId>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(SELECT_ENTITY_ID, &[&name])
            .await
            .map_err(unavailable)?;
        Ok(row.map(|r| r.get(0)))
    }
}

#[async_trait]
impl RelationshipStore for PgGraphStore {
    async fn upsert(
        &self,
        source_id: EntityId,
        target_id: EntityId,
        name: &str,
    ) -> StoreResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(UPSERT_RELATIONSHIP, &[&source_id, &target_id, &name])
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The statements carry the whole idempotency contract; pin the conflict
    // clauses so a refactor can't silently drop them.

    #[test]
    fn test_entity_upsert_returns_id_on_conflict() {
        assert!(UPSERT_ENTITY.contains("ON CONFLICT (name) DO UPDATE"));
        assert!(UPSERT_ENTITY.contains("RETURNING id"));
    }

    #[test]
    fn test_relationship_upsert_absorbs_duplicates() {
        assert!(UPSERT_RELATIONSHIP.contains("ON CONFLICT (source_id, target_id, name) DO NOTHING"));
    }

    #[test]
    fn test_statements_are_parameterized() {
        for stmt in [UPSERT_ENTITY, SELECT_ENTITY_ID, UPSERT_RELATIONSHIP] {
            assert!(stmt.contains("$1"));
        }
    }

    #[test]
    fn test_config_from_env_defaults() {
        let config = PgConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "lattice");
        assert_eq!(config.max_size, 4);
    }
}
