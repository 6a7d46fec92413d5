//! Ingest service configuration.
//!
//! Loaded from environment variables with defaults, except the registry URL:
//! without it no schema can ever be resolved, so its absence is the
//! `NotInitialized` startup failure.

use std::path::PathBuf;
use std::time::Duration;

use lattice_core::SchemaError;

/// Configuration for the ingest daemon.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Base URL of the schema registry. Required.
    pub registry_url: String,
    /// Logical schema name; the registry subject is `<name>-value`.
    pub schema_name: String,
    /// Kind tag applied to every materialized entity.
    pub entity_kind: String,
    /// Bound on each stream pull.
    pub poll_timeout: Duration,
    /// Exit on end-of-partition instead of continuing to poll.
    pub exit_on_eof: bool,
    /// Replay frames from this file instead of stdin.
    pub replay_file: Option<PathBuf>,
    /// Apply `sql/schema.sql` on startup.
    pub apply_schema: bool,
}

impl IngestConfig {
    /// Create the configuration from environment variables.
    ///
    /// Environment variables:
    /// - `LATTICE_REGISTRY_URL`: Schema registry base URL (required)
    /// - `LATTICE_SCHEMA`: Logical schema name (default: "spo")
    /// - `LATTICE_ENTITY_KIND`: Entity kind tag (default: "entity")
    /// - `LATTICE_POLL_TIMEOUT_MS`: Poll bound in milliseconds (default: 1000)
    /// - `LATTICE_EXIT_ON_EOF`: "true" to exit at end-of-partition (default: false)
    /// - `LATTICE_REPLAY_FILE`: Frame file to replay instead of stdin (optional)
    /// - `LATTICE_APPLY_SCHEMA`: "true" to apply the DDL on startup (default: false)
    pub fn from_env() -> Result<Self, SchemaError> {
        let registry_url = std::env::var("LATTICE_REGISTRY_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .ok_or(SchemaError::NotInitialized)?;

        let schema_name =
            std::env::var("LATTICE_SCHEMA").unwrap_or_else(|_| "spo".to_string());

        let entity_kind =
            std::env::var("LATTICE_ENTITY_KIND").unwrap_or_else(|_| "entity".to_string());

        let poll_timeout_ms = std::env::var("LATTICE_POLL_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000u64);

        let exit_on_eof = std::env::var("LATTICE_EXIT_ON_EOF")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let replay_file = std::env::var("LATTICE_REPLAY_FILE")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let apply_schema = std::env::var("LATTICE_APPLY_SCHEMA")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            registry_url,
            schema_name,
            entity_kind,
            poll_timeout: Duration::from_millis(poll_timeout_ms),
            exit_on_eof,
            replay_file,
            apply_schema,
        })
    }
}
