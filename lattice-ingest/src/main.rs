//! LATTICE Ingest Daemon Entry Point
//!
//! Bootstraps logging, configuration, the database pool, and the schema
//! cache, then runs the ingest loop until a termination signal arrives.
//! Frames are read from `LATTICE_REPLAY_FILE` when set, otherwise from
//! stdin.

use std::process::ExitCode;
use std::sync::Arc;

use lattice_core::Shutdown;
use lattice_ingest::{
    spawn_signal_listener, IngestConfig, IngestLoop, IngestOptions, ReplaySource,
};
use lattice_schema::{HttpRegistry, SchemaCache};
use lattice_store::{PgConfig, PgGraphStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal startup error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = IngestConfig::from_env()?;

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone())?;

    tracing::info!("Connecting to database");
    let store = Arc::new(PgGraphStore::from_config(&PgConfig::from_env())?);
    if config.apply_schema {
        store.ensure_schema().await?;
        tracing::info!("Applied database schema");
    }

    let registry = HttpRegistry::new(&config.registry_url)?;
    let cache = SchemaCache::new(Arc::new(registry));
    // Fatal when this fails: without the schema no message can ever decode.
    let schema = cache.resolve(&config.schema_name).await?;

    let source = match &config.replay_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Replaying frames from file");
            ReplaySource::spawn(tokio::fs::File::open(path).await?)
        }
        None => {
            tracing::info!("Reading frames from stdin");
            ReplaySource::spawn(tokio::io::stdin())
        }
    };

    let mut ingest = IngestLoop::new(
        source,
        schema,
        store.clone(),
        store,
        shutdown,
        IngestOptions {
            poll_timeout: config.poll_timeout,
            entity_kind: config.entity_kind.clone(),
            exit_on_eof: config.exit_on_eof,
        },
    );

    ingest.run().await;
    Ok(())
}
