//! The ingest loop state machine.
//!
//! POLLING -> DECODING -> PERSISTING -> POLLING, with STOPPED reachable from
//! POLLING only. Shutdown is checked once per polling iteration and never
//! mid-message: an in-flight record always completes (or fails) before the
//! loop exits. Single consumer, no reordering buffer, so records are
//! processed strictly in delivery order.
//!
//! Per-message failures never terminate the loop. They are logged and
//! counted; the write gap they leave is repaired by the next occurrence of
//! the same data, because every write is an idempotent upsert.

use std::sync::Arc;
use std::time::Duration;

use lattice_core::{LatticeResult, Shutdown};
use lattice_schema::{decoder, SchemaHandle};
use lattice_store::{EntityStore, RelationshipStore};

use crate::source::{Delivery, RecordSource};

/// Tunables for the ingest loop.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Bound on each stream pull.
    pub poll_timeout: Duration,
    /// Kind tag applied to every entity the loop materializes.
    pub entity_kind: String,
    /// Exit the loop on end-of-partition instead of continuing to poll.
    pub exit_on_eof: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            entity_kind: "entity".to_string(),
            exit_on_eof: false,
        }
    }
}

/// Single-partition consume loop.
pub struct IngestLoop<S: RecordSource> {
    source: S,
    schema: Arc<SchemaHandle>,
    entities: Arc<dyn EntityStore>,
    relationships: Arc<dyn RelationshipStore>,
    shutdown: Shutdown,
    options: IngestOptions,
    processed: u64,
    failures: u64,
}

impl<S: RecordSource> IngestLoop<S> {
    pub fn new(
        source: S,
        schema: Arc<SchemaHandle>,
        entities: Arc<dyn EntityStore>,
        relationships: Arc<dyn RelationshipStore>,
        shutdown: Shutdown,
        options: IngestOptions,
    ) -> Self {
        Self {
            source,
            schema,
            entities,
            relationships,
            shutdown,
            options,
            processed: 0,
            failures: 0,
        }
    }

    /// Messages persisted successfully.
    pub fn processed_count(&self) -> u64 {
        self.processed
    }

    /// Messages dropped (decode, delivery, or persistence failure).
    ///
    /// Observability only; no threshold triggers any action.
    pub fn failure_count(&self) -> u64 {
        self.failures
    }

    /// Run until shutdown is requested (or end-of-partition when
    /// `exit_on_eof` is set).
    pub async fn run(&mut self) {
        tracing::info!(
            schema = %self.schema.logical_name,
            poll_timeout_ms = self.options.poll_timeout.as_millis() as u64,
            "Ingest loop started"
        );

        loop {
            if self.shutdown.is_requested() {
                tracing::info!("Shutdown requested, stopping ingest loop");
                break;
            }

            match self.source.poll(self.options.poll_timeout).await {
                Delivery::Record(payload) => match self.process(&payload).await {
                    Ok(()) => self.processed += 1,
                    Err(e) => {
                        self.failures += 1;
                        tracing::warn!(
                            error = %e,
                            failures = self.failures,
                            "Message dropped"
                        );
                    }
                },
                Delivery::Timeout => {
                    tracing::trace!("Poll timed out with no record");
                }
                Delivery::EndOfPartition => {
                    if self.options.exit_on_eof {
                        tracing::info!("End of partition reached, stopping ingest loop");
                        break;
                    }
                    tracing::debug!("End of partition reached");
                    // An exhausted source reports end-of-partition without
                    // consuming the poll bound; wait it out here so the loop
                    // stays paced instead of spinning hot until new records
                    // (or shutdown) arrive.
                    self.shutdown.wait(self.options.poll_timeout).await;
                }
                Delivery::Failed(reason) => {
                    self.failures += 1;
                    tracing::warn!(
                        %reason,
                        failures = self.failures,
                        "Stream delivery failed"
                    );
                }
            }
        }

        tracing::info!(
            processed = self.processed,
            failures = self.failures,
            "Ingest loop stopped"
        );
    }

    /// Decode one payload and persist it: subject entity, object entity,
    /// then the relationship, each an idempotent upsert.
    ///
    /// The two persistence phases are deliberately not wrapped in one
    /// transaction; an entity without its relationship is an accepted,
    /// self-healing inconsistency.
    async fn process(&self, payload: &[u8]) -> LatticeResult<()> {
        let triple = decoder::decode(&self.schema, payload)?;
        let kind = self.options.entity_kind.as_str();

        let source_id = self
            .entities
            .upsert(&triple.subject, kind, triple.observed_at)
            .await?;
        let target_id = self
            .entities
            .upsert(&triple.object, kind, triple.observed_at)
            .await?;

        self.relationships
            .upsert(source_id, target_id, &triple.predicate)
            .await?;

        tracing::debug!(
            subject = %triple.subject,
            predicate = %triple.predicate,
            object = %triple.object,
            source_id,
            target_id,
            "Persisted triple"
        );
        Ok(())
    }
}
