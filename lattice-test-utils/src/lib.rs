//! LATTICE Test Utilities
//!
//! Centralized test infrastructure for the LATTICE workspace:
//! - The canonical `spo` schema and framed-payload encoding helpers
//! - A static in-memory registry implementing [`SchemaFetch`]
//! - Re-exported in-memory store for end-to-end assertions

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use apache_avro::types::Record;
use apache_avro::{to_avro_datum, Schema};
use async_trait::async_trait;
use lattice_core::SchemaError;
use lattice_schema::{RegistrySchema, SchemaFetch, SchemaHandle, WIRE_MAGIC};

// Re-export the mock store from its source crate
pub use lattice_store::MemoryGraphStore;

/// The canonical subject-predicate-object value schema.
pub const SPO_SCHEMA_JSON: &str = r#"{
    "type": "record",
    "name": "spo",
    "fields": [
        {"name": "subject", "type": "string"},
        {"name": "predicate", "type": "string"},
        {"name": "object", "type": "string"}
    ]
}"#;

/// Registry id used by the fixtures.
pub const SPO_SCHEMA_ID: i32 = 1;

/// Compiled `spo` handle, bypassing the registry.
pub fn spo_handle() -> Arc<SchemaHandle> {
    Arc::new(SchemaHandle {
        logical_name: "spo".to_string(),
        registry_id: SPO_SCHEMA_ID,
        schema: Schema::parse_str(SPO_SCHEMA_JSON).expect("spo schema is valid"),
    })
}

/// Encode a triple as a Confluent-framed Avro payload for the given handle.
pub fn encode_triple(
    handle: &SchemaHandle,
    subject: &str,
    predicate: &str,
    object: &str,
) -> Vec<u8> {
    let mut record = Record::new(&handle.schema).expect("schema is a record");
    record.put("subject", subject);
    record.put("predicate", predicate);
    record.put("object", object);
    let body = to_avro_datum(&handle.schema, record).expect("record matches schema");

    let mut framed = vec![WIRE_MAGIC];
    framed.extend_from_slice(&handle.registry_id.to_be_bytes());
    framed.extend(body);
    framed
}

/// Registry fake serving one fixed schema and counting fetches.
pub struct StaticRegistry {
    definition: String,
    id: i32,
    fetches: AtomicUsize,
}

impl StaticRegistry {
    /// Serve the canonical `spo` schema.
    pub fn spo() -> Arc<Self> {
        Arc::new(Self {
            definition: SPO_SCHEMA_JSON.to_string(),
            id: SPO_SCHEMA_ID,
            fetches: AtomicUsize::new(0),
        })
    }

    /// Serve an arbitrary definition.
    pub fn serving(definition: &str, id: i32) -> Arc<Self> {
        Arc::new(Self {
            definition: definition.to_string(),
            id,
            fetches: AtomicUsize::new(0),
        })
    }

    /// Number of fetches performed against this registry.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaFetch for StaticRegistry {
    async fn fetch(&self, subject: &str) -> Result<RegistrySchema, SchemaError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(RegistrySchema {
            subject: subject.to_string(),
            id: self.id,
            definition: self.definition.clone(),
        })
    }
}
