//! LATTICE Schema - Registry Client, Schema Cache, and Record Decoder
//!
//! Resolves logical schema names against a Confluent-style schema registry,
//! caches the compiled handle for the process lifetime, and decodes
//! Confluent-framed Avro payloads into [`lattice_core::Triple`] records.

pub mod cache;
pub mod decoder;
pub mod registry;

pub use cache::{SchemaCache, SchemaHandle};
pub use decoder::{decode, WIRE_HEADER_LEN, WIRE_MAGIC};
pub use registry::{HttpRegistry, RegistrySchema, SchemaFetch};
