//! Fuzz test for the record decoder
//!
//! Feeds arbitrary byte sequences through `lattice_schema::decode` against
//! the canonical spo schema to find:
//! - Panics or crashes
//! - Infinite loops
//! - Memory safety issues
//!
//! Run with: cargo +nightly fuzz run decode_fuzz -- -max_total_time=60

#![no_main]

use apache_avro::Schema;
use lattice_schema::{decode, SchemaHandle};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

const SPO_SCHEMA: &str = r#"{
    "type": "record",
    "name": "spo",
    "fields": [
        {"name": "subject", "type": "string"},
        {"name": "predicate", "type": "string"},
        {"name": "object", "type": "string"}
    ]
}"#;

fn handle() -> &'static SchemaHandle {
    static HANDLE: OnceLock<SchemaHandle> = OnceLock::new();
    HANDLE.get_or_init(|| SchemaHandle {
        logical_name: "spo".to_string(),
        registry_id: 1,
        schema: Schema::parse_str(SPO_SCHEMA).unwrap(),
    })
}

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, only return an error. A successful decode
    // must have produced three non-dangling strings.
    if let Ok(triple) = decode(handle(), data) {
        let _ = triple.subject.len() + triple.predicate.len() + triple.object.len();
    }
});
