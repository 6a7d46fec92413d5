//! Process-lifetime schema cache.
//!
//! A schema is fetched from the registry once per logical name and the
//! compiled handle is reused for every subsequent decode. Decode failures
//! never trigger a re-fetch; they are reported to the caller and the cached
//! handle stays authoritative.

use std::collections::HashMap;
use std::sync::Arc;

use apache_avro::Schema;
use lattice_core::SchemaError;
use tokio::sync::Mutex;

use crate::registry::SchemaFetch;

/// A resolved, reusable decode definition.
///
/// Immutable once resolved; handed out as `Arc` so decode calls borrow the
/// compiled schema without re-fetching or re-parsing.
#[derive(Debug)]
pub struct SchemaHandle {
    /// Logical name the handle was resolved under (without `-value`).
    pub logical_name: String,
    /// Registry-assigned schema id.
    pub registry_id: i32,
    /// Compiled Avro schema.
    pub schema: Schema,
}

/// Resolves logical schema names to compiled handles, caching indefinitely.
pub struct SchemaCache {
    fetcher: Arc<dyn SchemaFetch>,
    // The handle table is held across the registry fetch so that first
    // access is single-flight: exactly one fetch per name, even when
    // resolution races from more than one task.
    handles: Mutex<HashMap<String, Arc<SchemaHandle>>>,
}

impl SchemaCache {
    /// Create a cache backed by the given registry client.
    pub fn new(fetcher: Arc<dyn SchemaFetch>) -> Self {
        Self {
            fetcher,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a logical schema name to its compiled handle.
    ///
    /// The registry subject is `<logical_name>-value`. The first call per
    /// name performs the network round trip; every later call returns the
    /// cached handle.
    pub async fn resolve(&self, logical_name: &str) -> Result<Arc<SchemaHandle>, SchemaError> {
        let mut handles = self.handles.lock().await;

        if let Some(handle) = handles.get(logical_name) {
            return Ok(Arc::clone(handle));
        }

        let subject = format!("{}-value", logical_name);
        let raw = self.fetcher.fetch(&subject).await?;

        let schema = Schema::parse_str(&raw.definition).map_err(|e| SchemaError::Unavailable {
            reason: format!("registry returned unparsable schema for '{}': {}", subject, e),
        })?;

        tracing::info!(
            subject = %subject,
            id = raw.id,
            "Fetched and compiled schema"
        );

        let handle = Arc::new(SchemaHandle {
            logical_name: logical_name.to_string(),
            registry_id: raw.id,
            schema,
        });
        handles.insert(logical_name.to_string(), Arc::clone(&handle));
        Ok(handle)
    }
}
