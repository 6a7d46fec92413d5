//! Schema registry client.
//!
//! [`SchemaFetch`] is the seam the rest of the pipeline depends on;
//! [`HttpRegistry`] implements it against a Confluent-compatible REST
//! registry. Value schemas are registered under the `<logical-name>-value`
//! subject, so callers pass the logical name and the client appends the
//! suffix.

use async_trait::async_trait;
use lattice_core::SchemaError;
use serde::Deserialize;

/// Raw schema record as returned by the registry, before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySchema {
    /// Subject the schema was fetched under (includes the `-value` suffix).
    pub subject: String,
    /// Registry-assigned schema id.
    pub id: i32,
    /// Avro schema definition as JSON text.
    pub definition: String,
}

/// Fetches schema definitions by subject.
#[async_trait]
pub trait SchemaFetch: Send + Sync {
    /// Fetch the latest version of a subject's schema.
    async fn fetch(&self, subject: &str) -> Result<RegistrySchema, SchemaError>;
}

/// Wire shape of `GET /subjects/<subject>/versions/latest`.
#[derive(Debug, Deserialize)]
struct VersionResponse {
    id: i32,
    schema: String,
}

/// Wire shape of `POST /subjects/<subject>/versions`.
#[derive(Debug, Deserialize)]
struct RegisterResponse {
    id: i32,
}

/// HTTP client for a Confluent-compatible schema registry.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRegistry {
    /// Create a client for the registry at `base_url`.
    ///
    /// Fails with [`SchemaError::NotInitialized`] when the URL is empty,
    /// which is the startup-time guard against resolving schemas before the
    /// registry has been configured.
    pub fn new(base_url: &str) -> Result<Self, SchemaError> {
        if base_url.is_empty() {
            return Err(SchemaError::NotInitialized);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Register a schema definition under a value subject.
    ///
    /// Operational helper for seeding the subject; the ingest path itself
    /// only ever fetches. Returns the registry-assigned id.
    pub async fn register_value_schema(
        &self,
        logical_name: &str,
        definition: &str,
    ) -> Result<i32, SchemaError> {
        let subject = format!("{}-value", logical_name);
        let url = format!("{}/subjects/{}/versions", self.base_url, subject);
        let body = serde_json::json!({ "schema": definition });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SchemaError::Unavailable {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SchemaError::Unavailable {
                reason: format!("registration for '{}' returned {}", subject, response.status()),
            });
        }

        let registered: RegisterResponse =
            response.json().await.map_err(|e| SchemaError::Unavailable {
                reason: e.to_string(),
            })?;

        tracing::info!(subject = %subject, id = registered.id, "Registered schema");
        Ok(registered.id)
    }
}

#[async_trait]
impl SchemaFetch for HttpRegistry {
    async fn fetch(&self, subject: &str) -> Result<RegistrySchema, SchemaError> {
        let url = format!("{}/subjects/{}/versions/latest", self.base_url, subject);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| SchemaError::Unavailable {
                    reason: e.to_string(),
                })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SchemaError::NotFound {
                subject: subject.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(SchemaError::Unavailable {
                reason: format!("registry returned {}", response.status()),
            });
        }

        let version: VersionResponse =
            response.json().await.map_err(|e| SchemaError::Unavailable {
                reason: e.to_string(),
            })?;

        Ok(RegistrySchema {
            subject: subject.to_string(),
            id: version.id,
            definition: version.schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_url_is_not_initialized() {
        assert_eq!(HttpRegistry::new("").unwrap_err(), SchemaError::NotInitialized);
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let registry = HttpRegistry::new("http://localhost:8081/").unwrap();
        assert_eq!(registry.base_url, "http://localhost:8081");
    }
}
